//! Record Store - flat-file persistence for students, roadmaps, progress and feedback
//!
//! Every entity is one pretty-printed JSON file named `<kind>_<id>.json` in a
//! single directory (default `data/storage`). Lookups by owner scan the whole
//! directory, which is fine at classroom scale and nothing more.
//!
//! Writes go straight to the target file: a crash mid-write can leave a
//! truncated record, which later reads report as `CorruptRecord`. There is no
//! locking either; two writers of the same id race and the last one wins,
//! writers of different ids never interfere.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Feedback, Progress, Record, Roadmap};

/// Default storage directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "data/storage";

const RECORD_EXT: &str = "json";

/// Flat directory of JSON records
#[derive(Debug, Clone)]
pub struct RecordStore {
    base_dir: PathBuf,
}

impl RecordStore {
    /// Create a store rooted at `base_dir`. The directory is created on first save.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create a store at the configured data directory
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.storage.data_dir.clone())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path<R: Record>(&self, id: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}_{}.{}", R::KIND, id, RECORD_EXT))
    }

    /// Persist a record, assigning a UUID if it has none. Returns the id.
    ///
    /// Roadmap and progress records get `updated_at` refreshed here, whatever
    /// the caller put there. `version` is never touched; see [`Self::save_revision`].
    pub fn save<R: Record>(&self, record: &mut R) -> Result<String> {
        let id = match record.id() {
            Some(id) => {
                validate_id(id)?;
                id.to_string()
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                record.set_id(id.clone());
                id
            }
        };

        record.touch(Utc::now());

        std::fs::create_dir_all(&self.base_dir).map_err(|e| Error::io(&self.base_dir, e))?;

        let path = self.record_path::<R>(&id);
        let contents = serde_json::to_string_pretty(record).map_err(|e| Error::CorruptRecord {
            kind: R::KIND,
            id: id.clone(),
            reason: format!("failed to serialize: {}", e),
        })?;
        std::fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;

        debug!("Saved {} record {}", R::KIND, id);
        Ok(id)
    }

    /// Increment a roadmap's version and save it.
    ///
    /// This is the only place the version counter moves.
    pub fn save_revision(&self, roadmap: &mut Roadmap) -> Result<String> {
        roadmap.version = roadmap.next_version().ok_or_else(|| Error::VersionLimit {
            id: roadmap.id.clone().unwrap_or_default(),
            version: roadmap.version,
        })?;
        let id = self.save(roadmap)?;
        info!("Roadmap {} revised to version {}", id, roadmap.version);
        Ok(id)
    }

    /// Load one record by id
    pub fn get<R: Record>(&self, id: &str) -> Result<R> {
        let not_found = || Error::NotFound {
            kind: R::KIND,
            id: id.to_string(),
        };
        if validate_id(id).is_err() {
            return Err(not_found());
        }

        let path = self.record_path::<R>(id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(Error::io(&path, e)),
        };
        parse_record(id, &contents)
    }

    /// Every record of one kind, in directory order
    pub fn list_all<R: Record>(&self) -> Result<Vec<R>> {
        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.base_dir, e)),
        };

        let prefix = format!("{}_", R::KIND);
        let suffix = format!(".{}", RECORD_EXT);
        let mut records = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.base_dir, e))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(id) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
            else {
                continue;
            };

            let path = entry.path();
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            records.push(parse_record(id, &contents)?);
        }

        Ok(records)
    }

    /// Records of one kind belonging to a student, unordered
    pub fn list_by_owner<R: Record>(&self, student_id: &str) -> Result<Vec<R>> {
        Ok(self
            .list_all::<R>()?
            .into_iter()
            .filter(|r| r.owner_id() == Some(student_id))
            .collect())
    }

    /// The student's record with the greatest `updated_at`
    pub fn latest_by_owner<R: Record>(&self, student_id: &str) -> Result<Option<R>> {
        Ok(self
            .list_by_owner::<R>(student_id)?
            .into_iter()
            .max_by_key(|r| r.updated_at()))
    }

    /// Current roadmap for a student, `None` if they have none yet
    pub fn latest_roadmap(&self, student_id: &str) -> Result<Option<Roadmap>> {
        self.latest_by_owner::<Roadmap>(student_id)
    }

    /// Most recent progress submission, optionally restricted to one roadmap
    pub fn latest_progress(
        &self,
        student_id: &str,
        roadmap_id: Option<&str>,
    ) -> Result<Option<Progress>> {
        Ok(self
            .list_by_owner::<Progress>(student_id)?
            .into_iter()
            .filter(|p| roadmap_id.map_or(true, |r| p.roadmap_id == r))
            .max_by_key(|p| p.updated_at))
    }

    /// All feedback on a roadmap, oldest first
    pub fn feedback_for_roadmap(&self, roadmap_id: &str) -> Result<Vec<Feedback>> {
        let mut feedback: Vec<Feedback> = self
            .list_all::<Feedback>()?
            .into_iter()
            .filter(|f| f.roadmap_id == roadmap_id)
            .collect();
        feedback.sort_by_key(|f| f.created_at);
        Ok(feedback)
    }
}

fn parse_record<R: Record>(id: &str, contents: &str) -> Result<R> {
    serde_json::from_str(contents).map_err(|e| Error::CorruptRecord {
        kind: R::KIND,
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Ids become part of a filename, so path separators are refused
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || id.contains("..") {
        return Err(Error::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Student;
    use crate::types::SourceType;
    use chrono::Duration;
    use tempfile::TempDir;

    fn store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("storage"));
        (dir, store)
    }

    #[test]
    fn test_save_assigns_id_and_creates_dir_lazily() {
        let (_dir, store) = store();
        assert!(!store.base_dir().exists());

        let mut student = Student::new("Aditya Sharma", "Class 11", vec!["Math".into()]);
        let id = store.save(&mut student).unwrap();

        assert_eq!(student.id.as_deref(), Some(id.as_str()));
        assert!(store.base_dir().join(format!("student_{}.json", id)).exists());
    }

    #[test]
    fn test_save_then_get_round_trip_refreshes_updated_at() {
        let (_dir, store) = store();
        let mut roadmap = Roadmap::new("s1", "# Plan");
        let stale = roadmap.updated_at - Duration::days(3);
        roadmap.updated_at = stale;

        let id = store.save(&mut roadmap).unwrap();
        let loaded: Roadmap = store.get(&id).unwrap();

        assert_eq!(loaded, roadmap);
        assert!(loaded.updated_at > stale);
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn test_resave_overwrites_same_file() {
        let (_dir, store) = store();
        let mut roadmap = Roadmap::new("s1", "first");
        let id = store.save(&mut roadmap).unwrap();
        roadmap.content = "second".into();
        let again = store.save(&mut roadmap).unwrap();

        assert_eq!(id, again);
        let loaded: Roadmap = store.get(&id).unwrap();
        assert_eq!(loaded.content, "second");
        assert_eq!(store.list_all::<Roadmap>().unwrap().len(), 1);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get::<Feedback>("nope").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        let err = store.get::<Feedback>("../escape").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_truncated_record_is_corrupt_not_panic() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.base_dir()).unwrap();
        std::fs::write(store.base_dir().join("roadmap_broken.json"), "{\"id\": \"bro").unwrap();

        let err = store.get::<Roadmap>("broken").unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { ref id, .. } if id == "broken"));

        let err = store.list_by_owner::<Roadmap>("s1").unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { .. }));
    }

    #[test]
    fn test_list_by_owner_filters_kind_and_student() {
        let (_dir, store) = store();
        store.save(&mut Roadmap::new("s1", "a")).unwrap();
        store.save(&mut Roadmap::new("s1", "b")).unwrap();
        store.save(&mut Roadmap::new("s2", "c")).unwrap();
        store.save(&mut Progress::new("s1", "r1")).unwrap();

        assert_eq!(store.list_by_owner::<Roadmap>("s1").unwrap().len(), 2);
        assert_eq!(store.list_by_owner::<Progress>("s1").unwrap().len(), 1);
        assert!(store.list_by_owner::<Progress>("s2").unwrap().is_empty());
    }

    #[test]
    fn test_latest_progress_is_none_without_data() {
        let (_dir, store) = store();
        assert!(store.latest_progress("s1", None).unwrap().is_none());
        assert!(store.latest_roadmap("s1").unwrap().is_none());
    }

    #[test]
    fn test_latest_progress_respects_roadmap_filter() {
        let (_dir, store) = store();
        let mut older = Progress::new("s1", "r1");
        store.save(&mut older).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let mut newer = Progress::new("s1", "r2");
        store.save(&mut newer).unwrap();

        let latest = store.latest_progress("s1", None).unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
        let on_r1 = store.latest_progress("s1", Some("r1")).unwrap().unwrap();
        assert_eq!(on_r1.id, older.id);
    }

    #[test]
    fn test_save_revision_is_the_only_version_bump() {
        let (_dir, store) = store();
        let mut roadmap = Roadmap::new("s1", "plan");
        store.save(&mut roadmap).unwrap();
        store.save(&mut roadmap).unwrap();
        assert_eq!(roadmap.version, 1);

        let id = store.save_revision(&mut roadmap).unwrap();
        let loaded: Roadmap = store.get(&id).unwrap();
        assert_eq!(loaded.version, 2);
    }

    #[test]
    fn test_save_revision_refuses_past_last_version() {
        let (_dir, store) = store();
        let mut roadmap = Roadmap::new("s1", "plan");
        roadmap.version = u32::MAX;
        let id = store.save(&mut roadmap).unwrap();

        let err = store.save_revision(&mut roadmap).unwrap_err();
        assert!(matches!(err, Error::VersionLimit { version: u32::MAX, .. }), "got {err}");
        assert_eq!(roadmap.version, u32::MAX);
        let loaded: Roadmap = store.get(&id).unwrap();
        assert_eq!(loaded.version, u32::MAX);
    }

    #[test]
    fn test_feedback_for_roadmap_sorted_oldest_first() {
        let (_dir, store) = store();
        let mut late = Feedback::new("s1", "r1", SourceType::Parent, "p1", "later");
        let mut early = Feedback::new("s1", "r1", SourceType::Teacher, "t1", "earlier");
        early.created_at = late.created_at - Duration::minutes(10);
        let mut other = Feedback::new("s1", "r2", SourceType::Teacher, "t1", "elsewhere");
        store.save(&mut late).unwrap();
        store.save(&mut early).unwrap();
        store.save(&mut other).unwrap();

        let items = store.feedback_for_roadmap("r1").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, "earlier");
        assert_eq!(items[1].content, "later");
    }

    #[test]
    fn test_caller_supplied_id_with_separator_is_rejected() {
        let (_dir, store) = store();
        let mut student = Student::new("x", "", vec![]);
        student.id = Some("a/b".into());
        assert!(matches!(store.save(&mut student), Err(Error::InvalidId(_))));
    }
}
