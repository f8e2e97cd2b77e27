//! Roadmap Agent - personalized study roadmaps with stakeholder feedback
//!
//! A small educational planning library with:
//! - A flat-file JSON record store for students, roadmaps, progress and feedback
//! - Roadmap generation from templates or a hosted LLM (Groq by default)
//! - A lifecycle coordinator for feedback, reconciliation and versioned revisions
//!
//! # Example
//!
//! ```ignore
//! use roadmap_agent::{Backends, Coordinator, RecordStore};
//!
//! #[tokio::main]
//! async fn main() -> roadmap_agent::Result<()> {
//!     let coordinator = Coordinator::new(RecordStore::new("data/storage"), Backends::templates());
//!     let mut student = roadmap_agent::sample::sample_student();
//!     let roadmap = coordinator.generate(&mut student).await?;
//!     println!("{}", roadmap.content);
//!     Ok(())
//! }
//! ```

// Core modules (order matters for cross-module dependencies)
pub mod types;
pub mod error;
pub mod models;
pub mod store;
pub mod agent;
pub mod lifecycle;
pub mod config;
pub mod security;
pub mod sample;
pub mod cli;

// Re-export commonly used types for convenience
pub use agent::{
    Backends,
    GenerationBackend,
    GenerationError,
    GenerationRequest,
    GenerationTask,
    llm::RemoteBackend,
    template::TemplateBackend,
};

pub use config::Config;
pub use error::{Error, Result};
pub use lifecycle::{Coordinator, ProgressReport, Reconciliation, RoadmapState, UpdateSource};
pub use models::{AssessmentResult, Feedback, Progress, Roadmap, Student};
pub use store::RecordStore;
pub use types::{EntityKind, SourceType};
