//! CLI interface for roadmap-agent

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::lifecycle::{Coordinator, UpdateSource};
use crate::models::{AssessmentResult, Progress, Roadmap, Student};
use crate::types::SourceType;

#[derive(Parser)]
#[command(name = "roadmap-agent")]
#[command(about = "Personalized study roadmaps with teacher, parent and student feedback", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the record directory from the config file
    #[arg(long, global = true, env = "ROADMAP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure generation settings and credentials
    Config {
        /// Store the Groq API key in the OS keyring
        #[arg(long)]
        set_api_key: Option<String>,
        /// Remove the stored API key
        #[arg(long)]
        delete_api_key: bool,
        /// Set the generation model
        #[arg(long)]
        set_model: Option<String>,
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
    /// Manage student profiles
    Student {
        #[command(subcommand)]
        command: StudentCommands,
    },
    /// Generate, inspect and revise roadmaps
    Roadmap {
        #[command(subcommand)]
        command: RoadmapCommands,
    },
    /// Report and review study progress
    Progress {
        #[command(subcommand)]
        command: ProgressCommands,
    },
    /// Submit and list stakeholder feedback
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommands,
    },
    /// Balance the latest teacher and parent feedback with student input
    Reconcile {
        /// Roadmap ID
        roadmap_id: String,
        /// What the student reports
        #[arg(short, long, default_value = "")]
        input: String,
        /// Append the result to the roadmap as a new version
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Subcommand)]
enum StudentCommands {
    /// Register a new student
    Add(StudentArgs),
    /// Show a stored profile
    Show {
        /// Student ID
        id: String,
    },
    /// Register the demo JEE student
    Sample,
}

#[derive(Args)]
struct StudentArgs {
    /// Full name
    #[arg(short, long)]
    name: String,
    /// Grade or class, e.g. "Class 11"
    #[arg(short, long, default_value = "")]
    grade: String,
    /// Comma-separated subjects
    #[arg(short, long, value_delimiter = ',')]
    subjects: Vec<String>,
    /// Free-text goals, e.g. "JEE prep"
    #[arg(long)]
    goals: Option<String>,
    /// Comma-separated strengths
    #[arg(long, value_delimiter = ',')]
    strengths: Vec<String>,
    /// Comma-separated weaknesses
    #[arg(long, value_delimiter = ',')]
    weaknesses: Vec<String>,
}

#[derive(Subcommand)]
enum RoadmapCommands {
    /// Generate a new roadmap for a stored student
    Generate {
        /// Student ID
        student_id: String,
    },
    /// Show the current roadmap of a student
    Show {
        /// Student ID
        student_id: String,
    },
    /// Approve a roadmap
    Approve {
        /// Roadmap ID
        roadmap_id: String,
        /// Who approves it
        #[arg(short, long)]
        by: String,
    },
    /// Append recommendations and bump the version
    Update {
        /// Roadmap ID
        roadmap_id: String,
        /// Update text
        text: String,
    },
    /// Show version, approval and review state
    Status {
        /// Roadmap ID
        roadmap_id: String,
    },
}

#[derive(Subcommand)]
enum ProgressCommands {
    /// Submit a progress report and print its analysis
    Submit {
        /// Roadmap ID
        roadmap_id: String,
        /// Completed task (repeatable)
        #[arg(long = "done")]
        done: Vec<String>,
        /// Time spent as subject=minutes (repeatable)
        #[arg(long = "time")]
        time: Vec<String>,
        /// Assessment as name=score/max (repeatable)
        #[arg(long = "score")]
        scores: Vec<String>,
        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
        /// Submit the demo progress report instead
        #[arg(long)]
        sample: bool,
        /// Append the analysis to the roadmap as a new version
        #[arg(long)]
        apply: bool,
    },
    /// Show the latest progress of a student
    Show {
        /// Student ID
        student_id: String,
    },
}

#[derive(Subcommand)]
enum FeedbackCommands {
    /// Submit feedback on a roadmap
    Submit {
        /// Roadmap ID
        roadmap_id: String,
        /// teacher, parent or student
        #[arg(short, long)]
        source: SourceType,
        /// ID of the person giving feedback
        #[arg(long, default_value = "anonymous")]
        source_id: String,
        /// Feedback text
        content: String,
    },
    /// List feedback on a roadmap, oldest first
    List {
        /// Roadmap ID
        roadmap_id: String,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { set_api_key, delete_api_key, set_model, show, reset } => {
            if let Some(key) = set_api_key {
                crate::config::set_api_key(&key)?;
            } else if delete_api_key {
                crate::security::keyring::delete_api_key()?;
                println!("API key removed.");
            } else if let Some(model) = set_model {
                crate::config::set_model(&model)?;
            } else if reset {
                crate::config::reset_config()?;
            } else if show {
                crate::config::show_config()?;
            } else {
                println!("Configuration options:");
                println!("  --set-api-key <key>   Store your Groq API key");
                println!("  --delete-api-key      Remove the stored API key");
                println!("  --set-model <model>   Set the generation model");
                println!("  --show                Display current configuration");
                println!("  --reset               Reset configuration to defaults");
                println!();
                let names: Vec<&str> = crate::agent::llm::ModelChoice::all().iter().map(|m| m.id()).collect();
                println!("Available models: {}", names.join(", "));
                println!("Without an API key, roadmaps are generated from templates.");
            }
        }
        Commands::Student { command } => {
            student_command(&open(cli.data_dir)?, command)?;
        }
        Commands::Roadmap { command } => {
            roadmap_command(&open(cli.data_dir)?, command).await?;
        }
        Commands::Progress { command } => {
            progress_command(&open(cli.data_dir)?, command).await?;
        }
        Commands::Feedback { command } => {
            feedback_command(&open(cli.data_dir)?, command).await?;
        }
        Commands::Reconcile { roadmap_id, input, apply } => {
            let coordinator = open(cli.data_dir)?;
            let reconciliation = coordinator.reconcile(&roadmap_id, &input).await?;
            println!("{}", reconciliation.content);
            if apply {
                let updated = coordinator.apply_update(
                    &roadmap_id,
                    UpdateSource::Reconciliation,
                    &reconciliation.content,
                )?;
                println!("Roadmap {} is now at version {}.", roadmap_id, updated.version);
            }
        }
    }

    Ok(())
}

/// Load configuration and build the coordinator
fn open(data_dir: Option<PathBuf>) -> Result<Coordinator> {
    let mut config = Config::load()?;
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    Coordinator::from_config(&config).context("Failed to set up generation backend")
}

fn student_command(coordinator: &Coordinator, command: StudentCommands) -> Result<()> {
    match command {
        StudentCommands::Add(args) => {
            let mut student = Student::new(args.name, args.grade, trimmed(args.subjects))
                .with_strengths(trimmed(args.strengths))
                .with_weaknesses(trimmed(args.weaknesses));
            if let Some(goals) = args.goals {
                student = student.with_goals(goals);
            }
            let id = coordinator.register_student(&mut student)?;
            println!("Registered {} ({})", student.display_name(), id);
        }
        StudentCommands::Show { id } => {
            let student: Student = coordinator.store().get(&id)?;
            println!("{}", serde_json::to_string_pretty(&student)?);
        }
        StudentCommands::Sample => {
            let mut student = crate::sample::sample_student();
            let id = coordinator.register_student(&mut student)?;
            println!("Registered sample student {} ({})", student.display_name(), id);
        }
    }
    Ok(())
}

async fn roadmap_command(coordinator: &Coordinator, command: RoadmapCommands) -> Result<()> {
    match command {
        RoadmapCommands::Generate { student_id } => {
            let roadmap = coordinator.regenerate(&student_id).await?;
            print_roadmap(&roadmap);
        }
        RoadmapCommands::Show { student_id } => match coordinator.current_roadmap(&student_id)? {
            Some(roadmap) => print_roadmap(&roadmap),
            None => println!("No roadmap yet for student {}.", student_id),
        },
        RoadmapCommands::Approve { roadmap_id, by } => {
            let roadmap = coordinator.approve(&roadmap_id, &by)?;
            println!("Roadmap {} (version {}) approved by {}.", roadmap_id, roadmap.version, by);
        }
        RoadmapCommands::Update { roadmap_id, text } => {
            let roadmap = coordinator.apply_update(&roadmap_id, UpdateSource::Manual, &text)?;
            println!("Roadmap {} is now at version {}.", roadmap_id, roadmap.version);
        }
        RoadmapCommands::Status { roadmap_id } => {
            let roadmap: Roadmap = coordinator.store().get(&roadmap_id)?;
            let state = coordinator.state(&roadmap_id)?;
            println!("Roadmap:  {}", roadmap_id);
            println!("Student:  {}", roadmap.student_id);
            println!("Version:  {}", roadmap.version);
            println!("State:    {}", state);
            println!("Approved: {}", roadmap.approved_by.as_deref().unwrap_or("no"));
            println!("Updated:  {}", roadmap.updated_at.format("%Y-%m-%d %H:%M UTC"));
        }
    }
    Ok(())
}

async fn progress_command(coordinator: &Coordinator, command: ProgressCommands) -> Result<()> {
    match command {
        ProgressCommands::Submit { roadmap_id, done, time, scores, notes, sample, apply } => {
            let roadmap: Roadmap = coordinator.store().get(&roadmap_id)?;
            let progress = if sample {
                crate::sample::sample_progress(&roadmap.student_id, &roadmap_id)
            } else {
                build_progress(&roadmap, done, time, scores, notes)?
            };
            let report = coordinator.submit_progress(progress).await?;
            println!("{}", report.analysis);
            if apply {
                let updated =
                    coordinator.apply_update(&roadmap_id, UpdateSource::Progress, &report.analysis)?;
                println!("Roadmap {} is now at version {}.", roadmap_id, updated.version);
            }
        }
        ProgressCommands::Show { student_id } => match coordinator.current_progress(&student_id)? {
            Some(progress) => println!("{}", serde_json::to_string_pretty(&progress)?),
            None => println!("No progress reported yet for student {}.", student_id),
        },
    }
    Ok(())
}

async fn feedback_command(coordinator: &Coordinator, command: FeedbackCommands) -> Result<()> {
    match command {
        FeedbackCommands::Submit { roadmap_id, source, source_id, content } => {
            let feedback = coordinator
                .submit_feedback(&roadmap_id, source, &source_id, &content)
                .await?;
            println!("{} feedback recorded ({})", source, feedback.id.as_deref().unwrap_or("-"));
            println!();
            println!("{}", feedback.response.as_deref().unwrap_or_default());
        }
        FeedbackCommands::List { roadmap_id } => {
            let items = coordinator.feedback(&roadmap_id)?;
            if items.is_empty() {
                println!("No feedback on roadmap {}.", roadmap_id);
            }
            for item in items {
                println!(
                    "[{}] {} ({}): {}",
                    item.created_at.format("%Y-%m-%d %H:%M"),
                    item.source_type,
                    item.source_id,
                    item.content
                );
            }
        }
    }
    Ok(())
}

fn print_roadmap(roadmap: &Roadmap) {
    println!(
        "Roadmap {} (version {})",
        roadmap.id.as_deref().unwrap_or("-"),
        roadmap.version
    );
    println!();
    println!("{}", roadmap.content);
}

fn trimmed(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn build_progress(
    roadmap: &Roadmap,
    done: Vec<String>,
    time: Vec<String>,
    scores: Vec<String>,
    notes: Option<String>,
) -> Result<Progress> {
    let roadmap_id = roadmap.id.clone().context("Roadmap has no ID")?;
    let mut progress = Progress::new(roadmap.student_id.clone(), roadmap_id);

    for task in trimmed(done) {
        progress.completed_tasks.insert(task, true);
    }
    for entry in time {
        let (subject, minutes) = split_pair(&entry)?;
        let minutes: u32 = minutes
            .parse()
            .with_context(|| format!("Invalid minutes in '{}'", entry))?;
        progress.time_spent.insert(subject.to_string(), minutes);
    }
    for entry in scores {
        progress.assessment_results.push(parse_score(&entry)?);
    }
    progress.notes = notes;
    Ok(progress)
}

fn split_pair(entry: &str) -> Result<(&str, &str)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => bail!("Expected key=value, got '{}'", entry),
    }
}

/// `name=score` or `name=score/max`
fn parse_score(entry: &str) -> Result<AssessmentResult> {
    let (name, value) = split_pair(entry)?;
    let (score, max) = match value.split_once('/') {
        Some((score, max)) => (score.trim(), max.trim()),
        None => (value, "100"),
    };
    let score: f64 = score.parse().with_context(|| format!("Invalid score in '{}'", entry))?;
    let max: f64 = max.parse().with_context(|| format!("Invalid maximum in '{}'", entry))?;
    Ok(AssessmentResult::new(name, score, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_score_forms() {
        let quiz = parse_score("Calculus Quiz=17/20").unwrap();
        assert_eq!(quiz.name, "Calculus Quiz");
        assert_eq!(quiz.percentage(), Some(85.0));

        let mock = parse_score("Mock=72").unwrap();
        assert_eq!(mock.max_score, Some(100.0));

        assert!(parse_score("no-equals").is_err());
        assert!(parse_score("x=abc").is_err());
    }

    #[test]
    fn test_feedback_source_parses_case_insensitively() {
        let cli = Cli::try_parse_from([
            "roadmap-agent", "feedback", "submit", "r1", "--source", "Teacher", "more mechanics",
        ])
        .unwrap();
        match cli.command {
            Commands::Feedback { command: FeedbackCommands::Submit { source, content, .. } } => {
                assert_eq!(source, SourceType::Teacher);
                assert_eq!(content, "more mechanics");
            }
            _ => panic!("wrong command"),
        }
    }
}
