// ABOUTME: `casebook requirements` subcommands
// ABOUTME: Read-only views of requirements and their review history

use clap::Subcommand;
use colored::*;
use sqlx::SqlitePool;

use casebook_core::truncate;
use casebook_requirements::{RequirementFilter, RequirementStatus, ReviewStore, RequirementStorage};

use super::utils::{format_date, new_table};

#[derive(Subcommand)]
pub enum RequirementsCommands {
    /// List live requirements in a project, newest first
    List {
        project_id: String,
        /// Only show requirements in this status, e.g. PENDING_REVIEW
        #[arg(long)]
        status: Option<String>,
    },
    /// Show the review history of a requirement, oldest first
    History { id: String },
}

pub async fn handle_requirements_command(
    command: RequirementsCommands,
    pool: SqlitePool,
) -> anyhow::Result<()> {
    let storage = RequirementStorage::new(pool);
    match command {
        RequirementsCommands::List { project_id, status } => {
            list_requirements(&storage, &project_id, status.as_deref()).await
        }
        RequirementsCommands::History { id } => show_history(&storage, &id).await,
    }
}

fn parse_status(raw: &str) -> anyhow::Result<RequirementStatus> {
    let wanted = raw.trim().to_uppercase().replace('-', "_");
    [
        RequirementStatus::Draft,
        RequirementStatus::PendingReview,
        RequirementStatus::Approved,
        RequirementStatus::InProgress,
        RequirementStatus::Completed,
    ]
    .into_iter()
    .find(|s| s.as_str() == wanted)
    .ok_or_else(|| anyhow::anyhow!("unknown status: {}", raw))
}

async fn list_requirements(
    storage: &RequirementStorage,
    project_id: &str,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let filter = RequirementFilter {
        status: status.map(parse_status).transpose()?,
        ..Default::default()
    };
    let (requirements, total) = storage.list_requirements(project_id, &filter).await?;

    if requirements.is_empty() {
        println!("{}", "No requirements found".yellow());
        return Ok(());
    }

    let mut table = new_table(vec!["ID", "Title", "Status", "Acceptance", "Priority", "Updated"]);
    for requirement in &requirements {
        table.add_row(vec![
            requirement.id.clone(),
            truncate(&requirement.title, 40),
            requirement.status.to_string(),
            requirement.acceptance_status.to_string(),
            format!("{:?}", requirement.priority),
            format_date(&requirement.updated_at),
        ]);
    }

    println!("{}", table);
    println!("Total: {} requirements", total.to_string().cyan());
    Ok(())
}

async fn show_history(storage: &RequirementStorage, id: &str) -> anyhow::Result<()> {
    let actions = storage.list_review_actions(id).await?;

    if actions.is_empty() {
        println!("{}", format!("No review history for {}", id).yellow());
        return Ok(());
    }

    println!("{}", format!("Review history - {}", id).blue().bold());
    let mut table = new_table(vec!["When", "Action", "By", "From", "To", "Comment"]);
    for action in &actions {
        table.add_row(vec![
            format_date(&action.created_at),
            action.action.to_string(),
            action.reviewer_id.clone(),
            action.from_status.to_string(),
            action.to_status.to_string(),
            action.comment.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{}", table);
    Ok(())
}
