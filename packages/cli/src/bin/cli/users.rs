// ABOUTME: `casebook users` subcommands
// ABOUTME: Register users and list them by role straight against the database

use std::str::FromStr;

use anyhow::Context;
use clap::Subcommand;
use colored::*;
use sqlx::SqlitePool;

use casebook_users::{UserCreateInput, UserRole, UserStorage};

use super::utils::{format_date, new_table};

#[derive(Subcommand)]
pub enum UsersCommands {
    /// Register a user
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        /// ADMIN, PM, QA_LEAD, TESTER, DEVELOPER or VIEWER
        #[arg(short, long, default_value = "TESTER")]
        role: String,
    },
    /// List users, optionally only those holding the given roles
    List {
        /// Comma-separated roles
        #[arg(long)]
        roles: Option<String>,
    },
    /// Change a user's role
    SetRole {
        id: String,
        role: String,
    },
}

pub async fn handle_users_command(command: UsersCommands, pool: SqlitePool) -> anyhow::Result<()> {
    let storage = UserStorage::new(pool);
    match command {
        UsersCommands::Add { name, email, role } => add_user(&storage, name, email, &role).await,
        UsersCommands::List { roles } => list_users(&storage, roles.as_deref()).await,
        UsersCommands::SetRole { id, role } => set_role(&storage, &id, &role).await,
    }
}

async fn add_user(storage: &UserStorage, name: String, email: String, role: &str) -> anyhow::Result<()> {
    let role = UserRole::from_str(role)?;
    let user = storage
        .create_user(UserCreateInput { name, email, role })
        .await
        .context("failed to create user")?;

    println!("{} {} ({})", "Created user".green().bold(), user.name, user.id.cyan());
    Ok(())
}

async fn list_users(storage: &UserStorage, roles: Option<&str>) -> anyhow::Result<()> {
    let users = match roles {
        Some(raw) => {
            let roles = raw
                .split(',')
                .map(UserRole::from_str)
                .collect::<Result<Vec<_>, _>>()?;
            storage.list_users_by_roles(&roles).await?
        }
        None => storage.list_users().await?,
    };

    if users.is_empty() {
        println!("{}", "No users found".yellow());
        println!("{}", "Use 'casebook users add' to register one".dimmed());
        return Ok(());
    }

    let mut table = new_table(vec!["ID", "Name", "Email", "Role", "Created"]);
    for user in &users {
        table.add_row(vec![
            user.id.clone(),
            user.name.clone(),
            user.email.clone(),
            user.role.to_string(),
            format_date(&user.created_at),
        ]);
    }

    println!("{}", table);
    println!("Total: {} users", users.len().to_string().cyan());
    Ok(())
}

async fn set_role(storage: &UserStorage, id: &str, role: &str) -> anyhow::Result<()> {
    let role = UserRole::from_str(role)?;
    let user = storage
        .update_role(id, role)
        .await
        .with_context(|| format!("failed to update user {}", id))?;

    println!("{} is now {}", user.name, user.role.to_string().cyan());
    Ok(())
}
