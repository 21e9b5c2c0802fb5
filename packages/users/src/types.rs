// ABOUTME: User type definitions
// ABOUTME: Accounts and the role that gates review and acceptance actions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Pm,
    QaLead,
    Tester,
    Developer,
    Viewer,
}

impl UserRole {
    pub const ALL: [UserRole; 6] = [
        UserRole::Admin,
        UserRole::Pm,
        UserRole::QaLead,
        UserRole::Tester,
        UserRole::Developer,
        UserRole::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Pm => "PM",
            UserRole::QaLead => "QA_LEAD",
            UserRole::Tester => "TESTER",
            UserRole::Developer => "DEVELOPER",
            UserRole::Viewer => "VIEWER",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Tester
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role '{0}' (expected one of ADMIN, PM, QA_LEAD, TESTER, DEVELOPER, VIEWER)")]
pub struct ParseRoleError(pub String);

impl FromStr for UserRole {
    type Err = ParseRoleError;

    /// Case-insensitive; accepts `-` in place of `_` so `qa-lead` works on the command line
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}
