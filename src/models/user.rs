// src/models/user.rs

use sqlx::FromRow;

/// Name shown for users with no usable directory entry.
pub const ANONYMOUS: &str = "Anonymous";

/// A row from the user directory.
///
/// The directory is owned by the account service; this core only reads it to
/// label leaderboard entries.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserRow {
    pub fn display_name(&self) -> String {
        display_name(self.name.as_deref(), self.email.as_deref())
    }
}

/// Display-name fallback chain used by the leaderboard: name, then email,
/// then "Anonymous". Blank strings count as absent.
pub fn display_name(name: Option<&str>, email: Option<&str>) -> String {
    name.filter(|s| !s.trim().is_empty())
        .or(email.filter(|s| !s.trim().is_empty()))
        .map(str::to_owned)
        .unwrap_or_else(|| ANONYMOUS.to_string())
}
