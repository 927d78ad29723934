use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::order::Sortable;
use crate::database::validate::{is_valid_email, len_between, mailbox};

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub is_staff: bool,
    pub username: String,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string once persisted. Accepted on input, never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub profile_picture: Option<String>,
}

impl User {
    /// Fields a caller supplies when registering; everything else is server-assigned.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            name: name.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        len_between(&self.username, 4, 256)
            && self.email.chars().count() <= 256
            && is_valid_email(&self.email)
            && len_between(&self.name, 3, 128)
    }

    /// Reduce a named address to its mailbox so uniqueness holds per mailbox.
    pub fn normalize_email(&mut self) {
        if let Some(addr) = mailbox(&self.email) {
            self.email = addr.to_string();
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Sortable for User {
    const COLUMNS: &'static [&'static str] =
        &["created_at", "updated_at", "last_login", "username", "email", "name"];

    fn compare_column(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "created_at" => self.created_at.cmp(&other.created_at),
            "updated_at" => self.updated_at.cmp(&other.updated_at),
            "last_login" => self.last_login.cmp(&other.last_login),
            "username" => self.username.cmp(&other.username),
            "email" => self.email.cmp(&other.email),
            "name" => self.name.cmp(&other.name),
            _ => Ordering::Equal,
        }
    }
}
