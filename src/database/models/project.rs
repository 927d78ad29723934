use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::order::Sortable;
use crate::database::validate::len_between;

/// A novel. `slug` is always derived from `title` on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub title: String,
    pub synopsis: String,
    pub author: String,
    pub status: String,
    /// Comma separated.
    pub tags: String,
    pub views: i32,
    pub image: String,
    pub slug: String,
}

impl Project {
    pub fn is_valid(&self) -> bool {
        len_between(&self.title, 3, 256) && len_between(&self.synopsis, 64, 1024)
    }
}

impl Sortable for Project {
    const COLUMNS: &'static [&'static str] =
        &["created_at", "updated_at", "title", "author", "status", "views", "slug"];

    fn compare_column(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "created_at" => self.created_at.cmp(&other.created_at),
            "updated_at" => self.updated_at.cmp(&other.updated_at),
            "title" => self.title.cmp(&other.title),
            "author" => self.author.cmp(&other.author),
            "status" => self.status.cmp(&other.status),
            "views" => self.views.cmp(&other.views),
            "slug" => self.slug.cmp(&other.slug),
            _ => Ordering::Equal,
        }
    }
}
