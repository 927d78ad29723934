use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::order::Sortable;
use crate::database::validate::{len_at_least, len_between};

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct Chapter {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub project_id: Uuid,
}

impl Chapter {
    pub fn is_valid(&self) -> bool {
        len_between(&self.title, 3, 128) && len_at_least(&self.content, 64)
    }

    /// First `max_chars` characters of the content followed by `...`.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.content.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.content[..cut]),
            None => self.content.clone(),
        }
    }
}

impl Sortable for Chapter {
    const COLUMNS: &'static [&'static str] = &["created_at", "updated_at", "title", "slug"];

    fn compare_column(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "created_at" => self.created_at.cmp(&other.created_at),
            "updated_at" => self.updated_at.cmp(&other.updated_at),
            "title" => self.title.cmp(&other.title),
            "slug" => self.slug.cmp(&other.slug),
            _ => Ordering::Equal,
        }
    }
}
