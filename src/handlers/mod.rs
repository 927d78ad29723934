// handlers/mod.rs - HTTP handlers grouped by resource
//
// Public reads need no token; writes are gated in the router by
// `require_auth` / `require_staff` before any handler here runs.

pub mod chapters;
pub mod health;
pub mod projects;
pub mod users;

use serde::Deserialize;

use crate::config::ApiConfig;

/// `?limit=&offset=` paging shared by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    /// Resolve to `(limit, offset)`, clamping the limit to the configured maximum.
    pub fn resolve(&self, api: &ApiConfig) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(api.default_list_limit)
            .min(api.max_list_limit)
            .max(0);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}
