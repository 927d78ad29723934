use std::cmp::Ordering;

use super::error::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// Parsed, column-checked multi-key sort such as `"views desc, created_at desc"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy(Vec<OrderInfo>);

impl OrderBy {
    /// Parse a comma separated order spec, rejecting columns outside `allowed`.
    ///
    /// Each part is `column [asc|desc]`; the direction defaults to ascending.
    pub fn parse(spec: &str, allowed: &[&str]) -> Result<Self, RepositoryError> {
        let mut out = Vec::new();
        for part in spec.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            let Some(column) = it.next() else { continue };
            if !allowed.contains(&column) {
                return Err(RepositoryError::InvalidOrder(format!("unknown column '{}'", column)));
            }
            let sort = match it.next() {
                None => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(dir) => {
                    return Err(RepositoryError::InvalidOrder(format!("unknown direction '{}'", dir)))
                }
            };
            if let Some(extra) = it.next() {
                return Err(RepositoryError::InvalidOrder(format!("unexpected token '{}'", extra)));
            }
            out.push(OrderInfo { column: column.to_string(), sort });
        }
        Ok(Self(out))
    }

    pub fn columns(&self) -> &[OrderInfo] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `ORDER BY` clause with an optional table alias; empty when unordered.
    pub fn to_sql(&self, alias: Option<&str>) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|info| match alias {
                Some(alias) => format!("{}.\"{}\" {}", alias, info.column, info.sort.to_sql()),
                None => format!("\"{}\" {}", info.column, info.sort.to_sql()),
            })
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// Compare two rows key by key, falling through to the next key on ties.
    pub fn compare<T: Sortable>(&self, a: &T, b: &T) -> Ordering {
        for info in &self.0 {
            let ord = a.compare_column(b, &info.column);
            let ord = match info.sort {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Rows that can be ordered by their persisted column names in memory.
pub trait Sortable {
    /// Whitelisted column names accepted in order specs.
    const COLUMNS: &'static [&'static str];

    fn compare_column(&self, other: &Self, column: &str) -> Ordering;
}
