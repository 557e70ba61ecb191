//! Read/write options understood by every `RecordStore`: equality filters,
//! a single ordering column and a row limit.

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filter `column = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// Whether a JSON row satisfies the filter. Scalars are compared by
    /// their textual form, the way the filter value travels on the wire.
    pub fn matches(&self, row: &Value) -> bool {
        match row.get(&self.column) {
            Some(Value::String(s)) => *s == self.value,
            Some(Value::Number(n)) => n.to_string() == self.value,
            Some(Value::Bool(b)) => b.to_string() == self.value,
            Some(Value::Null) | None => self.value == "null",
            Some(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Comma-separated column list; `None` selects everything.
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn newest_first(self) -> Self {
        self.order_by("created_at", Direction::Descending)
    }

    pub fn oldest_first(self) -> Self {
        self.order_by("created_at", Direction::Ascending)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_compares_scalars_textually() {
        let row = json!({ "id": 42, "comment_id": "abc", "active": true, "gone": null });
        assert!(Filter::eq("id", 42).matches(&row));
        assert!(Filter::eq("comment_id", "abc").matches(&row));
        assert!(Filter::eq("active", true).matches(&row));
        assert!(Filter::eq("gone", "null").matches(&row));
        assert!(!Filter::eq("comment_id", "abd").matches(&row));
        assert!(!Filter::eq("missing", "x").matches(&row));
    }

    #[test]
    fn builder_accumulates_filters() {
        let q = Query::all().eq("post_id", "p1").eq("user_id", "u1").newest_first().limit(5);
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.order.unwrap().direction, Direction::Descending);
        assert_eq!(q.limit, Some(5));
    }
}
