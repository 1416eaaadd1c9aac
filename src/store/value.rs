use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A value that can be bound to a query parameter or compared against the
/// current value of an entity column. Covers exactly the column types the
/// persisted entities use.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Uuid),
    Text(String),
    Decimal(Decimal),
    Timestamp(DateTime<Utc>),
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

/// Binds a [`SqlValue`] to the next placeholder of a `sqlx::query` or
/// `sqlx::query_as` builder, whichever the call site holds.
macro_rules! bind_value {
    ($query:expr, $value:expr) => {
        match $value {
            $crate::store::value::SqlValue::Uuid(v) => $query.bind(*v),
            $crate::store::value::SqlValue::Text(v) => $query.bind(v.clone()),
            $crate::store::value::SqlValue::Decimal(v) => $query.bind(*v),
            $crate::store::value::SqlValue::Timestamp(v) => $query.bind(*v),
        }
    };
}

pub(super) use bind_value;

/// Equality predicate set over an entity's columns. Column names come from the
/// entity's column constants, so a typo is a compile error at the call site.
#[derive(Debug, Default, Clone)]
pub struct Criteria {
    predicates: Vec<(&'static str, SqlValue)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.predicates.push((column, value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub(super) fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.predicates.iter().map(|(_, v)| v)
    }

    /// `WHERE a = $1 AND b = $2`, numbering placeholders from `first_index`.
    /// Empty criteria produce an empty string (unfiltered scan).
    pub(super) fn where_clause(&self, first_index: usize) -> String {
        if self.predicates.is_empty() {
            return String::new();
        }
        let conditions: Vec<String> = self
            .predicates
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ${}", column, first_index + i))
            .collect();
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_clause_numbers_placeholders_from_first_index() {
        let criteria = Criteria::new()
            .eq("owner_name", "alice")
            .eq("id", Uuid::nil());
        assert_eq!(
            criteria.where_clause(1),
            " WHERE owner_name = $1 AND id = $2"
        );
        assert_eq!(
            criteria.where_clause(3),
            " WHERE owner_name = $3 AND id = $4"
        );
    }

    #[test]
    fn empty_criteria_mean_no_filter() {
        let criteria = Criteria::new();
        assert!(criteria.is_empty());
        assert_eq!(criteria.where_clause(1), "");
    }

    #[test]
    fn values_compare_by_content() {
        assert_eq!(SqlValue::from("alice"), SqlValue::Text("alice".into()));
        assert_ne!(
            SqlValue::from(Decimal::new(100, 0)),
            SqlValue::from(Decimal::new(70, 0))
        );
    }
}
