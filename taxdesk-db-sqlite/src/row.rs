//! Field-name → value rows and the parameter values bound into statements.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use taxdesk_core::RepositoryError;

/// A single column value as SQLite stored it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One result row, keeping the column order of the statement that produced it.
///
/// Repositories look columns up by name, so reordering the columns in a
/// `SELECT` never changes what they read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl From<Vec<(String, Value)>> for Row {
    fn from(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }
}

impl Row {
    /// Copy a sqlx row into an owned mapping, using each value's storage class.
    pub fn from_sqlite(row: &SqliteRow) -> Result<Self, RepositoryError> {
        let mut fields = Vec::with_capacity(row.columns().len());

        for (idx, column) in row.columns().iter().enumerate() {
            let name = column.name();
            let raw = row
                .try_get_raw(idx)
                .map_err(|e| RepositoryError::Decode(format!("Column '{name}' not found: {e}")))?;

            let value = if raw.is_null() {
                Value::Null
            } else {
                match raw.type_info().name() {
                    "INTEGER" => Value::Integer(decode(row, idx, name)?),
                    "REAL" => Value::Real(decode(row, idx, name)?),
                    "TEXT" => Value::Text(decode(row, idx, name)?),
                    "BLOB" => Value::Blob(decode(row, idx, name)?),
                    other => {
                        return Err(RepositoryError::Decode(format!(
                            "Unexpected type '{other}' for column '{name}'"
                        )));
                    }
                }
            };
            fields.push((name.to_string(), value));
        }

        Ok(Self { fields })
    }

    pub fn get(
        &self,
        column: &str,
    ) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in statement order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn value(
        &self,
        column: &str,
    ) -> Result<&Value, RepositoryError> {
        self.get(column)
            .ok_or_else(|| RepositoryError::Decode(format!("Column '{column}' not found")))
    }

    pub fn get_i64(
        &self,
        column: &str,
    ) -> Result<i64, RepositoryError> {
        self.get_optional_i64(column)?
            .ok_or_else(|| unexpected_null(column))
    }

    pub fn get_optional_i64(
        &self,
        column: &str,
    ) -> Result<Option<i64>, RepositoryError> {
        match self.value(column)? {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(*v)),
            other => Err(mismatch(column, "INTEGER", other)),
        }
    }

    /// Booleans are stored as INTEGER 0/1.
    pub fn get_bool(
        &self,
        column: &str,
    ) -> Result<bool, RepositoryError> {
        match self.value(column)? {
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Null => Err(unexpected_null(column)),
            other => Err(mismatch(column, "BOOLEAN", other)),
        }
    }

    pub fn get_string(
        &self,
        column: &str,
    ) -> Result<String, RepositoryError> {
        self.get_optional_string(column)?
            .ok_or_else(|| unexpected_null(column))
    }

    pub fn get_optional_string(
        &self,
        column: &str,
    ) -> Result<Option<String>, RepositoryError> {
        match self.value(column)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            other => Err(mismatch(column, "TEXT", other)),
        }
    }

    /// Decimal columns have NUMERIC affinity, so SQLite hands them back as
    /// INTEGER when the value is whole and REAL otherwise.
    pub fn get_decimal(
        &self,
        column: &str,
    ) -> Result<Decimal, RepositoryError> {
        self.get_optional_decimal(column)?
            .ok_or_else(|| unexpected_null(column))
    }

    pub fn get_optional_decimal(
        &self,
        column: &str,
    ) -> Result<Option<Decimal>, RepositoryError> {
        match self.value(column)? {
            Value::Null => Ok(None),
            Value::Integer(v) => Ok(Some(Decimal::from(*v))),
            Value::Real(v) => Decimal::try_from(*v).map(Some).map_err(|e| {
                RepositoryError::Decode(format!("Failed to convert {v} to Decimal: {e}"))
            }),
            Value::Text(s) => s.parse::<Decimal>().map(Some).map_err(|e| {
                RepositoryError::Decode(format!("Failed to parse decimal '{s}': {e}"))
            }),
            other => Err(mismatch(column, "DECIMAL", other)),
        }
    }

    pub fn get_optional_timestamp(
        &self,
        column: &str,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        match self.value(column)? {
            Value::Null => Ok(None),
            Value::Text(s) => parse_timestamp(s).map(Some),
            other => Err(mismatch(column, "TIMESTAMP", other)),
        }
    }
}

fn decode<'r, T>(
    row: &'r SqliteRow,
    idx: usize,
    name: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(idx)
        .map_err(|e| RepositoryError::Decode(format!("Failed to read column '{name}': {e}")))
}

fn unexpected_null(column: &str) -> RepositoryError {
    RepositoryError::Decode(format!("Column '{column}' is NULL"))
}

fn mismatch(
    column: &str,
    expected: &str,
    found: &Value,
) -> RepositoryError {
    RepositoryError::Decode(format!(
        "Column '{column}' expected {expected}, found {found:?}"
    ))
}

/// sqlx writes `DateTime<Utc>` as RFC 3339; `CURRENT_TIMESTAMP` and hand-written
/// rows use the plain SQLite layouts.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| RepositoryError::Decode(format!("Failed to parse timestamp '{s}': {e}")))
}

/// A value bound positionally into a statement. Values never become part of
/// the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
