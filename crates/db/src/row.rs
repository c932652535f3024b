//! Driver-independent result rows.

use crate::error::DbError;

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
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

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<u16> for SqlValue {
    fn from(v: u16) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

/// One row of a result set, addressed by column index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&SqlValue, DbError> {
        self.values.get(index).ok_or_else(|| DbError::Decode {
            index,
            reason: format!("row has only {} columns", self.values.len()),
        })
    }

    /// Column as text. Numbers are rendered in their decimal form.
    pub fn text(&self, index: usize) -> Result<String, DbError> {
        match self.get(index)? {
            SqlValue::Text(s) => Ok(s.clone()),
            SqlValue::Int(i) => Ok(i.to_string()),
            SqlValue::Float(f) => Ok(f.to_string()),
            SqlValue::Bool(b) => Ok(b.to_string()),
            SqlValue::Null => Err(decode(index, "expected text, got NULL")),
        }
    }

    /// Column as a non-negative integer.
    pub fn unsigned(&self, index: usize) -> Result<u64, DbError> {
        match self.get(index)? {
            SqlValue::Int(i) => {
                u64::try_from(*i).map_err(|_| decode(index, &format!("negative value {i}")))
            }
            SqlValue::Float(f) if f.is_finite() && *f >= 0.0 => Ok(f.trunc() as u64),
            SqlValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| decode(index, &format!("'{s}' is not an unsigned integer"))),
            other => Err(decode(
                index,
                &format!("expected unsigned integer, got {other:?}"),
            )),
        }
    }

    /// Column as a port number.
    pub fn port(&self, index: usize) -> Result<u16, DbError> {
        let value = self.unsigned(index)?;
        u16::try_from(value).map_err(|_| decode(index, &format!("{value} is not a valid port")))
    }
}

fn decode(index: usize, reason: &str) -> DbError {
    DbError::Decode {
        index,
        reason: reason.to_string(),
    }
}
