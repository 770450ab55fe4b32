//! Row mapping: typed extraction and dynamic JSON conversion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use heck::ToLowerCamelCase;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

use crate::error::{QueryError, QueryResult};

/// Map a database row into a typed value.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> QueryResult<Self>;
}

/// Extraction helpers with typed decode errors.
pub trait RowExt {
    /// Get a column by name, turning driver failures into
    /// [`QueryError::Decode`] with the column name attached.
    fn try_get_column<'a, T: FromSql<'a>>(&'a self, column: &str) -> QueryResult<T>;
}

impl RowExt for Row {
    fn try_get_column<'a, T: FromSql<'a>>(&'a self, column: &str) -> QueryResult<T> {
        self.try_get(column)
            .map_err(|e| QueryError::decode(column, e.to_string()))
    }
}

/// Single-column row wrapper, handy for `RETURNING id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Single<T>(pub T);

impl<T> Single<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: for<'a> FromSql<'a>> FromRow for Single<T> {
    fn from_row(row: &Row) -> QueryResult<Self> {
        row.try_get(0)
            .map(Single)
            .map_err(|e| QueryError::decode("0", e.to_string()))
    }
}

/// Key style for dynamic JSON row mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyCase {
    /// Keep column names exactly as the database reports them.
    #[default]
    Preserve,
    /// Convert `snake_case` column names to `lowerCamelCase` keys.
    Camel,
}

impl KeyCase {
    fn apply(self, name: &str) -> String {
        match self {
            KeyCase::Preserve => name.to_string(),
            KeyCase::Camel => name.to_lower_camel_case(),
        }
    }
}

/// Convert a row into a JSON object, mapping each column by its wire type.
///
/// Column names are reshaped per `key_case`; the values themselves are never
/// altered. Types outside the supported set fail with a decode error naming
/// the column.
pub fn row_to_json(row: &Row, key_case: KeyCase) -> QueryResult<serde_json::Map<String, serde_json::Value>> {
    use serde_json::Value as Json;

    let mut object = serde_json::Map::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let value = match *column.type_() {
            Type::BOOL => row
                .try_get::<_, Option<bool>>(idx)
                .map(|v| v.map_or(Json::Null, Json::Bool)),
            Type::INT2 => row
                .try_get::<_, Option<i16>>(idx)
                .map(|v| v.map_or(Json::Null, |n| Json::from(n))),
            Type::INT4 => row
                .try_get::<_, Option<i32>>(idx)
                .map(|v| v.map_or(Json::Null, |n| Json::from(n))),
            Type::INT8 => row
                .try_get::<_, Option<i64>>(idx)
                .map(|v| v.map_or(Json::Null, |n| Json::from(n))),
            Type::FLOAT4 => row
                .try_get::<_, Option<f32>>(idx)
                .map(|v| v.map_or(Json::Null, |n| Json::from(n))),
            Type::FLOAT8 => row
                .try_get::<_, Option<f64>>(idx)
                .map(|v| v.map_or(Json::Null, |n| Json::from(n))),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
                .try_get::<_, Option<String>>(idx)
                .map(|v| v.map_or(Json::Null, Json::String)),
            Type::UUID => row
                .try_get::<_, Option<uuid::Uuid>>(idx)
                .map(|v| v.map_or(Json::Null, |u| Json::String(u.to_string()))),
            Type::DATE => row
                .try_get::<_, Option<NaiveDate>>(idx)
                .map(|v| v.map_or(Json::Null, |d| Json::String(d.to_string()))),
            Type::TIMESTAMP => row
                .try_get::<_, Option<NaiveDateTime>>(idx)
                .map(|v| v.map_or(Json::Null, |t| Json::String(t.to_string()))),
            Type::TIMESTAMPTZ => row
                .try_get::<_, Option<DateTime<Utc>>>(idx)
                .map(|v| v.map_or(Json::Null, |t| Json::String(t.to_rfc3339()))),
            Type::JSON | Type::JSONB => row
                .try_get::<_, Option<serde_json::Value>>(idx)
                .map(|v| v.unwrap_or(Json::Null)),
            Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx).map(|v| {
                v.map_or(Json::Null, |bytes| {
                    Json::Array(bytes.into_iter().map(Json::from).collect())
                })
            }),
            ref other => {
                return Err(QueryError::decode(
                    name,
                    format!("unsupported column type '{}'", other),
                ));
            }
        }
        .map_err(|e| QueryError::decode(name, e.to_string()))?;

        object.insert(key_case.apply(name), value);
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_case_reshapes_names() {
        assert_eq!(KeyCase::Preserve.apply("created_at"), "created_at");
        assert_eq!(KeyCase::Camel.apply("created_at"), "createdAt");
        assert_eq!(KeyCase::Camel.apply("id"), "id");
    }
}
