use serde_json::{Map, Value};
use sqlx::MySqlPool;

use crate::error::ServiceError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// JSON field name paired with the column it updates.
pub type Column = (&'static str, &'static str);

fn to_sql_value(field: &str, value: &Value) -> Result<SqlValue, ServiceError> {
    Ok(match value {
        Value::String(s) => SqlValue::String(s.trim().to_string()),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                SqlValue::U64(u)
            } else if let Some(i) = n.as_i64() {
                SqlValue::I64(i)
            } else if let Some(f) = n.as_f64() {
                SqlValue::F64(f)
            } else {
                return Err(ServiceError::bad_request(format!("Invalid number for '{field}'")));
            }
        }
        Value::Bool(b) => SqlValue::Bool(*b),
        Value::Null => SqlValue::Null,
        _ => {
            return Err(ServiceError::bad_request(format!(
                "Unsupported value for '{field}'"
            )));
        }
    })
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only fields listed in `columns` may appear in the payload; anything else
/// is rejected so column names never come from the request.
pub fn build_update_sql(
    table: &str,
    payload: &Map<String, Value>,
    columns: &[Column],
    id_value: u64,
) -> Result<SqlUpdate, ServiceError> {
    if payload.is_empty() {
        return Err(ServiceError::bad_request("No fields provided for update"));
    }

    let mut assignments = Vec::with_capacity(payload.len());
    let mut values = Vec::with_capacity(payload.len() + 1);

    for (field, value) in payload {
        let column = columns
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, column)| *column)
            .ok_or_else(|| ServiceError::bad_request(format!("Field '{field}' cannot be updated")))?;

        assignments.push(format!("{column} = ?"));
        values.push(to_sql_value(field, value)?);
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?",
        table,
        assignments.join(", ")
    );

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// Payload as a JSON object or a 400.
pub fn as_object(payload: &Value) -> Result<&Map<String, Value>, ServiceError> {
    payload
        .as_object()
        .ok_or_else(|| ServiceError::bad_request("Payload must be a JSON object"))
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[Column] = &[("name", "name"), ("contactPerson", "contact_person")];

    #[test]
    fn maps_fields_to_whitelisted_columns() {
        let payload = json!({ "name": " Acme ", "contactPerson": null });
        let update = build_update_sql("customers", as_object(&payload).unwrap(), COLUMNS, 7).unwrap();

        assert_eq!(
            update.sql,
            "UPDATE customers SET contact_person = ?, name = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::Null,
                SqlValue::String("Acme".to_string()),
                SqlValue::U64(7)
            ]
        );
    }

    #[test]
    fn rejects_unknown_fields_and_empty_payloads() {
        let payload = json!({ "id = 1; DROP TABLE users; --": 1 });
        let err = build_update_sql("customers", as_object(&payload).unwrap(), COLUMNS, 1).unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let empty = json!({});
        assert!(build_update_sql("customers", as_object(&empty).unwrap(), COLUMNS, 1).is_err());

        assert!(as_object(&json!([1, 2])).is_err());
    }

    #[test]
    fn numbers_keep_their_kind() {
        assert_eq!(to_sql_value("n", &json!(3)).unwrap(), SqlValue::U64(3));
        assert_eq!(to_sql_value("n", &json!(-3)).unwrap(), SqlValue::I64(-3));
        assert_eq!(to_sql_value("n", &json!(2.5)).unwrap(), SqlValue::F64(2.5));
        assert!(to_sql_value("n", &json!({ "a": 1 })).is_err());
    }
}
