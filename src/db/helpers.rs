use color_eyre::{eyre::OptionExt, eyre::WrapErr, Result};
use libsql::params::IntoParams;
use serde::de::DeserializeOwned;

/// Deserialize every returned row into `T`.
pub async fn query_all<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Vec<T>> {
    let mut rows = conn.query(sql, params).await?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().await? {
        results.push(libsql::de::from_row::<T>(&row)?);
    }
    Ok(results)
}

/// Like [`query_optional`] but a missing row is an error.
pub async fn query_one<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<T> {
    query_optional(conn, sql, params)
        .await?
        .ok_or_eyre("expected a row but got none")
}

pub async fn query_optional<T: DeserializeOwned>(
    conn: &libsql::Connection,
    sql: &str,
    params: impl IntoParams,
) -> Result<Option<T>> {
    match conn.query(sql, params).await?.next().await? {
        Some(row) => Ok(Some(libsql::de::from_row::<T>(&row)?)),
        None => Ok(None),
    }
}

/// Decode one of the JSON text columns (questions, pages, play state).
pub fn from_json_column<T: DeserializeOwned>(column: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).wrap_err_with(|| format!("invalid JSON in column {column}"))
}
