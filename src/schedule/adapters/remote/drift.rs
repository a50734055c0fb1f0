//! Recognition of backend failures caused by schema drift.
//!
//! Only two shapes are recognized: an undefined column and an undefined
//! table. Every other failure is passed through untouched by
//! [`escalate`].

use crate::schedule::ports::{BackendError, StoreError};

/// Optional ordering column on `projects` and `tasks`.
pub(crate) const POSITION_COLUMN: &str = "position";

/// `PostgreSQL` `undefined_column` and its REST-gateway equivalent.
const UNDEFINED_COLUMN_CODES: [&str; 2] = ["42703", "PGRST204"];

/// `PostgreSQL` `undefined_table` and its REST-gateway equivalent.
const UNDEFINED_TABLE_CODES: [&str; 2] = ["42P01", "PGRST205"];

/// Returns `true` when `err` reports that `column` does not exist.
///
/// A structured code is trusted when present; otherwise the message must
/// mention the column and must not describe a missing table.
pub(crate) fn is_missing_column(err: &BackendError, column: &str) -> bool {
    let mentions_column = mentions(err.message(), column);
    match err.code() {
        Some(code) => UNDEFINED_COLUMN_CODES.contains(&code) && mentions_column,
        None => mentions_column && !is_missing_table(err),
    }
}

/// Returns `true` when `err` reports that a table does not exist.
pub(crate) fn is_missing_table(err: &BackendError) -> bool {
    match err.code() {
        Some(code) => UNDEFINED_TABLE_CODES.contains(&code),
        None => {
            let message = err.message().to_lowercase();
            (message.starts_with("relation \"") && message.contains("does not exist"))
                || message.contains("could not find the table")
        }
    }
}

/// Converts a failure that survived the drift fallbacks into a store error.
///
/// A missing table becomes [`StoreError::NotProvisioned`]; everything else
/// is returned unchanged inside [`StoreError::Backend`].
pub(crate) fn escalate(err: BackendError, table: &str) -> StoreError {
    if is_missing_table(&err) {
        return StoreError::NotProvisioned {
            table: table.to_owned(),
        };
    }
    StoreError::Backend(err)
}

fn mentions(message: &str, column: &str) -> bool {
    message.to_lowercase().contains(&column.to_lowercase())
}
