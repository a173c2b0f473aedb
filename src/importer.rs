use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use thiserror::Error;

use crate::config::Settings;
use crate::schema::{FIELDS_DIRECTIVE, LogSchema};
use crate::store::{Store, StoreError, StoreTx};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Log file is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("line {line}: query column {index} is out of range for a row with {count} fields")]
    QueryColumnOutOfRange {
        line: usize,
        index: usize,
        count: usize,
    },
    #[error("line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: StoreError,
    },
}

/// Streams one log file into the configured table.
///
/// The whole file runs in a single transaction: rows reach the database only
/// if every line imports cleanly, otherwise the transaction rolls back when
/// the connection is released and the file leaves no trace.
pub fn import_file(path: &Path, settings: &Settings) -> Result<(), ImportError> {
    let file = File::open(path)?;
    // memmap2 refuses zero-length maps; an empty file has nothing to import.
    if file.metadata()?.len() == 0 {
        return Ok(());
    }
    let mmap = unsafe { Mmap::map(&file)? };
    let content = std::str::from_utf8(&mmap)?;

    let mut store = Store::open(&settings.db)?;
    let tx = store.begin()?;

    // Data lines are legal before any #Fields: directive; the insert then
    // fails at the store because no table exists yet, and that failure
    // aborts the file.
    let mut query_column_index = None;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with(FIELDS_DIRECTIVE) {
            let schema = LogSchema::from_directive(line, &settings.query_params);
            tracing::debug!(
                line = idx + 1,
                columns = schema.all_columns().count(),
                query_column = ?schema.query_column_index(),
                "resolved fields directive"
            );
            tx.ensure_table(&settings.table, schema.all_columns())?;
            query_column_index = schema.query_column_index();
        } else if line.starts_with('#') {
            continue;
        } else {
            ingest_line(&tx, settings, line, query_column_index, idx + 1)?;
        }
    }

    tx.commit()?;
    Ok(())
}

/// Tokenizes one data line, derives the configured query-parameter values,
/// and appends the combined row.
fn ingest_line(
    tx: &StoreTx<'_>,
    settings: &Settings,
    line: &str,
    query_column_index: Option<usize>,
    lineno: usize,
) -> Result<(), ImportError> {
    let fields: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
    let mut values: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    for param in &settings.query_params {
        values.push(extract_query_param(
            param,
            &fields,
            query_column_index,
            lineno,
        )?);
    }
    tx.append_row(&settings.table, &values)
        .map_err(|source| ImportError::Row {
            line: lineno,
            source,
        })
}

/// Pulls one URL query parameter value out of the row's query-string field.
///
/// The query string is split on `&`; the first segment whose text starts
/// with `param` supplies the value, taken as everything after the first `=`.
/// Returns the empty string when no query column exists, when no segment
/// matches, or when the matching segment carries no `=` at all, so the row
/// always keeps a uniform width.
fn extract_query_param(
    param: &str,
    fields: &[&str],
    query_column_index: Option<usize>,
    lineno: usize,
) -> Result<String, ImportError> {
    let Some(index) = query_column_index else {
        return Ok(String::new());
    };
    let query = fields
        .get(index)
        .ok_or(ImportError::QueryColumnOutOfRange {
            line: lineno,
            index,
            count: fields.len(),
        })?;
    for segment in query.split('&') {
        if segment.starts_with(param) {
            let value = segment.split_once('=').map(|(_, v)| v).unwrap_or("");
            return Ok(value.to_string());
        }
    }
    Ok(String::new())
}
