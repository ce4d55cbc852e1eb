//! Rule evaluation: row scanning, matching, and conditional cell updates.
//!
//! A rule is evaluated against one sheet. Rows `1..=max_rows` are scanned in
//! ascending order; every row whose search-column value matches the rule's
//! search value (normalized comparison) is a match, and the update column in
//! that row is overwritten with the target value if its current value
//! differs from the target under the same normalization. The target is
//! written verbatim, never normalized.

use thiserror::Error;

use crate::column::ColumnRef;
use crate::engine::{EngineError, Sheet};
use crate::models::Rule;

/// Result of evaluating one rule against one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalOutcome {
    pub matches_found: u64,
    pub updates_made: u64,
    pub updated_rows: Vec<u32>,
}

/// A cell write that still failed after the one-shot unprotect retry.
///
/// Carries the counts accumulated before the failure so the caller can
/// report the partial updates that were already applied to the sheet.
#[derive(Debug, Error)]
#[error("write failed at {column}{row} after unprotect retry: {source}")]
pub struct WriteError {
    pub row: u32,
    pub column: ColumnRef,
    pub partial: EvalOutcome,
    #[source]
    pub source: EngineError,
}

/// Normalize a cell value for comparison: trim ASCII whitespace from both
/// ends, then ASCII case-fold. Used for comparison only, never for storage.
pub fn normalize(value: &str) -> String {
    value
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .to_ascii_lowercase()
}

/// Evaluate one rule against one sheet, applying writes immediately and
/// individually.
///
/// A rejected write triggers a single sheet unprotect and one retry; a
/// second failure abandons the rule's remaining rows and is propagated as
/// [`WriteError`] for the caller to contain.
pub fn evaluate(
    sheet: &mut dyn Sheet,
    rule: &Rule,
    max_rows: u32,
) -> Result<EvalOutcome, WriteError> {
    let search_value = normalize(&rule.search_value);
    let target_value = normalize(&rule.target_value);
    let mut outcome = EvalOutcome::default();

    for row in 1..=max_rows {
        let cell = sheet.read_cell(row, rule.search_column.index());
        // Blank cells never match, even when the search value trims to empty.
        if cell.is_empty() || normalize(&cell) != search_value {
            continue;
        }
        outcome.matches_found += 1;

        let current = sheet.read_cell(row, rule.update_column.index());
        if normalize(&current) == target_value {
            tracing::debug!(
                rule = %rule.name,
                row,
                "value already matches target, no update"
            );
            continue;
        }

        if let Err(error) = write_with_retry(sheet, row, rule.update_column, &rule.target_value) {
            tracing::error!(
                rule = %rule.name,
                row,
                column = %rule.update_column,
                %error,
                "write failed after unprotect retry, abandoning remaining rows"
            );
            return Err(WriteError {
                row,
                column: rule.update_column,
                partial: outcome,
                source: error,
            });
        }

        outcome.updates_made += 1;
        outcome.updated_rows.push(row);
    }

    tracing::debug!(
        rule = %rule.name,
        matches = outcome.matches_found,
        updates = outcome.updates_made,
        "rule evaluated"
    );

    Ok(outcome)
}

fn write_with_retry(
    sheet: &mut dyn Sheet,
    row: u32,
    column: ColumnRef,
    value: &str,
) -> Result<(), EngineError> {
    let Err(first) = sheet.write_cell(row, column.index(), value) else {
        return Ok(());
    };

    tracing::warn!(
        row,
        column = %column,
        error = %first,
        "write rejected, attempting to unprotect sheet"
    );
    sheet.unprotect()?;
    sheet.write_cell(row, column.index(), value)
}
