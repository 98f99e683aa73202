// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort CSV import.
//!
//! Rows are stored one at a time; a failed row is reported and skipped, and
//! rows already stored stay stored.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::Db;
use crate::error::AppError;
use crate::services::csv::parse_import;

/// Outcome counts and row-specific messages for one import.
#[derive(Debug, Default, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImportResults {
    pub successful: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl ImportResults {
    fn record_failure(&mut self, row: usize, reason: impl std::fmt::Display) {
        self.failed += 1;
        self.errors.push(format!("Row {row}: {reason}"));
    }
}

/// Import `text` into `user_id`'s collection.
///
/// Structural problems (too few rows, wrong header) reject the whole file
/// before anything is stored.
pub async fn import_problems(
    db: &Db,
    user_id: &str,
    text: &str,
) -> Result<ImportResults, AppError> {
    let rows = parse_import(text)?;
    let mut results = ImportResults::default();

    for parsed in rows {
        let fields = match parsed.outcome {
            Ok(fields) => fields,
            Err(reason) => {
                results.record_failure(parsed.row, reason);
                continue;
            }
        };

        match db.create_problem(user_id, &fields).await {
            Ok(problem) => {
                results.successful += 1;
                tracing::debug!(user_id, row = parsed.row, problem_id = problem.id, "Imported row");
            }
            Err(e) => {
                tracing::warn!(user_id, row = parsed.row, error = %e, "Failed to import row");
                results.record_failure(parsed.row, e);
            }
        }
    }

    tracing::info!(
        user_id,
        successful = results.successful,
        failed = results.failed,
        "Import completed"
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::csv::HEADERS;

    #[tokio::test]
    async fn test_structural_errors_reject_file() {
        let db = Db::new_mock();
        let err = import_problems(&db, "user_1", "Title\n").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = import_problems(&db, "user_1", "Title,URL\na,b")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCsvHeader { .. }));
    }

    #[tokio::test]
    async fn test_storage_failures_become_row_errors() {
        // Offline handle: every valid row fails at the storage step.
        let db = Db::new_mock();
        let text = format!(
            "{}\nTwo Sum,https://a,EASY,Rust,,,,,,,false,\nBad,https://b,nope,Rust,,,,,,,false,",
            HEADERS.join(",")
        );
        let results = import_problems(&db, "user_1", &text).await.unwrap();

        assert_eq!(results.successful, 0);
        assert_eq!(results.failed, 2);
        assert!(results.errors[0].starts_with("Row 2: "));
        assert_eq!(results.errors[1], "Row 3: Invalid difficulty \"nope\"");
    }
}
