// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guarded seed and reset of a whole database.
//!
//! Destructive maintenance never runs against production. Against the
//! development database it needs explicit confirmation; the test database
//! is disposable and needs none.

use std::fmt;

use chrono::{TimeZone, Utc};

use crate::config::DatabaseMode;
use crate::db::{Db, TableCounts};
use crate::error::AppError;
use crate::models::{Difficulty, ProblemFields};

/// Categories created by `seed`.
pub const SEED_CATEGORIES: [&str; 38] = [
    "Array",
    "Hash Table",
    "Linked List",
    "Math",
    "Two Pointers",
    "String",
    "Binary Search",
    "Divide and Conquer",
    "Dynamic Programming",
    "Backtracking",
    "Stack",
    "Heap",
    "Greedy",
    "Sort",
    "Bit Manipulation",
    "Tree",
    "Depth-First Search",
    "Binary Tree",
    "Breadth-First Search",
    "Union Find",
    "Graph",
    "Design",
    "Topological Sort",
    "Trie",
    "Binary Indexed Tree",
    "Segment Tree",
    "Binary Search Tree",
    "Recursion",
    "Brainteaser",
    "Memoization",
    "Queue",
    "Minimax",
    "Reservoir Sampling",
    "Ordered Map",
    "Geometry",
    "Random",
    "Rejection Sampling",
    "Sliding Window",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Seed,
    Reset,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Seed => "seed",
            Self::Reset => "reset",
        })
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MaintenanceError {
    #[error("{0} is blocked on the production database")]
    ProductionBlocked(Operation),

    #[error("{0} on the development database needs --yes")]
    ConfirmationRequired(Operation),
}

/// Decide whether `operation` may run against a database in `mode`.
pub fn authorize(
    operation: Operation,
    mode: DatabaseMode,
    confirmed: bool,
) -> Result<(), MaintenanceError> {
    match mode {
        DatabaseMode::Production => Err(MaintenanceError::ProductionBlocked(operation)),
        DatabaseMode::Development if !confirmed => {
            Err(MaintenanceError::ConfirmationRequired(operation))
        }
        DatabaseMode::Development | DatabaseMode::Test => Ok(()),
    }
}

/// What `seed` did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: u64,
    pub problems_created: usize,
}

/// Create the standard categories and, for `sample_user`, a few sample
/// problems. Sample problems are skipped when that user already has any.
pub async fn seed(db: &Db, sample_user: Option<&str>) -> Result<SeedReport, AppError> {
    let mut report = SeedReport {
        categories_created: db.ensure_categories(&SEED_CATEGORIES).await?,
        ..Default::default()
    };
    tracing::info!(created = report.categories_created, "Seeded categories");

    let Some(user_id) = sample_user else {
        return Ok(report);
    };

    let existing = db.problems_for_user(user_id).await?.len();
    if existing > 0 {
        tracing::warn!(user_id, existing, "User already has problems, skipping samples");
        return Ok(report);
    }

    for fields in sample_problems() {
        db.create_problem(user_id, &fields).await?;
        report.problems_created += 1;
    }
    tracing::info!(user_id, created = report.problems_created, "Seeded sample problems");

    Ok(report)
}

/// Wipe every table. Returns the row counts from just before the wipe.
pub async fn reset(db: &Db) -> Result<TableCounts, AppError> {
    let before = db.reset_all().await?;
    tracing::info!(
        users = before.users,
        problems = before.problems,
        categories = before.categories,
        "Database reset"
    );
    Ok(before)
}

#[allow(clippy::too_many_arguments)]
fn sample(
    title: &str,
    slug: &str,
    difficulty: Difficulty,
    language: &str,
    notes: &str,
    keywords: &str,
    complexity: (&str, &str),
    was_hard: bool,
    solved: (i32, u32, u32),
    categories: &[&str],
) -> ProblemFields {
    ProblemFields {
        title: title.to_string(),
        url: format!("https://leetcode.com/problems/{slug}/"),
        difficulty,
        language_used: language.to_string(),
        solution_notes: notes.to_string(),
        what_went_wrong: String::new(),
        trigger_keywords: keywords.to_string(),
        time_complexity: complexity.0.to_string(),
        space_complexity: complexity.1.to_string(),
        was_hard,
        date_solved: Utc
            .with_ymd_and_hms(solved.0, solved.1, solved.2, 0, 0, 0)
            .single(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

/// Sample journal entries, all in [`SEED_CATEGORIES`].
pub fn sample_problems() -> Vec<ProblemFields> {
    vec![
        sample(
            "Two Sum",
            "two-sum",
            Difficulty::Easy,
            "Rust",
            "Hash map from value to index, look up the complement",
            "complement, hash map",
            ("O(n)", "O(n)"),
            false,
            (2025, 1, 15),
            &["Array", "Hash Table"],
        ),
        sample(
            "Add Two Numbers",
            "add-two-numbers",
            Difficulty::Medium,
            "Python",
            "Walk both lists with a carry",
            "linked list, carry",
            ("O(max(m,n))", "O(max(m,n))"),
            true,
            (2025, 1, 28),
            &["Linked List", "Math"],
        ),
        sample(
            "Longest Substring Without Repeating Characters",
            "longest-substring-without-repeating-characters",
            Difficulty::Medium,
            "Go",
            "Sliding window over a set of seen characters",
            "sliding window, substring",
            ("O(n)", "O(min(m,n))"),
            false,
            (2025, 2, 28),
            &["Hash Table", "String", "Sliding Window"],
        ),
        sample(
            "Median of Two Sorted Arrays",
            "median-of-two-sorted-arrays",
            Difficulty::Hard,
            "C++",
            "Binary search the partition of the shorter array",
            "binary search, partition, median",
            ("O(log(min(m,n)))", "O(1)"),
            true,
            (2025, 3, 28),
            &["Array", "Binary Search", "Divide and Conquer"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_production_is_always_blocked() {
        for operation in [Operation::Seed, Operation::Reset] {
            for confirmed in [false, true] {
                assert_eq!(
                    authorize(operation, DatabaseMode::Production, confirmed),
                    Err(MaintenanceError::ProductionBlocked(operation))
                );
            }
        }
    }

    #[test]
    fn test_development_needs_confirmation() {
        assert_eq!(
            authorize(Operation::Reset, DatabaseMode::Development, false),
            Err(MaintenanceError::ConfirmationRequired(Operation::Reset))
        );
        assert_eq!(
            authorize(Operation::Reset, DatabaseMode::Development, true),
            Ok(())
        );
    }

    #[test]
    fn test_test_database_needs_no_confirmation() {
        assert_eq!(authorize(Operation::Seed, DatabaseMode::Test, false), Ok(()));
        assert_eq!(authorize(Operation::Reset, DatabaseMode::Test, false), Ok(()));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MaintenanceError::ProductionBlocked(Operation::Reset).to_string(),
            "reset is blocked on the production database"
        );
        assert_eq!(
            MaintenanceError::ConfirmationRequired(Operation::Seed).to_string(),
            "seed on the development database needs --yes"
        );
    }

    #[test]
    fn test_samples_use_seed_categories() {
        let known: HashSet<&str> = SEED_CATEGORIES.into_iter().collect();
        let samples = sample_problems();
        assert!(!samples.is_empty());
        for fields in &samples {
            assert!(fields.date_solved.is_some(), "{}", fields.title);
            for category in &fields.categories {
                assert!(known.contains(category.as_str()), "{category}");
            }
        }
    }

    #[tokio::test]
    async fn test_offline_reset_fails_cleanly() {
        let err = reset(&Db::new_mock()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(sqlx::Error::PoolClosed)));
    }
}
