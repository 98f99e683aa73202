// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user statistics computed from problem records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Difficulty, Problem};
use crate::time_utils::{month_key, trailing_month_keys};

/// Number of languages reported.
pub const TOP_LANGUAGES: usize = 5;
/// Number of categories reported.
pub const TOP_CATEGORIES: usize = 8;
/// Months of recent activity reported, including the current one.
pub const RECENT_MONTHS: usize = 6;

/// Aggregate statistics for one user.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProblemStats {
    pub total_problems: u32,
    pub difficulty: DifficultyBreakdown,
    /// Percentage of problems not marked hard, rounded
    pub success_rate: u32,
    pub languages: Vec<LanguageCount>,
    pub categories: Vec<CategoryCount>,
    /// Most recent month first
    pub recent_activity: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DifficultyBreakdown {
    #[serde(rename = "EASY")]
    pub easy: u32,
    #[serde(rename = "MEDIUM")]
    pub medium: u32,
    #[serde(rename = "HARD")]
    pub hard: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LanguageCount {
    pub language: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CategoryCount {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: u32,
}

impl ProblemStats {
    /// Compute statistics over one user's problems.
    ///
    /// `now` anchors the recent-activity window.
    pub fn from_problems(problems: &[Problem], now: DateTime<Utc>) -> Self {
        let mut difficulty = DifficultyBreakdown::default();
        let mut not_hard = 0u32;
        let mut languages: HashMap<&str, u32> = HashMap::new();
        let mut categories: HashMap<&str, u32> = HashMap::new();
        let mut months: HashMap<String, u32> = HashMap::new();

        for problem in problems {
            match problem.difficulty {
                Difficulty::Easy => difficulty.easy += 1,
                Difficulty::Medium => difficulty.medium += 1,
                Difficulty::Hard => difficulty.hard += 1,
            }
            if !problem.was_hard {
                not_hard += 1;
            }
            *languages.entry(problem.language_used.as_str()).or_insert(0) += 1;
            for name in &problem.categories {
                *categories.entry(name.as_str()).or_insert(0) += 1;
            }
            *months.entry(month_key(problem.date_solved)).or_insert(0) += 1;
        }

        let total_problems = problems.len() as u32;

        let recent_activity = trailing_month_keys(now, RECENT_MONTHS)
            .into_iter()
            .map(|month| {
                let count = months.get(&month).copied().unwrap_or(0);
                MonthlyCount { month, count }
            })
            .collect();

        Self {
            total_problems,
            difficulty,
            success_rate: success_rate(not_hard, total_problems),
            languages: top_n(languages, TOP_LANGUAGES)
                .into_iter()
                .map(|(language, count)| LanguageCount { language, count })
                .collect(),
            categories: top_n(categories, TOP_CATEGORIES)
                .into_iter()
                .map(|(name, count)| CategoryCount { name, count })
                .collect(),
            recent_activity,
        }
    }
}

/// Percentage of `successes` out of `total`, rounded; 0 when `total` is 0.
pub fn success_rate(successes: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(successes) / f64::from(total) * 100.0).round() as u32
}

/// Highest counts first; ties by name ascending.
fn top_n(counts: HashMap<&str, u32>, n: usize) -> Vec<(String, u32)> {
    let mut ranked: Vec<(String, u32)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}
