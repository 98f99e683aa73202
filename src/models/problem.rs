// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Problem records: storage rows, API input, and list filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Problem difficulty as labelled by the judge site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
#[sqlx(type_name = "difficulty", rename_all = "UPPERCASE")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    /// Case-insensitive parse; surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Difficulty {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid difficulty {value:?}"))
    }
}

/// Full problem record with its category names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Problem {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    #[serde(skip)]
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub difficulty: Difficulty,
    pub language_used: String,
    pub solution_notes: String,
    pub what_went_wrong: String,
    pub trigger_keywords: String,
    pub time_complexity: String,
    pub space_complexity: String,
    pub was_hard: bool,
    pub date_solved: DateTime<Utc>,
    /// Category names, sorted
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row returned by the list endpoint.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProblemSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub title: String,
    pub difficulty: Difficulty,
    pub language_used: String,
    pub was_hard: bool,
    pub date_solved: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub categories: Vec<String>,
}

/// Create/update request body. Updates replace every mutable field.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProblemInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    pub difficulty: Difficulty,
    #[validate(length(min = 1, max = 200))]
    pub language_used: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub solution_notes: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub what_went_wrong: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub trigger_keywords: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub time_complexity: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub space_complexity: String,
    #[serde(default)]
    pub was_hard: bool,
    /// On create, absent means now; on update, absent keeps the stored date.
    #[serde(default)]
    pub date_solved: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub categories: Vec<String>,
}

impl ProblemInput {
    /// Trim required fields and normalize categories, then validate.
    pub fn into_fields(self) -> Result<ProblemFields, validator::ValidationErrors> {
        let input = ProblemInput {
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
            language_used: self.language_used.trim().to_string(),
            categories: normalize_category_names(&self.categories),
            ..self
        };
        input.validate()?;

        Ok(ProblemFields {
            title: input.title,
            url: input.url,
            difficulty: input.difficulty,
            language_used: input.language_used,
            solution_notes: input.solution_notes,
            what_went_wrong: input.what_went_wrong,
            trigger_keywords: input.trigger_keywords,
            time_complexity: input.time_complexity,
            space_complexity: input.space_complexity,
            was_hard: input.was_hard,
            date_solved: input.date_solved,
            categories: input.categories,
        })
    }
}

/// Validated mutable fields of a problem, as handed to the database layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemFields {
    pub title: String,
    pub url: String,
    pub difficulty: Difficulty,
    pub language_used: String,
    pub solution_notes: String,
    pub what_went_wrong: String,
    pub trigger_keywords: String,
    pub time_complexity: String,
    pub space_complexity: String,
    pub was_hard: bool,
    /// `None` lets the store default (create) or keep (update) the date.
    pub date_solved: Option<DateTime<Utc>>,
    /// Unique, trimmed, non-empty names
    pub categories: Vec<String>,
}

/// Trim names, drop blanks, and remove duplicates keeping the first occurrence.
pub fn normalize_category_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_string)
        .collect()
}

/// Sort key for listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemSort {
    #[default]
    DateSolved,
    Title,
    Difficulty,
    UpdatedAt,
}

impl ProblemSort {
    pub fn column(self) -> &'static str {
        match self {
            ProblemSort::DateSolved => "p.date_solved",
            ProblemSort::Title => "lower(p.title)",
            ProblemSort::Difficulty => "p.difficulty",
            ProblemSort::UpdatedAt => "p.updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filters accepted by `GET /api/problems`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemFilter {
    pub difficulty: Option<Difficulty>,
    pub language: Option<String>,
    pub category: Option<String>,
    /// Case-insensitive title substring
    pub q: Option<String>,
    #[serde(default)]
    pub sort: ProblemSort,
    #[serde(default)]
    pub order: SortOrder,
}
