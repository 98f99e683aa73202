// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod problem;
pub mod stats;
pub mod user;

pub use problem::{
    normalize_category_names, Difficulty, Problem, ProblemFields, ProblemFilter, ProblemInput,
    ProblemSort, ProblemSummary, SortOrder,
};
pub use stats::ProblemStats;
pub use user::{User, UserProfile};
