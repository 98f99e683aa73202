// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! leetlog: a multi-user journal of solved coding problems
//!
//! This crate provides the backend API: problem records scoped by owner,
//! CSV export and import, per-user statistics, and the identity-provider
//! webhook that keeps the user table in sync.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
}
