// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod csv;
pub mod import;
pub mod maintenance;
pub mod webhook_signature;

pub use csv::{export_csv, parse_import, CsvError, HEADERS};
pub use import::{import_problems, ImportResults};
pub use webhook_signature::{SignatureError, SignatureHeaders};
