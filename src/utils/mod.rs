// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Utility modules
//!
//! Terminal helpers for the hypoflow CLI.

pub mod colors;
pub mod spinner;

pub use colors::*;
pub use spinner::*;
