// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Progress indicators for workflow runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::colors::{format_duration, print_error, print_skipped, print_success};
use crate::errors::HypoflowError;
use crate::pipeline::RunObserver;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

#[derive(Default)]
struct ProgressState {
    spinner: Option<ProgressBar>,
    completed: usize,
    skipped: usize,
}

/// Spinner per running step, with a status line once it settles
///
/// Steps run one at a time, so a single spinner slot is enough.
#[derive(Default)]
pub struct StepProgress {
    state: Mutex<ProgressState>,
}

impl StepProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps that finished successfully
    pub fn completed(&self) -> usize {
        self.lock().completed
    }

    /// Steps whose condition did not hold
    pub fn skipped(&self) -> usize {
        self.lock().skipped
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_spinner(state: &mut ProgressState) {
        if let Some(spinner) = state.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl RunObserver for StepProgress {
    fn step_started(&self, _id: &str, name: &str) {
        let mut state = self.lock();
        Self::clear_spinner(&mut state);
        state.spinner = Some(create_spinner(&format!("{}...", name)));
    }

    fn step_completed(&self, _id: &str, name: &str, elapsed: Duration) {
        let mut state = self.lock();
        Self::clear_spinner(&mut state);
        state.completed += 1;
        print_success(&format!("{} {}", name, format_duration(elapsed).dimmed()));
    }

    fn step_skipped(&self, _id: &str, name: &str, condition: &str) {
        let mut state = self.lock();
        Self::clear_spinner(&mut state);
        state.skipped += 1;
        print_skipped(&format!("{} (skipped: {})", name, condition));
    }

    fn step_failed(&self, _id: &str, name: &str, error: &HypoflowError) {
        let mut state = self.lock();
        Self::clear_spinner(&mut state);
        print_error(&format!("{} - {}", name, error.root_cause()));
    }
}
