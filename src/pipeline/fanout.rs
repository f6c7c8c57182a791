// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 hypoflow contributors

//! Fan-out/fan-in execution of independent units inside a step
//!
//! Both forms are all-or-nothing: the first failing unit fails the whole
//! operation and the remaining in-flight units are dropped, so no partial
//! results ever reach the caller.

use std::future::Future;

use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::errors::HypoflowResult;

/// Run one unit per item concurrently; results keep the source order
pub async fn fan_out<I, T, F, Fut>(items: I, unit: F) -> HypoflowResult<Vec<T>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = HypoflowResult<T>>,
{
    let units: Vec<Fut> = items.into_iter().map(unit).collect();
    debug!(units = units.len(), "Fanning out");
    try_join_all(units).await
}

/// Run one unit per item concurrently; results arrive in settle order
pub async fn fan_out_settled<I, T, F, Fut>(items: I, unit: F) -> HypoflowResult<Vec<T>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = HypoflowResult<T>>,
{
    let mut pending: FuturesUnordered<Fut> = items.into_iter().map(unit).collect();
    debug!(units = pending.len(), "Fanning out (settle order)");

    let mut settled = Vec::with_capacity(pending.len());
    while let Some(result) = pending.next().await {
        settled.push(result?);
    }
    Ok(settled)
}
