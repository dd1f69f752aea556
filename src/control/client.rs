// src/control/client.rs

//! Query client abstraction.

use std::time::Duration;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;

use crate::types::ResultRow;
use crate::workspace::ControlDefinition;

use super::BoxFuture;

/// Runs the query behind a control and returns its rows.
pub trait QueryClient: Send + Sync {
    fn execute_control<'a>(
        &'a self,
        control: &'a ControlDefinition,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<ResultRow>>>;
}

/// Client that serves the rows declared in config.
///
/// A control with `error = "..."` fails its query with that message. An
/// optional latency simulates a slow backend and honours cancellation.
#[derive(Debug, Clone, Default)]
pub struct StaticClient {
    latency: Option<Duration>,
}

impl StaticClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
        }
    }
}

impl QueryClient for StaticClient {
    fn execute_control<'a>(
        &'a self,
        control: &'a ControlDefinition,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Vec<ResultRow>>> {
        Box::pin(async move {
            if let Some(latency) = self.latency {
                tokio::select! {
                    _ = cancel.cancelled() => bail!("query for '{}' cancelled", control.name),
                    _ = tokio::time::sleep(latency) => {}
                }
            }

            if let Some(message) = &control.error {
                bail!("query for '{}' failed: {}", control.name, message);
            }

            Ok(control.rows.clone())
        })
    }
}
