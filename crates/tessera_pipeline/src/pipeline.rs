//! Row-level worker pool.

use crate::{PipelineConfig, PluginRegistry, StepDriver, failure_message};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tessera_core::{Row, WorkItem};
use tessera_error::TesseraResult;
use tessera_interface::RuntimeServices;

/// What happened to one source row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Every step ran; `items` are the surviving work items (possibly none)
    Completed {
        /// Index of the source row
        original_index: usize,
        /// Surviving work items
        items: Vec<WorkItem>,
    },
    /// A step failed; the row's lineage was abandoned
    Failed {
        /// Index of the source row
        original_index: usize,
        /// Step that failed
        step: String,
        /// Failure message
        error: String,
    },
}

impl RowOutcome {
    /// Index of the source row.
    pub fn original_index(&self) -> usize {
        match self {
            RowOutcome::Completed { original_index, .. }
            | RowOutcome::Failed { original_index, .. } => *original_index,
        }
    }

    /// Whether every step ran.
    pub fn is_completed(&self) -> bool {
        matches!(self, RowOutcome::Completed { .. })
    }

    /// Surviving items; empty for failed rows.
    pub fn items(&self) -> &[WorkItem] {
        match self {
            RowOutcome::Completed { items, .. } => items,
            RowOutcome::Failed { .. } => &[],
        }
    }
}

/// Runs every step, in order, for each row, with up to `concurrency` rows in flight.
///
/// A failing row never affects its siblings.
#[derive(Debug)]
pub struct Pipeline {
    drivers: Vec<StepDriver>,
    concurrency: usize,
}

impl Pipeline {
    /// Build a pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a step references an unregistered plugin.
    #[tracing::instrument(skip_all, fields(steps = config.steps().len()))]
    pub fn new(
        config: &PipelineConfig,
        registry: Arc<PluginRegistry>,
        services: RuntimeServices,
    ) -> TesseraResult<Self> {
        let paths = config.output_paths();
        let drivers = config
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| {
                StepDriver::new(
                    index,
                    step.clone(),
                    config.model(),
                    registry.clone(),
                    services.clone(),
                    paths.clone(),
                )
            })
            .collect::<TesseraResult<Vec<_>>>()?;

        Ok(Self::from_drivers(drivers, *config.concurrency()))
    }

    /// Pipeline over prepared drivers.
    pub fn from_drivers(drivers: Vec<StepDriver>, concurrency: usize) -> Self {
        Self {
            drivers,
            concurrency: concurrency.max(1),
        }
    }

    /// Step drivers, in order.
    pub fn drivers(&self) -> &[StepDriver] {
        &self.drivers
    }

    /// Process every row. Outcomes are returned in row order.
    #[tracing::instrument(skip_all, fields(rows = rows.len(), concurrency = self.concurrency))]
    pub async fn run(&self, rows: Vec<Row>) -> Vec<RowOutcome> {
        let mut outcomes: Vec<RowOutcome> = stream::iter(rows.into_iter().enumerate())
            .map(|(index, row)| self.run_row(index, row))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        outcomes.sort_by_key(RowOutcome::original_index);

        let failed = outcomes.iter().filter(|o| !o.is_completed()).count();
        let produced: usize = outcomes.iter().map(|o| o.items().len()).sum();
        tracing::info!(
            succeeded = outcomes.len() - failed,
            failed,
            produced,
            "Pipeline finished"
        );
        outcomes
    }

    /// Run every step for a single row.
    #[tracing::instrument(skip(self, row), fields(row = index))]
    pub async fn run_row(&self, index: usize, row: Row) -> RowOutcome {
        let mut items = vec![WorkItem::new(index, row)];

        for driver in &self.drivers {
            if items.is_empty() {
                tracing::debug!(step = %driver.name(), "Lineage dropped; skipping remaining steps");
                break;
            }
            match driver.run(&items).await {
                Ok(next) => items = next,
                Err(e) => {
                    let error = failure_message(&e);
                    tracing::error!(step = %driver.name(), error = %error, "Row failed");
                    return RowOutcome::Failed {
                        original_index: index,
                        step: driver.name().to_string(),
                        error,
                    };
                }
            }
        }

        RowOutcome::Completed {
            original_index: index,
            items,
        }
    }
}
