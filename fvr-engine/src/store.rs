//! Published result table with single-writer rebuilds
//!
//! Readers take a cheap `Arc` clone of the current snapshot and never block a
//! rebuild for longer than that clone. A rebuild:
//! 1. Acquires the rebuild gate without waiting (busy → [`PipelineError::RebuildInProgress`])
//! 2. Loads the input file
//! 3. Runs the pipeline on a blocking worker thread
//! 4. Optionally exports the new table
//! 5. Publishes it with one pointer swap
//!
//! A failed rebuild leaves the previous snapshot in place.

use crate::error::PipelineError;
use crate::io::{export_table, load_observations};
use crate::model::RawObservation;
use crate::pipeline::Pipeline;
use crate::table::ResultTable;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{error, info};

/// Proof that the caller holds the rebuild gate; released on drop
pub struct RebuildGuard {
    _gate: OwnedMutexGuard<()>,
}

/// Shared handle to the current result table
#[derive(Clone)]
pub struct ResultStore {
    current: Arc<RwLock<Arc<ResultTable>>>,
    rebuild_gate: Arc<Mutex<()>>,
    last_error: Arc<RwLock<Option<String>>>,
    pipeline: Pipeline,
    input: PathBuf,
    output: Option<PathBuf>,
}

impl ResultStore {
    /// Store publishing an empty table until the first rebuild
    pub fn new(pipeline: Pipeline, input: PathBuf) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(ResultTable::empty()))),
            rebuild_gate: Arc::new(Mutex::new(())),
            last_error: Arc::new(RwLock::new(None)),
            pipeline,
            input,
            output: None,
        }
    }

    /// Also export every successfully rebuilt table to `path`
    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = Some(path);
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Arc<ResultTable> {
        self.current.read().await.clone()
    }

    /// Message of the most recent failed rebuild, cleared by a successful one
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Take the rebuild gate if no rebuild is running
    pub fn try_begin_rebuild(&self) -> Result<RebuildGuard, PipelineError> {
        self.rebuild_gate
            .clone()
            .try_lock_owned()
            .map(|gate| RebuildGuard { _gate: gate })
            .map_err(|_| PipelineError::RebuildInProgress)
    }

    /// Replace the published table, returning the previous one
    pub async fn publish(&self, table: Arc<ResultTable>) -> Arc<ResultTable> {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, table)
    }

    /// Reload the input file and rebuild the table
    pub async fn rebuild(&self) -> Result<Arc<ResultTable>, PipelineError> {
        let guard = self.try_begin_rebuild()?;
        let result = match load_observations(&self.input).await {
            Ok(observations) => self.rebuild_locked(&guard, observations).await,
            Err(e) => Err(e),
        };
        self.record(result).await
    }

    /// Rebuild from observations already in memory
    pub async fn rebuild_from(
        &self,
        observations: Vec<RawObservation>,
    ) -> Result<Arc<ResultTable>, PipelineError> {
        let guard = self.try_begin_rebuild()?;
        let result = self.rebuild_locked(&guard, observations).await;
        self.record(result).await
    }

    async fn rebuild_locked(
        &self,
        _guard: &RebuildGuard,
        observations: Vec<RawObservation>,
    ) -> Result<Arc<ResultTable>, PipelineError> {
        let pipeline = self.pipeline.clone();
        let table = tokio::task::spawn_blocking(move || pipeline.run(&observations))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??;

        if let Some(output) = &self.output {
            export_table(&table, output).await?;
        }

        let table = Arc::new(table);
        self.publish(table.clone()).await;
        info!(
            "Published result table {} ({} venues)",
            table.info().run_id,
            table.len()
        );
        Ok(table)
    }

    async fn record(
        &self,
        result: Result<Arc<ResultTable>, PipelineError>,
    ) -> Result<Arc<ResultTable>, PipelineError> {
        match &result {
            Ok(_) => *self.last_error.write().await = None,
            Err(e) => {
                error!("Rebuild failed, keeping previous table: {}", e);
                *self.last_error.write().await = Some(e.to_string());
            }
        }
        result
    }
}
