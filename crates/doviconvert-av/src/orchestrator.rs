//! Step-driven conversion state machine.
//!
//! The orchestrator keeps no memory between calls. The host persists a
//! [`TaskState`] per file, hands it back on every call, and runs the returned
//! command before calling again while `repeat` is set.

use std::path::PathBuf;

use doviconvert_common::{Error, Result};
use doviconvert_tools::{ToolCatalog, ToolLocator, ToolPaths};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::command::{build, CommandSpec, Step, FINAL_STEP};

/// Per-task state owned by the host across invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskState {
    /// Last step handed out; 0 before the first call.
    pub step: u32,
    pub file_path_in: PathBuf,
    pub file_path_out: PathBuf,
    pub original_file_path: PathBuf,
    /// Whether the host must invoke the orchestrator again.
    pub repeat: bool,
}

impl TaskState {
    /// Fresh state for converting `source` into `output`.
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let source = source.into();
        Self {
            step: 0,
            file_path_in: source.clone(),
            file_path_out: output.into(),
            original_file_path: source,
            repeat: false,
        }
    }

    /// True once the final step has been handed out.
    pub fn is_complete(&self) -> bool {
        self.step >= FINAL_STEP && !self.repeat
    }

    fn next_step(&self) -> Result<Step> {
        let next = self.step.saturating_add(1);
        if next > FINAL_STEP {
            return Err(Error::InvalidStep {
                step: next,
                final_step: FINAL_STEP,
            });
        }
        Step::from_number(next)
    }
}

/// Advance `state` by one step using already resolved tool paths.
///
/// Returns the updated state and the command for the new step. The input
/// state is consumed; on error nothing is returned so the host's persisted
/// copy stays as it was.
pub fn advance_with(mut state: TaskState, tools: &ToolPaths) -> Result<(TaskState, CommandSpec)> {
    let step = state.next_step()?;

    let command = build(
        step.number(),
        &state.file_path_in,
        &state.file_path_out,
        &state.original_file_path,
        tools,
    )?;

    state.step = step.number();
    state.repeat = state.step < FINAL_STEP;
    state.file_path_out = step.output_path(&state.file_path_out);

    Ok((state, command))
}

/// Drives [`TaskState`] through the pipeline, provisioning tools on demand.
pub struct StepOrchestrator<L> {
    locator: L,
    catalog: ToolCatalog,
}

impl<L: ToolLocator> StepOrchestrator<L> {
    pub fn new(locator: L, catalog: ToolCatalog) -> Self {
        Self { locator, catalog }
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Ensure every tool is available, then advance `state` by one step.
    ///
    /// A task already past its final step is rejected before any tool is
    /// provisioned.
    pub async fn advance(&self, state: TaskState) -> Result<(TaskState, CommandSpec)> {
        let step = state.next_step()?;
        let tools = self.locator.locate_all(&self.catalog).await?;

        let (state, command) = advance_with(state, &tools)?;
        info!(
            "Task {}: {} -> {}",
            state.original_file_path.display(),
            step,
            state.file_path_out.display()
        );
        Ok((state, command))
    }
}
