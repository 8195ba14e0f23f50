//! Reference host for the step orchestrator.
//!
//! [`HostRunner`] persists the task state between calls, gives every run its
//! own directory under the work directory and every step its own output file
//! there, runs each command, and moves the final MP4 into place.

use std::path::{Path, PathBuf};
use std::time::Duration;

use doviconvert_av::{CommandSpec, StepOrchestrator, TaskState};
use doviconvert_common::{Error, Result};
use doviconvert_tools::ToolLocator;
use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::command::ToolCommand;

/// Result of a finished conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub commands: Vec<CommandSpec>,
    /// Directory holding the step outputs, when they were kept.
    pub intermediates: Option<PathBuf>,
}

pub struct HostRunner<L> {
    orchestrator: StepOrchestrator<L>,
    work_dir: PathBuf,
    keep_intermediates: bool,
    step_timeout: Option<Duration>,
}

impl<L: ToolLocator> HostRunner<L> {
    pub fn new(orchestrator: StepOrchestrator<L>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator,
            work_dir: work_dir.into(),
            keep_intermediates: false,
            step_timeout: None,
        }
    }

    pub fn keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    pub fn step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn orchestrator(&self) -> &StepOrchestrator<L> {
        &self.orchestrator
    }

    /// Fresh directory for one run, so no step ever sees another run's files.
    async fn run_dir(&self, stem: &str) -> Result<TempDir> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}.", stem))
            .tempdir_in(&self.work_dir)?;
        Ok(dir)
    }

    /// Commands a conversion of `source` would run, without running them.
    ///
    /// The paths point into a run directory that is removed again before
    /// this returns.
    pub async fn plan(&self, source: &Path) -> Result<Vec<CommandSpec>> {
        let stem = file_stem(source)?;
        let run_dir = self.run_dir(&stem).await?;

        let mut commands = Vec::new();
        self.drive(source, &stem, run_dir.path(), |command| {
            commands.push(command.clone());
            async { Ok::<(), Error>(()) }
        })
        .await?;
        Ok(commands)
    }

    /// Convert `source`, writing the profile 8.1 file to `output`.
    pub async fn convert(&self, source: &Path, output: &Path) -> Result<ConversionReport> {
        if !source.is_file() {
            return Err(Error::config(format!(
                "Input file does not exist: {}",
                source.display()
            )));
        }

        let stem = file_stem(source)?;
        let run_dir = self.run_dir(&stem).await?;
        debug!("Working in {:?}", run_dir.path());

        let mut commands = Vec::new();
        let timeout = self.step_timeout;
        let result = self
            .drive(source, &stem, run_dir.path(), |command| {
                commands.push(command.clone());
                let mut tool = ToolCommand::from_spec(command);
                tool.timeout(timeout);
                async move {
                    let out = tool.execute().await?;
                    debug!("{}", out.stderr.trim());
                    Ok(())
                }
            })
            .await;

        let produced = match result {
            Ok(outputs) => outputs,
            Err(e) => {
                if self.keep_intermediates {
                    let kept = run_dir.keep();
                    warn!("Keeping intermediates of failed run in {:?}", kept);
                }
                return Err(e);
            }
        };

        let last = match produced.last() {
            Some(last) => last,
            None => return Err(Error::config("conversion produced no output")),
        };

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        move_file(last, output).await?;

        let intermediates = if self.keep_intermediates {
            Some(run_dir.keep())
        } else {
            None
        };

        info!("Converted {} -> {}", source.display(), output.display());

        Ok(ConversionReport {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            commands,
            intermediates,
        })
    }

    /// Run the orchestrator to completion, handing every command to `run`.
    ///
    /// Every step writes `<run_dir>/<stem>.step<N>.<ext>`. Returns the output
    /// path of every step.
    async fn drive<F, Fut>(
        &self,
        source: &Path,
        stem: &str,
        run_dir: &Path,
        mut run: F,
    ) -> Result<Vec<PathBuf>>
    where
        F: FnMut(&CommandSpec) -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let mut outputs = Vec::new();
        let mut state = TaskState::new(source, PathBuf::new());

        loop {
            // The extension is a placeholder; the orchestrator substitutes the real one.
            state.file_path_out = run_dir.join(format!("{}.step{}.out", stem, state.step + 1));

            let (mut next, command) = self.orchestrator.advance(state).await?;

            outputs.push(next.file_path_out.clone());
            run(&command).await?;

            next.file_path_in = next.file_path_out.clone();
            state = next;
            if !state.repeat {
                break;
            }
        }

        Ok(outputs)
    }
}

fn file_stem(source: &Path) -> Result<String> {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| Error::config(format!("Not a file path: {}", source.display())))
}

/// Default destination: the source with an `.mp4` extension, or
/// `<stem>.dv81.mp4` when the source already is an MP4.
pub fn default_output(source: &Path) -> PathBuf {
    let candidate = source.with_extension("mp4");
    if candidate != source {
        return candidate;
    }
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{}.dv81.mp4", stem))
}

async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    // Cross-device moves fall back to copy and delete.
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await?;
    Ok(())
}
