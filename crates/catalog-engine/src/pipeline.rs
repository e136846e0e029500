//! Pipeline builder and runner.
//!
//! A [`Pipeline`] is assembled stage by stage and then frozen by
//! [`Pipeline::build`] into a [`BuiltPipeline`]. The built pipeline keeps its
//! own copy of the initial table, so every run starts from the same data and
//! the caller's table is never touched.

use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span};

use catalog_model::Table;

use crate::error::{EngineError, Result};
use crate::stage::Stage;

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unbuilt,
    Built,
    Running,
    Done,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Unbuilt => "UNBUILT",
            PipelineState::Built => "BUILT",
            PipelineState::Running => "RUNNING",
            PipelineState::Done => "DONE",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline under construction.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<Stage>,
    data: Option<Table>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            data: None,
        }
    }

    /// Seed the pipeline with a copy of `data`.
    pub fn with_data(mut self, data: &Table) -> Self {
        self.data = Some(data.clone());
        self
    }

    pub fn add_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::Unbuilt
    }

    /// Freeze the stage list.
    pub fn build(self) -> BuiltPipeline {
        BuiltPipeline {
            name: self.name,
            stages: self.stages.into(),
            initial: self.data,
            state: PipelineState::Built,
        }
    }
}

/// Frozen, runnable pipeline.
#[derive(Debug, Clone)]
pub struct BuiltPipeline {
    name: String,
    stages: Arc<[Stage]>,
    initial: Option<Table>,
    state: PipelineState,
}

impl BuiltPipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run every stage in order on a fresh copy of the initial table.
    ///
    /// The first failing step aborts the run and nothing is returned. A
    /// failed run leaves the pipeline in [`PipelineState::Built`].
    pub fn run(&mut self) -> Result<Table> {
        let span = info_span!("pipeline", pipeline = %self.name);
        let _guard = span.enter();
        let start = Instant::now();
        info!(stages = self.stages.len(), "pipeline started");

        self.state = PipelineState::Running;
        let stages = Arc::clone(&self.stages);
        let mut data = self.initial.clone();
        for stage in stages.iter() {
            data = match stage.run(data) {
                Ok(data) => data,
                Err(err) => {
                    self.state = PipelineState::Built;
                    return Err(err);
                }
            };
        }

        let Some(table) = data else {
            self.state = PipelineState::Built;
            return Err(EngineError::EmptyPipeline {
                pipeline: self.name.clone(),
            });
        };
        self.state = PipelineState::Done;
        info!(
            rows = table.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline finished"
        );
        Ok(table)
    }

    /// Human-readable listing of stages and steps.
    pub fn render_plan(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "pipeline {}", self.name);
        for stage in self.stages.iter() {
            let _ = writeln!(out, "  [{}] {}", stage.kind(), stage.name());
            for step in stage.steps() {
                let _ = writeln!(out, "    - {}: {}", step.name(), step.operation().describe());
            }
        }
        out
    }
}
