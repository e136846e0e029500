//! Ordered groups of steps sharing one purpose.

use tracing::{debug, debug_span};

use catalog_model::{StageKind, Table};

use crate::error::Result;
use crate::step::Step;

#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    kind: StageKind,
    steps: Vec<Step>,
}

impl Stage {
    pub fn new(name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            steps: Vec::new(),
        }
    }

    pub fn add_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Thread `data` through every step in order. A stage without steps
    /// passes its input through.
    pub fn run(&self, data: Option<Table>) -> Result<Option<Table>> {
        let span = debug_span!("stage", stage = %self.name, kind = %self.kind);
        let _guard = span.enter();
        debug!(steps = self.steps.len(), "stage started");

        let mut data = data;
        for step in &self.steps {
            data = Some(step.run(data)?);
        }

        debug!(rows = data.as_ref().map(Table::height), "stage finished");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Operation, RenameArgs, SelectArgs};
    use catalog_model::Value;

    #[test]
    fn test_steps_run_in_order() {
        let stage = Stage::new("reshape", StageKind::Rename)
            .add_step(Step::new(
                "rename",
                Operation::Rename(RenameArgs::new([("a", "b")])),
            ))
            .add_step(Step::new("select", Operation::Select(SelectArgs::new(["b"]))));
        let table = Table::from_rows(["a", "c"], vec![vec![Value::from(1), Value::from(2)]]).unwrap();

        let out = stage.run(Some(table)).unwrap().unwrap();
        assert_eq!(out.columns(), ["b"]);
        assert_eq!(stage.steps().len(), 2);
    }

    #[test]
    fn test_empty_stage_passes_through() {
        let stage = Stage::new("noop", StageKind::Filter);
        assert!(stage.run(None).unwrap().is_none());
    }
}
