//! A named, executable unit binding one operation to its arguments.

use tracing::{debug, debug_span};

use catalog_model::Table;

use crate::error::{EngineError, Result};
use crate::ops::Operation;

#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    operation: Operation,
}

impl Step {
    pub fn new(name: impl Into<String>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            operation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Run the step.
    ///
    /// Load steps must receive no table; every other step must receive the
    /// table produced upstream.
    pub fn run(&self, input: Option<Table>) -> Result<Table> {
        let span = debug_span!("step", step = %self.name, op = self.operation.as_str());
        let _guard = span.enter();

        let rows_in = input.as_ref().map(Table::height);
        let output = match (input, self.operation.is_load()) {
            (None, true) => self.operation.load(&self.name)?,
            (Some(_), true) => {
                return Err(EngineError::UnexpectedInput {
                    step: self.name.clone(),
                });
            }
            (None, false) => {
                return Err(EngineError::MissingInput {
                    step: self.name.clone(),
                });
            }
            (Some(table), false) => self.operation.apply(&self.name, table)?,
        };
        debug!(rows_in = ?rows_in, rows_out = output.height(), "step finished");
        Ok(output)
    }
}
