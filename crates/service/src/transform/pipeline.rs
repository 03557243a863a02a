use std::panic::{self, AssertUnwindSafe};

use models::{OperationRef, TransformConfig, TransformSpec};
use serde_json::Value;
use tracing::warn;

use super::ResponseTransformer;
use crate::observability::TRANSFORM_FAILURES_TOTAL;

/// Ordered transform steps. Output of step `i` feeds step `i + 1`; a step that
/// fails is skipped and the last good value carries on.
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    steps: Vec<ResponseTransformer>,
}

impl TransformPipeline {
    pub fn new(configs: Vec<TransformConfig>) -> Self {
        Self { steps: configs.into_iter().map(ResponseTransformer::new).collect() }
    }

    pub fn from_spec(spec: &TransformSpec) -> Self {
        Self::new(spec.steps())
    }

    /// Pipeline for an operation's `transform` field, if it declares one.
    pub fn from_operation(op: OperationRef<'_>) -> Option<Self> {
        op.transform().map(Self::from_spec)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn transform(&self, data: Value) -> Value {
        if self.steps.is_empty() {
            return data;
        }
        let mut current = data;
        for (index, step) in self.steps.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| step.apply(&current)));
            match outcome {
                Ok(Ok(next)) => current = next,
                Ok(Err(e)) => {
                    TRANSFORM_FAILURES_TOTAL.inc();
                    warn!(step = index, error = %e, "transform step failed; keeping previous value");
                }
                Err(_) => {
                    TRANSFORM_FAILURES_TOTAL.inc();
                    warn!(step = index, "transform step panicked; keeping previous value");
                }
            }
        }
        current
    }
}
