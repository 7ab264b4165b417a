use crate::core::dependency::{DependencyItem, DependencySpec};
use crate::core::error::AppError;
use crate::core::invocation::BoxedHandler;
use crate::core::types::{ErrorCategory, Role};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

/// Free-form keyword options attached to one declaration. Transforms consume
/// the keys they understand (`log`, `blocking`, ...); unknown keys are kept
/// verbatim. Insertion order is preserved.
pub type CallbackOptions = IndexMap<String, Value>;

/// One declared callback prior to registration: classified dependency lists,
/// the handler, and the declaration's options.
#[derive(Clone)]
pub struct CallbackBlueprint {
    /// Stable per-process identity, assigned at declaration. Lock tables and
    /// cache keys are keyed by it, so re-resolving must not change it.
    pub id: String,
    pub outputs: Vec<DependencySpec>,
    pub inputs: Vec<DependencySpec>,
    pub handler: Option<BoxedHandler>,
    pub options: CallbackOptions,
    pub clientside_source: Option<String>,
}

impl CallbackBlueprint {
    /// Collect a server-side declaration from a heterogeneous dependency list.
    pub fn new<I>(deps: I, options: CallbackOptions, handler: BoxedHandler) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = DependencyItem>,
    {
        let (outputs, inputs) = Self::collect(deps)?;
        Ok(CallbackBlueprint {
            id: format!("cb-{}", Uuid::new_v4().simple()),
            outputs,
            inputs,
            handler: Some(handler),
            options,
            clientside_source: None,
        })
    }

    /// Collect a client-evaluated declaration; the handler is source text
    /// dispatched by the browser, so there is nothing to wrap server-side.
    pub fn clientside<I, S>(source: S, deps: I, options: CallbackOptions) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = DependencyItem>,
        S: Into<String>,
    {
        let (outputs, inputs) = Self::collect(deps)?;
        Ok(CallbackBlueprint {
            id: format!("cb-{}", Uuid::new_v4().simple()),
            outputs,
            inputs,
            handler: None,
            options,
            clientside_source: Some(source.into()),
        })
    }

    /// Flatten single specs and spec lists, classifying each element purely by
    /// its role tag. Output-role elements land in `outputs` in encountered
    /// order; everything else lands in `inputs` in encountered order, with
    /// interleaving across roles preserved.
    fn collect<I>(deps: I) -> Result<(Vec<DependencySpec>, Vec<DependencySpec>), AppError>
    where
        I: IntoIterator<Item = DependencyItem>,
    {
        let mut outputs = Vec::new();
        let mut inputs = Vec::new();
        for item in deps {
            for spec in item.into_specs() {
                spec.validate()?;
                if spec.role().is_output() {
                    outputs.push(spec);
                } else {
                    inputs.push(spec);
                }
            }
        }

        let mut seen = HashSet::new();
        for spec in &outputs {
            if !seen.insert(spec.target()) {
                return Err(AppError::new(
                    ErrorCategory::ValidationError,
                    format!("duplicate output target {} within a single callback", spec),
                )
                .with_code("CBK-SPEC-003"));
            }
        }

        if !inputs.iter().any(|spec| spec.role().fires()) {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "a callback requires at least one Input or Trigger dependency",
            )
            .with_code("CBK-SPEC-002"));
        }

        Ok((outputs, inputs))
    }

    pub fn is_clientside(&self) -> bool {
        self.clientside_source.is_some()
    }

    /// Whether the given option key is set to a truthy value.
    pub fn option_flag(&self, key: &str) -> bool {
        self.options.get(key).map(is_truthy).unwrap_or(false)
    }

    /// Input positions declared with the Trigger role.
    pub fn trigger_positions(&self) -> Vec<usize> {
        self.inputs
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.role() == Role::Trigger)
            .map(|(index, _)| index)
            .collect()
    }

    /// Output slot targets, in declared order.
    pub fn output_targets(&self) -> Vec<(String, String)> {
        self.outputs.iter().map(DependencySpec::target).collect()
    }

    /// Short description used in resolution diagnostics.
    pub fn summary(&self) -> String {
        let outputs = self
            .outputs
            .iter()
            .map(|spec| spec.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} [{}]", self.id, outputs)
    }
}

impl std::fmt::Debug for CallbackBlueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackBlueprint")
            .field("id", &self.id)
            .field("outputs", &self.outputs)
            .field("inputs", &self.inputs)
            .field("options", &self.options)
            .field("clientside_source", &self.clientside_source)
            .finish()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => {
            if let Some(i) = number.as_i64() {
                i != 0
            } else if let Some(u) = number.as_u64() {
                u != 0
            } else if let Some(f) = number.as_f64() {
                f != 0.0
            } else {
                false
            }
        }
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
