use crate::core::blueprint::CallbackBlueprint;
use crate::core::component::HiddenComponent;
use crate::core::dependency::output;
use crate::core::error::AppError;
use crate::core::invocation::{BoxedHandler, OutputUpdate};
use crate::core::transform::CallbackTransform;
use serde_json::Value;
use std::sync::Arc;

/// Placeholder component shared by every no-output callback in the process.
/// Nothing reads its value, so sharing one placeholder keeps the rendered
/// tree clean.
pub(crate) const PLACEHOLDER_ID: &str = "null-sink";
pub(crate) const PLACEHOLDER_PROPERTY: &str = "children";

/// Gives side-effect-only callbacks the single Output the host engine
/// requires, discarding whatever the handler returns.
///
/// Register it before transforms that append outputs of their own (logging),
/// so its wrapper sits innermost and only the handler's result is discarded.
pub struct NoOutputTransform;

impl NoOutputTransform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOutputTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackTransform for NoOutputTransform {
    fn name(&self) -> &'static str {
        "NoOutputTransform"
    }

    fn apply(&self, mut blueprint: CallbackBlueprint) -> Result<CallbackBlueprint, AppError> {
        if blueprint.outputs.is_empty() {
            blueprint
                .outputs
                .push(output(PLACEHOLDER_ID, PLACEHOLDER_PROPERTY));
        }
        Ok(blueprint)
    }

    fn wrap(&self, declared: &CallbackBlueprint, handler: BoxedHandler) -> BoxedHandler {
        if !declared.outputs.is_empty() {
            return handler;
        }
        Arc::new(move |ctx| {
            let inner = handler.clone();
            Box::pin(async move {
                inner(ctx).await?;
                Ok(vec![OutputUpdate::Set(Value::Null)])
            })
        })
    }

    fn hidden_components(&self) -> Vec<HiddenComponent> {
        vec![HiddenComponent::new(PLACEHOLDER_ID, PLACEHOLDER_PROPERTY)]
    }
}
