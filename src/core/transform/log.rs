use crate::core::blueprint::CallbackBlueprint;
use crate::core::component::HiddenComponent;
use crate::core::dependency::output;
use crate::core::error::AppError;
use crate::core::invocation::{BoxedHandler, CallbackLogger, OutputUpdate};
use crate::core::transform::CallbackTransform;
use serde_json::Value;
use std::sync::Arc;

/// Routes per-invocation log records to a sink component without the handler
/// wiring an output itself. Callbacks opt in with the `log` option; the
/// wrapper hands them a fresh buffering logger through the invocation context
/// and appends the rendered text as an extra result.
pub struct LogTransform {
    sink: HiddenComponent,
}

impl LogTransform {
    pub fn new() -> Self {
        LogTransform {
            sink: HiddenComponent::new("log", "children"),
        }
    }

    /// Route rendered log text to a different component property.
    pub fn with_sink<I: Into<String>, P: Into<String>>(id: I, property: P) -> Self {
        LogTransform {
            sink: HiddenComponent::new(id, property),
        }
    }
}

impl Default for LogTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackTransform for LogTransform {
    fn name(&self) -> &'static str {
        "LogTransform"
    }

    fn apply(&self, mut blueprint: CallbackBlueprint) -> Result<CallbackBlueprint, AppError> {
        if blueprint.option_flag("log") {
            blueprint
                .outputs
                .push(output(self.sink.id.clone(), self.sink.property.clone()));
        }
        Ok(blueprint)
    }

    fn wrap(&self, declared: &CallbackBlueprint, handler: BoxedHandler) -> BoxedHandler {
        if !declared.option_flag("log") {
            return handler;
        }
        Arc::new(move |mut ctx| {
            let inner = handler.clone();
            Box::pin(async move {
                let logger = CallbackLogger::new();
                ctx.logger = Some(logger.clone());
                // The buffer lives only for this call; it drops on every exit
                // path, handler failure included.
                let mut updates = inner(ctx).await?;
                updates.push(OutputUpdate::Set(Value::String(logger.render())));
                Ok(updates)
            })
        })
    }

    fn hidden_components(&self) -> Vec<HiddenComponent> {
        vec![self.sink.clone()]
    }
}
