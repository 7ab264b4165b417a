use crate::core::blueprint::CallbackBlueprint;
use crate::core::error::AppError;
use crate::core::invocation::BoxedHandler;
use crate::core::transform::CallbackTransform;
use crate::core::types::Role;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Registers Trigger dependencies as plain Inputs for triggering purposes and
/// strips their values from the argument list before the handler runs.
pub struct TriggerTransform;

impl TriggerTransform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TriggerTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackTransform for TriggerTransform {
    fn name(&self) -> &'static str {
        "TriggerTransform"
    }

    fn apply(&self, mut blueprint: CallbackBlueprint) -> Result<CallbackBlueprint, AppError> {
        for spec in blueprint.inputs.iter_mut() {
            if spec.role() == Role::Trigger {
                spec.set_role(Role::Input);
            }
        }
        Ok(blueprint)
    }

    fn wrap(&self, declared: &CallbackBlueprint, handler: BoxedHandler) -> BoxedHandler {
        let stripped = declared.trigger_positions();
        if stripped.is_empty() {
            return handler;
        }
        Arc::new(move |mut ctx| {
            let inner = handler.clone();
            let stripped = stripped.clone();
            Box::pin(async move {
                // Positions are ascending, so binary_search doubles as a
                // membership test.
                ctx.args = ctx
                    .args
                    .into_iter()
                    .enumerate()
                    .filter(|(index, _)| stripped.binary_search(index).is_err())
                    .map(|(_, value)| value)
                    .collect();
                ctx.changed = ctx
                    .changed
                    .iter()
                    .copied()
                    .filter(|index| stripped.binary_search(index).is_err())
                    .map(|index| index - stripped.iter().filter(|&&s| s < index).count())
                    .collect::<BTreeSet<_>>();
                inner(ctx).await
            })
        })
    }
}
