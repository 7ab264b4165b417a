use crate::core::blueprint::CallbackBlueprint;
use crate::core::error::AppError;
use crate::core::transform::CallbackTransform;

/// Namespaces every component id a blueprint touches so independently built
/// sub-applications compose into one tree without id collisions.
///
/// Register this transform first: later transforms read `component_ref` as a
/// literal and must see the namespaced form.
pub struct PrefixIdTransform {
    prefix: String,
}

impl PrefixIdTransform {
    pub fn new<T: Into<String>>(prefix: T) -> Self {
        PrefixIdTransform {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl CallbackTransform for PrefixIdTransform {
    fn name(&self) -> &'static str {
        "PrefixIdTransform"
    }

    fn apply(&self, mut blueprint: CallbackBlueprint) -> Result<CallbackBlueprint, AppError> {
        for spec in blueprint.outputs.iter_mut().chain(blueprint.inputs.iter_mut()) {
            spec.apply_prefix(&self.prefix);
        }
        Ok(blueprint)
    }
}
