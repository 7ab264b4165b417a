#![allow(clippy::result_large_err)] // Transform contract returns AppError for structured diagnostics.

use crate::core::blueprint::CallbackBlueprint;
use crate::core::component::HiddenComponent;
use crate::core::error::AppError;
use crate::core::invocation::BoxedHandler;

mod blocking;
mod log;
mod multiplexer;
mod no_output;
mod prefix;
mod serverside;
mod trigger;

pub use blocking::BlockingCallbackTransform;
pub use log::LogTransform;
pub use multiplexer::MultiplexerTransform;
pub use no_output::NoOutputTransform;
pub use prefix::PrefixIdTransform;
pub use serverside::ServersideOutputTransform;
pub use trigger::TriggerTransform;

/// Composable rewrite applied to callback blueprints during resolution.
///
/// Three extension points, all optional: a per-blueprint rewrite run before
/// registration, a cross-blueprint rewrite run once over the full set, and an
/// invocation wrapper composed around the handler. Wrappers receive the
/// blueprint as declared, before any rewrite touched it, so they can reason
/// about original roles, option flags, and output slots.
pub trait CallbackTransform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Per-blueprint rewrite, run in transform order for every pending
    /// blueprint.
    fn apply(&self, blueprint: CallbackBlueprint) -> Result<CallbackBlueprint, AppError> {
        Ok(blueprint)
    }

    /// Cross-blueprint rewrite, run in transform order after every
    /// per-blueprint rewrite has finished. May add or redirect blueprints.
    fn apply_global(
        &self,
        blueprints: Vec<CallbackBlueprint>,
    ) -> Result<Vec<CallbackBlueprint>, AppError> {
        Ok(blueprints)
    }

    /// Wrap an invocation handler. Wraps compose in transform registration
    /// order, the first-registered transform sitting closest to the handler.
    fn wrap(&self, declared: &CallbackBlueprint, handler: BoxedHandler) -> BoxedHandler {
        let _ = declared;
        handler
    }

    /// Hidden components the host must mount for this transform's synthetic
    /// bindings. Recomputed on every resolution pass.
    fn hidden_components(&self) -> Vec<HiddenComponent> {
        Vec::new()
    }
}
