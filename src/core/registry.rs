#![allow(clippy::result_large_err)] // Resolution driver returns AppError for structured diagnostics.

use crate::core::blueprint::{CallbackBlueprint, CallbackOptions};
use crate::core::component::HiddenComponent;
use crate::core::dependency::{DependencyItem, DependencySpec};
use crate::core::error::AppError;
use crate::core::invocation::BoxedHandler;
use crate::core::transform::CallbackTransform;
use crate::core::types::{ErrorCategory, Role};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info};

/// Final registration in the shape the host framework's native call accepts.
#[derive(Clone)]
pub struct Registration {
    pub outputs: Vec<DependencySpec>,
    pub inputs: Vec<DependencySpec>,
    pub handler: Option<BoxedHandler>,
    pub clientside_source: Option<String>,
}

impl Registration {
    pub fn is_clientside(&self) -> bool {
        self.clientside_source.is_some()
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("outputs", &self.outputs)
            .field("inputs", &self.inputs)
            .field("clientside_source", &self.clientside_source)
            .finish()
    }
}

/// Output of one resolution pass: host-ready registrations plus the hidden
/// components the active transforms need mounted.
#[derive(Debug)]
pub struct Resolution {
    pub registrations: Vec<Registration>,
    pub hidden_components: Vec<HiddenComponent>,
}

impl Resolution {
    /// Look up the registration writing the given output target.
    pub fn find(&self, component_id: &str, property: &str) -> Option<&Registration> {
        self.registrations.iter().find(|registration| {
            registration
                .outputs
                .iter()
                .any(|spec| spec.component_id() == component_id && spec.property() == property)
        })
    }
}

/// Registration surface of the host framework. `install` drives all three
/// calls after resolution; everything behind them is out of scope here.
pub trait CallbackHost {
    fn register_callback(&mut self, registration: Registration) -> Result<(), AppError>;
    fn register_clientside_callback(
        &mut self,
        source: &str,
        outputs: &[DependencySpec],
        inputs: &[DependencySpec],
    ) -> Result<(), AppError>;
    fn mount_hidden_component(&mut self, component: &HiddenComponent) -> Result<(), AppError>;
}

struct RegistryState {
    pending: Vec<CallbackBlueprint>,
    transforms: Vec<Arc<dyn CallbackTransform>>,
}

/// Ordered collection of pending blueprints plus the active transform chain.
///
/// Declarations use the same call shape as the host framework's native
/// registration, so the registry is a drop-in. Resolution is a pure function
/// of `(pending, transforms)`: it operates on clones of the pending set and
/// may therefore run any number of times without accumulating synthetic
/// outputs or extra wraps.
pub struct BlueprintRegistry {
    state: Mutex<RegistryState>,
}

impl BlueprintRegistry {
    pub fn new() -> Self {
        Self::with_transforms(Vec::new())
    }

    pub fn with_transforms(transforms: Vec<Arc<dyn CallbackTransform>>) -> Self {
        BlueprintRegistry {
            state: Mutex::new(RegistryState {
                pending: Vec::new(),
                transforms,
            }),
        }
    }

    /// Append a transform to the chain. Order matters: rewrites run in
    /// registration order and wraps compose with the first transform
    /// innermost.
    pub fn add_transform(&self, transform: Arc<dyn CallbackTransform>) {
        self.state
            .lock()
            .expect("registry state poisoned")
            .transforms
            .push(transform);
    }

    /// Declare a server-side callback. Returns the blueprint's identity.
    pub fn callback<I>(
        &self,
        deps: I,
        options: CallbackOptions,
        handler: BoxedHandler,
    ) -> Result<String, AppError>
    where
        I: IntoIterator<Item = DependencyItem>,
    {
        let blueprint = CallbackBlueprint::new(deps, options, handler)?;
        let id = blueprint.id.clone();
        self.state
            .lock()
            .expect("registry state poisoned")
            .pending
            .push(blueprint);
        Ok(id)
    }

    /// Declare a client-evaluated callback from source text.
    pub fn clientside_callback<I, S>(&self, source: S, deps: I) -> Result<String, AppError>
    where
        I: IntoIterator<Item = DependencyItem>,
        S: Into<String>,
    {
        let blueprint = CallbackBlueprint::clientside(source, deps, CallbackOptions::new())?;
        let id = blueprint.id.clone();
        self.state
            .lock()
            .expect("registry state poisoned")
            .pending
            .push(blueprint);
        Ok(id)
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().expect("registry state poisoned").pending.len()
    }

    /// Drop all pending declarations. Intended for tests isolating the
    /// process-wide default registry.
    pub fn clear(&self) {
        self.state
            .lock()
            .expect("registry state poisoned")
            .pending
            .clear();
    }

    /// Run the resolution pass: per-blueprint rewrites in transform order,
    /// then global rewrites in transform order, then wrap composition, then
    /// emission checks.
    pub fn resolve(&self) -> Result<Resolution, AppError> {
        let (pending, transforms) = {
            let state = self.state.lock().expect("registry state poisoned");
            (state.pending.clone(), state.transforms.clone())
        };
        debug!(
            pending = pending.len(),
            transforms = transforms.len(),
            "resolving callback blueprints"
        );

        // Wrappers reason about blueprints as declared, so snapshot them
        // before any rewrite runs.
        let declared: HashMap<String, CallbackBlueprint> = pending
            .iter()
            .map(|blueprint| (blueprint.id.clone(), blueprint.clone()))
            .collect();

        let mut current = pending;
        for transform in &transforms {
            debug!(transform = transform.name(), "applying blueprint rewrites");
            current = current
                .into_iter()
                .map(|blueprint| transform.apply(blueprint))
                .collect::<Result<Vec<_>, _>>()?;
        }
        for transform in &transforms {
            debug!(transform = transform.name(), "applying global rewrite");
            current = transform.apply_global(current)?;
        }

        let mut registrations = Vec::with_capacity(current.len());
        for blueprint in current {
            if let Some(spec) = blueprint
                .inputs
                .iter()
                .find(|spec| spec.role() == Role::Trigger)
            {
                return Err(AppError::new(
                    ErrorCategory::ResolutionError,
                    format!(
                        "{} declared on callback '{}' but no trigger-stripping transform is active; its value would reach the handler",
                        spec, blueprint.id
                    ),
                )
                .with_code("CBK-TRG-001"));
            }

            let handler = match blueprint.handler.clone() {
                Some(mut handler) if !blueprint.is_clientside() => {
                    let reference = declared.get(&blueprint.id).unwrap_or(&blueprint);
                    for transform in &transforms {
                        handler = transform.wrap(reference, handler);
                    }
                    Some(handler)
                }
                other => other,
            };

            registrations.push(Registration {
                outputs: blueprint.outputs,
                inputs: blueprint.inputs,
                handler,
                clientside_source: blueprint.clientside_source,
            });
        }

        let mut hidden_components = Vec::new();
        let mut seen = HashSet::new();
        for transform in &transforms {
            for component in transform.hidden_components() {
                if seen.insert(component.clone()) {
                    hidden_components.push(component);
                }
            }
        }

        info!(
            registrations = registrations.len(),
            hidden = hidden_components.len(),
            "resolved callback blueprints"
        );
        Ok(Resolution {
            registrations,
            hidden_components,
        })
    }

    /// Resolve and hand the result to the host framework.
    pub fn install(&self, host: &mut dyn CallbackHost) -> Result<(), AppError> {
        let resolution = self.resolve()?;
        for component in &resolution.hidden_components {
            host.mount_hidden_component(component)?;
        }
        for registration in resolution.registrations {
            match registration.clientside_source.clone() {
                Some(source) => host.register_clientside_callback(
                    &source,
                    &registration.outputs,
                    &registration.inputs,
                )?,
                None => host.register_callback(registration)?,
            }
        }
        Ok(())
    }
}

impl Default for BlueprintRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_REGISTRY: OnceLock<BlueprintRegistry> = OnceLock::new();

/// Process-wide registry backing module-level declarations made without an
/// explicit app instance. Constructed on first use; callers needing isolation
/// build their own `BlueprintRegistry`.
pub fn default_registry() -> &'static BlueprintRegistry {
    DEFAULT_REGISTRY.get_or_init(BlueprintRegistry::new)
}

/// Declare a server-side callback against the default registry.
pub fn callback<I>(
    deps: I,
    options: CallbackOptions,
    handler: BoxedHandler,
) -> Result<String, AppError>
where
    I: IntoIterator<Item = DependencyItem>,
{
    default_registry().callback(deps, options, handler)
}

/// Declare a client-evaluated callback against the default registry.
pub fn clientside_callback<I, S>(source: S, deps: I) -> Result<String, AppError>
where
    I: IntoIterator<Item = DependencyItem>,
    S: Into<String>,
{
    default_registry().clientside_callback(source, deps)
}
