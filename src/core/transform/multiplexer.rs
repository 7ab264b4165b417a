use crate::core::blueprint::{CallbackBlueprint, CallbackOptions};
use crate::core::component::HiddenComponent;
use crate::core::dependency::{input, output, DependencyItem};
use crate::core::error::AppError;
use crate::core::invocation::{handler, InvocationContext, OutputUpdate};
use crate::core::transform::CallbackTransform;
use crate::core::types::ErrorCategory;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Mutex;

const STORE_PROPERTY: &str = "data";

fn intermediate_id(component: &str, property: &str, index: usize) -> String {
    format!("mux-{}-{}-{}", component, property, index)
}

/// Lets several independent callbacks target the same Output without
/// tripping the host engine's duplicate-output check.
///
/// Every contender is redirected to its own hidden intermediate store, and a
/// synthetic fan-in callback merges the intermediates back into the original
/// target. Arbitration is stateless: only the intermediate whose upstream
/// actually fired propagates a value, so the last genuine writer wins and
/// stale branches never overwrite it.
pub struct MultiplexerTransform {
    hidden: Mutex<Vec<HiddenComponent>>,
}

impl MultiplexerTransform {
    pub fn new() -> Self {
        MultiplexerTransform {
            hidden: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MultiplexerTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackTransform for MultiplexerTransform {
    fn name(&self) -> &'static str {
        "MultiplexerTransform"
    }

    fn apply_global(
        &self,
        mut blueprints: Vec<CallbackBlueprint>,
    ) -> Result<Vec<CallbackBlueprint>, AppError> {
        let mut hidden = self.hidden.lock().expect("hidden component list poisoned");
        hidden.clear();

        // Claim map: Output target -> every (blueprint, slot) writing it.
        let mut claims: IndexMap<(String, String), Vec<(usize, usize)>> = IndexMap::new();
        for (index, blueprint) in blueprints.iter().enumerate() {
            for (slot, spec) in blueprint.outputs.iter().enumerate() {
                claims.entry(spec.target()).or_default().push((index, slot));
            }
        }

        let mut fan_ins = Vec::new();
        for ((component, property), claimants) in claims {
            if claimants.len() < 2 {
                continue;
            }
            // Shared writes to the no-output placeholder are not contention:
            // nothing reads its value.
            if component == super::no_output::PLACEHOLDER_ID
                && property == super::no_output::PLACEHOLDER_PROPERTY
            {
                continue;
            }

            for &(index, _) in &claimants {
                let contender = &blueprints[index];
                let reads_target = contender
                    .inputs
                    .iter()
                    .any(|spec| spec.component_id() == component && spec.property() == property);
                if reads_target {
                    let summaries = claimants
                        .iter()
                        .map(|&(i, _)| blueprints[i].summary())
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(AppError::new(
                        ErrorCategory::ResolutionError,
                        format!(
                            "contended output {}.{} is also an input of contender {}, which would cycle through the fan-in (contenders: {})",
                            component, property, contender.id, summaries
                        ),
                    )
                    .with_code("CBK-MUX-001"));
                }
            }

            // Redirect each contender's contended slot to its own hidden
            // intermediate; uncontended slots of the same blueprint pass
            // through untouched.
            let mut intermediates = Vec::new();
            for (n, &(index, slot)) in claimants.iter().enumerate() {
                let store_id = intermediate_id(&component, &property, n);
                blueprints[index].outputs[slot].redirect_to(store_id.clone(), STORE_PROPERTY);
                hidden.push(HiddenComponent::new(store_id.clone(), STORE_PROPERTY));
                intermediates.push(store_id);
            }

            let mut deps: Vec<DependencyItem> =
                vec![output(component.clone(), property.clone()).into()];
            deps.extend(
                intermediates
                    .iter()
                    .map(|id| DependencyItem::from(input(id.clone(), STORE_PROPERTY))),
            );

            // Latest-declared fired branch wins; with no fired branch the
            // target is left alone.
            let fan_in_handler = handler(|ctx: InvocationContext| async move {
                match ctx.changed.iter().next_back().copied() {
                    Some(winner) => {
                        let value = ctx.args.get(winner).cloned().unwrap_or(Value::Null);
                        Ok(vec![OutputUpdate::Set(value)])
                    }
                    None => Ok(vec![OutputUpdate::NoChange]),
                }
            });
            fan_ins.push(CallbackBlueprint::new(
                deps,
                CallbackOptions::new(),
                fan_in_handler,
            )?);
        }

        blueprints.extend(fan_ins);
        Ok(blueprints)
    }

    fn hidden_components(&self) -> Vec<HiddenComponent> {
        self.hidden
            .lock()
            .expect("hidden component list poisoned")
            .clone()
    }
}
