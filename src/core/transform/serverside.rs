use crate::core::blueprint::CallbackBlueprint;
use crate::core::error::AppError;
use crate::core::invocation::{BoxedHandler, OutputUpdate};
use crate::core::store::{CacheToken, ValueStore};
use crate::core::transform::CallbackTransform;
use std::sync::Arc;

/// Keeps expensive return values server-side. Outputs declared with
/// `serverside_output` are written to the injected store and transported as
/// opaque tokens; any token-shaped input argument is materialized back from
/// the store before the downstream handler runs.
pub struct ServersideOutputTransform {
    store: Arc<dyn ValueStore>,
}

impl ServersideOutputTransform {
    pub fn new(store: Arc<dyn ValueStore>) -> Self {
        ServersideOutputTransform { store }
    }

    pub fn store(&self) -> Arc<dyn ValueStore> {
        self.store.clone()
    }
}

impl CallbackTransform for ServersideOutputTransform {
    fn name(&self) -> &'static str {
        "ServersideOutputTransform"
    }

    fn wrap(&self, declared: &CallbackBlueprint, handler: BoxedHandler) -> BoxedHandler {
        let serverside_slots: Vec<usize> = declared
            .outputs
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.is_serverside())
            .map(|(slot, _)| slot)
            .collect();
        let store = self.store.clone();
        let blueprint_id = declared.id.clone();
        Arc::new(move |mut ctx| {
            let inner = handler.clone();
            let store = store.clone();
            let blueprint_id = blueprint_id.clone();
            let serverside_slots = serverside_slots.clone();
            Box::pin(async move {
                // Materialize token-shaped arguments so downstream handlers
                // see the stored value, never the token.
                for arg in ctx.args.iter_mut() {
                    if let Some(token) = CacheToken::from_value(arg) {
                        *arg = store.get(&token.key).await.map_err(AppError::from)?;
                    }
                }

                let session_id = ctx.session_id.clone();
                let mut updates = inner(ctx).await?;

                for &slot in &serverside_slots {
                    let Some(update) = updates.get_mut(slot) else {
                        continue;
                    };
                    if let OutputUpdate::Set(value) = update {
                        let token = CacheToken::derive(&session_id, &blueprint_id, slot);
                        store
                            .put(&token.key, value.clone())
                            .await
                            .map_err(AppError::from)?;
                        *update = OutputUpdate::Set(token.to_value());
                    }
                }
                Ok(updates)
            })
        })
    }
}
