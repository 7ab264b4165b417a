use crate::core::blueprint::CallbackBlueprint;
use crate::core::error::AppError;
use crate::core::invocation::BoxedHandler;
use crate::core::transform::CallbackTransform;
use crate::core::types::ErrorCategory;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Serializes invocations of callbacks declared with the `blocking` option:
/// at most one in-flight execution per blueprint identity, waiters queued
/// FIFO behind tokio's fair mutex. A waiter that outlives the configured
/// timeout fails with a recoverable timeout error and the handler never runs;
/// the in-flight holder is left alone.
pub struct BlockingCallbackTransform {
    timeout: Duration,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl BlockingCallbackTransform {
    pub fn new(timeout: Duration) -> Self {
        BlockingCallbackTransform {
            timeout,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CallbackTransform for BlockingCallbackTransform {
    fn name(&self) -> &'static str {
        "BlockingCallbackTransform"
    }

    fn wrap(&self, declared: &CallbackBlueprint, handler: BoxedHandler) -> BoxedHandler {
        if !declared.option_flag("blocking") {
            return handler;
        }
        // The lock table is keyed by blueprint identity and outlives
        // re-resolution, so a second resolution pass wraps around the same
        // mutex instead of minting a fresh one.
        let lock = self
            .locks
            .entry(declared.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let timeout = self.timeout;
        let blueprint_id = declared.id.clone();
        Arc::new(move |ctx| {
            let inner = handler.clone();
            let lock = lock.clone();
            let blueprint_id = blueprint_id.clone();
            Box::pin(async move {
                let guard = match tokio::time::timeout(timeout, lock.lock_owned()).await {
                    Ok(guard) => guard,
                    Err(_) => {
                        tracing::warn!(blueprint = %blueprint_id, ?timeout, "blocking wait timed out");
                        return Err(AppError::new(
                            ErrorCategory::TimeoutError,
                            format!(
                                "blocking callback '{}' timed out after {:?} waiting for the previous invocation",
                                blueprint_id, timeout
                            ),
                        )
                        .with_code("CBK-BLOCK-001"));
                    }
                };
                let result = inner(ctx).await;
                drop(guard);
                result
            })
        })
    }
}
