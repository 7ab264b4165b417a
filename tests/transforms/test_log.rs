use rebind::core::blueprint::CallbackOptions;
use rebind::core::dependency::{input, output};
use rebind::core::invocation::{handler, InvocationContext, OutputUpdate};
use rebind::core::registry::BlueprintRegistry;
use rebind::core::transform::LogTransform;
use rebind::core::types::ErrorCategory;
use serde_json::json;
use std::sync::Arc;

fn log_options() -> CallbackOptions {
    CallbackOptions::from([("log".to_string(), json!(true))])
}

fn logging_registry(transform: LogTransform) -> BlueprintRegistry {
    let registry = BlueprintRegistry::with_transforms(vec![Arc::new(transform)]);
    registry
        .callback(
            vec![
                output("log_server", "children").into(),
                input("btn", "n_clicks").into(),
            ],
            log_options(),
            handler(|ctx: InvocationContext| async move {
                let logger = ctx.logger()?;
                logger.info("info");
                logger.warning("warning");
                logger.error("error");
                Ok(vec![OutputUpdate::Set(ctx.args[0].clone())])
            }),
        )
        .expect("declaration");
    registry
}

#[test]
fn test_log_option_appends_sink_output() {
    let registry = logging_registry(LogTransform::new());
    let resolution = registry.resolve().expect("resolution");
    let registration = &resolution.registrations[0];
    assert_eq!(registration.outputs.len(), 2);
    assert_eq!(
        registration.outputs[1].target(),
        ("log".to_string(), "children".to_string())
    );
    assert_eq!(resolution.hidden_components.len(), 1);
    assert_eq!(resolution.hidden_components[0].id, "log");
}

#[tokio::test]
async fn test_rendered_text_matches_emission_order() {
    let registry = logging_registry(LogTransform::new());
    let resolution = registry.resolve().expect("resolution");
    let wrapped = resolution.registrations[0].handler.clone().expect("handler");

    let updates = wrapped(InvocationContext::new(vec![json!(1)]))
        .await
        .expect("invocation");
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0], OutputUpdate::Set(json!(1)));
    assert_eq!(
        updates[1],
        OutputUpdate::Set(json!("INFO: info\nWARNING: warning\nERROR: error"))
    );
}

#[tokio::test]
async fn test_fresh_logger_per_invocation() {
    let registry = logging_registry(LogTransform::new());
    let resolution = registry.resolve().expect("resolution");
    let wrapped = resolution.registrations[0].handler.clone().expect("handler");

    // A second invocation must not see the first invocation's records.
    for _ in 0..2 {
        let updates = wrapped(InvocationContext::new(vec![json!(1)]))
            .await
            .expect("invocation");
        assert_eq!(
            updates[1],
            OutputUpdate::Set(json!("INFO: info\nWARNING: warning\nERROR: error"))
        );
    }
}

#[tokio::test]
async fn test_handler_failure_propagates_without_log_output() {
    let registry = BlueprintRegistry::with_transforms(vec![Arc::new(LogTransform::new())]);
    registry
        .callback(
            vec![
                output("log_server", "children").into(),
                input("btn", "n_clicks").into(),
            ],
            log_options(),
            handler(|ctx: InvocationContext| async move {
                let logger = ctx.logger()?;
                logger.info("before failure");
                Err(rebind::core::error::AppError::new(
                    ErrorCategory::InternalError,
                    "handler exploded",
                ))
            }),
        )
        .expect("declaration");

    let resolution = registry.resolve().expect("resolution");
    let wrapped = resolution.registrations[0].handler.clone().expect("handler");
    let err = wrapped(InvocationContext::new(vec![json!(1)]))
        .await
        .expect_err("failure propagates");
    assert_eq!(err.category, ErrorCategory::InternalError);
}

#[tokio::test]
async fn test_logger_unavailable_without_log_option() {
    let registry = BlueprintRegistry::with_transforms(vec![Arc::new(LogTransform::new())]);
    registry
        .callback(
            vec![
                output("log_server", "children").into(),
                input("btn", "n_clicks").into(),
            ],
            CallbackOptions::new(),
            handler(|ctx: InvocationContext| async move {
                let err = ctx.logger().expect_err("no logger without log option");
                assert_eq!(err.code, "CBK-LOG-001");
                Ok(vec![OutputUpdate::NoChange])
            }),
        )
        .expect("declaration");

    let resolution = registry.resolve().expect("resolution");
    // No sink output appended either.
    assert_eq!(resolution.registrations[0].outputs.len(), 1);
    let wrapped = resolution.registrations[0].handler.clone().expect("handler");
    wrapped(InvocationContext::new(vec![json!(1)]))
        .await
        .expect("invocation");
}

#[test]
fn test_custom_sink_target() {
    let registry = logging_registry(LogTransform::with_sink("notices", "value"));
    let resolution = registry.resolve().expect("resolution");
    assert_eq!(
        resolution.registrations[0].outputs[1].target(),
        ("notices".to_string(), "value".to_string())
    );
}
