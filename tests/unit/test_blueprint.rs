use rebind::core::blueprint::{CallbackBlueprint, CallbackOptions};
use rebind::core::component::ComponentHandle;
use rebind::core::dependency::{input, output, state, trigger, DependencyItem};
use rebind::core::invocation::{handler, BoxedHandler, OutputUpdate};
use serde_json::json;

fn noop() -> BoxedHandler {
    handler(|_ctx| async move { Ok(vec![OutputUpdate::NoChange]) })
}

#[test]
fn test_single_elements_classified_by_role() {
    let cbp = CallbackBlueprint::new(
        vec![
            DependencyItem::from(state("s", "prop")),
            output("o", "prop").into(),
            input("i", "prop").into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect("blueprint");
    assert_eq!(cbp.outputs, vec![output("o", "prop")]);
    assert_eq!(cbp.inputs, vec![state("s", "prop"), input("i", "prop")]);
}

#[test]
fn test_list_elements_flattened() {
    let cbp = CallbackBlueprint::new(
        vec![
            DependencyItem::from(vec![state("s", "prop"), state("s2", "prop")]),
            vec![output("o", "prop")].into(),
            vec![input("i", "prop")].into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect("blueprint");
    assert_eq!(cbp.outputs, vec![output("o", "prop")]);
    assert_eq!(
        cbp.inputs,
        vec![state("s", "prop"), state("s2", "prop"), input("i", "prop")]
    );
}

#[test]
fn test_mixed_singles_and_lists_preserve_order() {
    let cbp = CallbackBlueprint::new(
        vec![
            DependencyItem::from(vec![state("s", "prop"), state("s2", "prop")]),
            input("i0", "prop").into(),
            vec![output("o", "prop")].into(),
            state("s3", "prop").into(),
            vec![input("i", "prop")].into(),
            output("o2", "prop").into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect("blueprint");
    assert_eq!(cbp.outputs, vec![output("o", "prop"), output("o2", "prop")]);
    assert_eq!(
        cbp.inputs,
        vec![
            state("s", "prop"),
            state("s2", "prop"),
            input("i0", "prop"),
            state("s3", "prop"),
            input("i", "prop"),
        ]
    );
}

#[test]
fn test_component_handles_as_dependencies() {
    let my_input = ComponentHandle::new();
    let my_output = ComponentHandle::new();
    let cbp = CallbackBlueprint::new(
        vec![
            DependencyItem::from(input(&my_input, "n_clicks")),
            output(&my_output, "children").into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect("blueprint");
    assert_eq!(cbp.outputs, vec![output(&my_output, "children")]);
    assert_eq!(cbp.inputs, vec![input(&my_input, "n_clicks")]);
}

#[test]
fn test_keyword_options_collected_verbatim() {
    let cbp = CallbackBlueprint::new(
        vec![
            DependencyItem::from(input("btn", "n_clicks")),
            output("div", "children").into(),
        ],
        CallbackOptions::from([("hello".to_string(), json!("world"))]),
        noop(),
    )
    .expect("blueprint");
    assert_eq!(cbp.options.get("hello"), Some(&json!("world")));
    assert_eq!(cbp.options.len(), 1);
}

#[test]
fn test_empty_component_id_rejected_at_declaration() {
    let err = CallbackBlueprint::new(
        vec![
            DependencyItem::from(output("", "children")),
            input("btn", "n_clicks").into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect_err("empty id should be rejected");
    assert_eq!(err.code, "CBK-SPEC-001");
}

#[test]
fn test_empty_property_rejected_at_declaration() {
    let err = CallbackBlueprint::new(
        vec![
            DependencyItem::from(output("div", "")),
            input("btn", "n_clicks").into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect_err("empty property should be rejected");
    assert_eq!(err.code, "CBK-SPEC-001");
}

#[test]
fn test_duplicate_output_target_rejected() {
    let err = CallbackBlueprint::new(
        vec![
            DependencyItem::from(output("div", "children")),
            output("div", "children").into(),
            input("btn", "n_clicks").into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect_err("duplicate output should be rejected");
    assert_eq!(err.code, "CBK-SPEC-003");
}

#[test]
fn test_callback_without_firing_dependency_rejected() {
    let err = CallbackBlueprint::new(
        vec![
            DependencyItem::from(output("div", "children")),
            state("s", "prop").into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect_err("state-only callback should be rejected");
    assert_eq!(err.code, "CBK-SPEC-002");
}

#[test]
fn test_option_flag_truthiness() {
    let cbp = CallbackBlueprint::new(
        vec![
            DependencyItem::from(output("div", "children")),
            input("btn", "n_clicks").into(),
        ],
        CallbackOptions::from([
            ("log".to_string(), json!(true)),
            ("blocking".to_string(), json!(false)),
            ("label".to_string(), json!("")),
        ]),
        noop(),
    )
    .expect("blueprint");
    assert!(cbp.option_flag("log"));
    assert!(!cbp.option_flag("blocking"));
    assert!(!cbp.option_flag("label"));
    assert!(!cbp.option_flag("missing"));
}

#[test]
fn test_trigger_positions_reported_in_order() {
    let cbp = CallbackBlueprint::new(
        vec![
            DependencyItem::from(output("log", "children")),
            trigger("btn1", "n_clicks").into(),
            input("btn2", "n_clicks").into(),
            trigger("btn3", "n_clicks").into(),
            state("btn4", "n_clicks").into(),
        ],
        CallbackOptions::new(),
        noop(),
    )
    .expect("blueprint");
    assert_eq!(cbp.trigger_positions(), vec![0, 2]);
}

#[test]
fn test_clientside_blueprint_has_source_instead_of_handler() {
    let cbp = CallbackBlueprint::clientside(
        "function(x){return x;}",
        vec![
            DependencyItem::from(output("log_client", "children")),
            input("btn", "n_clicks").into(),
        ],
        CallbackOptions::new(),
    )
    .expect("blueprint");
    assert!(cbp.is_clientside());
    assert!(cbp.handler.is_none());
    assert_eq!(cbp.clientside_source.as_deref(), Some("function(x){return x;}"));
}
