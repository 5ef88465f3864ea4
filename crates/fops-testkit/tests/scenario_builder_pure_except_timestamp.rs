//! Scenario: `PayloadBuilder::build` is pure apart from the single
//! submission timestamp. Two builds with identical inputs are deep-equal
//! once `stageDate` is removed, and `build_at` with a fixed instant is
//! byte-identical.

use chrono::{TimeZone, Utc};
use fops_testkit::fixtures::{
    actor, feedback_definitions, pickup_two_active_one_cancelled, stage_definition,
};
use fops_workflow::{
    FeedbackSelection, FormState, OrderKind, PayloadBuilder, PayloadInput, PickupStage, Stage,
    StageDefinitionResolver,
};
use serde_json::Value;

fn without_stage_date(mut v: Value) -> Value {
    if let Some(obj) = v.as_object_mut() {
        obj.remove("stageDate");
    }
    v
}

#[test]
fn repeated_builds_differ_only_in_timestamp() {
    let order = pickup_two_active_one_cancelled("OPEN");
    let req = StageDefinitionResolver::new().resolve(
        OrderKind::Pickup,
        Stage::Pickup(PickupStage::Picked),
        "OPEN",
    );
    let form = FormState {
        remarks: Some("all good".to_string()),
        signature: Some("iVBORw0KGgoAAAANSUhEUg==".to_string()),
        file_upload_url: None,
        feedback: Some(FeedbackSelection::Happy),
    };
    let (actor, def, fb) = (actor(), stage_definition(), feedback_definitions());
    let input = PayloadInput {
        order: &order,
        requirement: &req,
        definition: &def,
        form: &form,
        actor: &actor,
        feedback_definitions: &fb,
    };
    let builder = PayloadBuilder::new();

    let a = serde_json::to_value(builder.build(&input)).unwrap();
    let b = serde_json::to_value(builder.build(&input)).unwrap();
    assert!(a["stageDate"].is_string());
    assert_eq!(without_stage_date(a), without_stage_date(b));

    let at = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();
    let x = serde_json::to_vec(&builder.build_at(&input, at)).unwrap();
    let y = serde_json::to_vec(&builder.build_at(&input, at)).unwrap();
    assert_eq!(x, y);
}
