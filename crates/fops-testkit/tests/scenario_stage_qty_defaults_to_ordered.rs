//! Scenario: a line item the operator never touched reports
//! `stageQty == orderQty`. An explicit entry (including zero) is kept.

use fops_testkit::fixtures::{actor, delivery_order, line_item, stage_definition};
use fops_workflow::{
    DeliveryStage, FormState, OrderKind, PayloadBuilder, PayloadInput, Stage,
    StageDefinitionResolver,
};

#[test]
fn untouched_items_report_ordered_quantity() {
    let mut touched = line_item(2, 6);
    touched.actioned_qty = Some(6);
    let mut zeroed = line_item(3, 4);
    zeroed.actioned_qty = Some(0);
    zeroed.reason_code = Some("OOS".to_string());

    let order = delivery_order("OPEN", vec![line_item(1, 5), touched, zeroed]);
    let req = StageDefinitionResolver::new().resolve(
        OrderKind::Delivery,
        Stage::Delivery(DeliveryStage::Picking),
        "OPEN",
    );
    let (form, actor, def) = (FormState::default(), actor(), stage_definition());
    let payload = PayloadBuilder::new().build(&PayloadInput {
        order: &order,
        requirement: &req,
        definition: &def,
        form: &form,
        actor: &actor,
        feedback_definitions: &[],
    });

    let qty: Vec<(i64, i64)> = payload
        .lines
        .iter()
        .map(|l| (l.order_qty, l.stage_qty))
        .collect();
    assert_eq!(qty, vec![(5, 5), (6, 6), (4, 0)]);
}
