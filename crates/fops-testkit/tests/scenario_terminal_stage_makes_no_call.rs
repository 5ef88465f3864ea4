//! Scenario: transitions out of a terminal stage return `AlreadyTerminal`
//! and invoke the network zero times, for every order kind. A task whose
//! backend status is already `COMPLETED` is terminal regardless of stage.

use fops_testkit::fixtures::{
    actor, delivery_order, line_item, pickup_two_active_one_cancelled, stage_definition,
    task_order,
};
use fops_testkit::FakeGateway;
use fops_workflow::{
    DeliveryStage, FormState, Order, PickupStage, Stage, StageTransitionEngine, TaskStage,
    TransitionError, TransitionRequest,
};

async fn run(order: &Order, stage: Stage) -> (TransitionError, usize) {
    let engine = StageTransitionEngine::new(FakeGateway::new());
    let (form, actor, def) = (FormState::default(), actor(), stage_definition());
    let err = engine
        .transition(&TransitionRequest {
            order,
            stage,
            form: &form,
            actor: &actor,
            definition: &def,
            feedback_definitions: &[],
            confirm_empty_items: true,
        })
        .await
        .unwrap_err();
    (err, engine.gateway().total_calls())
}

#[tokio::test]
async fn completed_stage_is_terminal_for_every_kind() {
    let cases = [
        (
            delivery_order("CLOSED", vec![line_item(1, 1)]),
            Stage::Delivery(DeliveryStage::Completed),
        ),
        (
            pickup_two_active_one_cancelled("CLOSED"),
            Stage::Pickup(PickupStage::Completed),
        ),
        (task_order("OPEN"), Stage::Task(TaskStage::Completed)),
    ];
    for (order, stage) in cases {
        let (err, calls) = run(&order, stage).await;
        assert_eq!(err, TransitionError::AlreadyTerminal { stage });
        assert_eq!(calls, 0, "{stage} must not reach the network");
    }
}

#[tokio::test]
async fn completed_task_absorbs_open_stage() {
    let stage = Stage::Task(TaskStage::Open);
    let (err, calls) = run(&task_order("completed"), stage).await;
    assert_eq!(err, TransitionError::AlreadyTerminal { stage });
    assert_eq!(calls, 0);
}
