//! Canonical orders and contexts used across scenarios.

use std::sync::Arc;

use fops_client::{NoAuth, ResilientApiClient, RetryPolicy};
use fops_config::RouteSettings;
use fops_workflow::{
    ActorContext, DeliveryOrder, FeedbackDefinition, HttpOrderGateway, LineItem, Order,
    OrderHeader, PickupOrder, StageDefinition, TaskOrder,
};

use crate::scripted_transport::{Outcome, ScriptedTransport};

pub fn header(id: i64, document_no: &str, status: &str) -> OrderHeader {
    OrderHeader {
        id,
        document_no: document_no.to_string(),
        status: status.to_string(),
        customer: Some("CUST-001".to_string()),
        amount: Some("250.00".to_string()),
        contact_numbers: vec!["+10000000000".to_string()],
        cancelled: false,
    }
}

pub fn line_item(id: i64, ordered_qty: i64) -> LineItem {
    LineItem {
        id,
        line_no: id as i32 * 10,
        item_code: format!("SKU-{id:03}"),
        description: format!("Item {id}"),
        ordered_qty,
        open_qty: ordered_qty,
        actioned_qty: None,
        cancelled: false,
        reason_code: None,
        reason_description: None,
        remarks: None,
    }
}

pub fn cancelled_line_item(id: i64, ordered_qty: i64) -> LineItem {
    LineItem {
        cancelled: true,
        ..line_item(id, ordered_qty)
    }
}

/// Pickup order with lines 1 and 2 active and line 3 cancelled.
pub fn pickup_two_active_one_cancelled(status: &str) -> Order {
    Order::Pickup(PickupOrder {
        header: header(1001, "PU-1001", status),
        line_items: vec![
            line_item(1, 4),
            line_item(2, 2),
            cancelled_line_item(3, 9),
        ],
    })
}

pub fn delivery_order(status: &str, line_items: Vec<LineItem>) -> Order {
    Order::Delivery(DeliveryOrder {
        header: header(2002, "DO-2002", status),
        line_items,
    })
}

pub fn task_order(status: &str) -> Order {
    Order::Task(TaskOrder {
        header: header(3003, "TK-3003", status),
        title: Some("Replace meter".to_string()),
    })
}

/// Descriptor with no server-side mandatory flags.
pub fn stage_definition() -> StageDefinition {
    StageDefinition {
        definition_id: 77,
        detail_id: 7701,
        ..StageDefinition::default()
    }
}

pub fn actor() -> ActorContext {
    ActorContext {
        user_id: 15,
        vehicle_id: Some(8),
    }
}

pub fn feedback_definitions() -> Vec<FeedbackDefinition> {
    vec![
        FeedbackDefinition {
            id: 1,
            name: "On time".to_string(),
        },
        FeedbackDefinition {
            id: 2,
            name: "Courteous driver".to_string(),
        },
    ]
}

/// HTTP gateway over a scripted transport with default routes and no auth.
pub fn scripted_gateway(
    script: Vec<Outcome>,
    policy: RetryPolicy,
) -> HttpOrderGateway<ScriptedTransport> {
    let client = ResilientApiClient::new(ScriptedTransport::new(script), policy, Arc::new(NoAuth));
    HttpOrderGateway::new(client, RouteSettings::default())
}
