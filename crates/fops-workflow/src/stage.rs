//! Closed stage sets per order kind.
//!
//! ```text
//! Delivery: open → picking → delivered → completed
//! Pickup:   open → picking → picked    → completed
//! Task:     open → in_progress         → completed
//! ```
//!
//! `completed` is terminal for every kind. Stage is not stored on the order;
//! the caller supplies the current stage and the engine returns the next one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::OrderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStage {
    Open,
    Picking,
    Delivered,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupStage {
    Open,
    Picking,
    Picked,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    Open,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "stage", rename_all = "snake_case")]
pub enum Stage {
    Delivery(DeliveryStage),
    Pickup(PickupStage),
    Task(TaskStage),
}

/// Returned by [`Stage::parse`] for an unknown name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageParseError {
    pub kind: OrderKind,
    pub input: String,
}

impl fmt::Display for StageParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} stage '{}'", self.kind, self.input)
    }
}

impl std::error::Error for StageParseError {}

impl Stage {
    pub fn initial(kind: OrderKind) -> Self {
        match kind {
            OrderKind::Delivery => Stage::Delivery(DeliveryStage::Open),
            OrderKind::Pickup => Stage::Pickup(PickupStage::Open),
            OrderKind::Task => Stage::Task(TaskStage::Open),
        }
    }

    pub fn kind(&self) -> OrderKind {
        match self {
            Stage::Delivery(_) => OrderKind::Delivery,
            Stage::Pickup(_) => OrderKind::Pickup,
            Stage::Task(_) => OrderKind::Task,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Stage::Delivery(DeliveryStage::Completed)
                | Stage::Pickup(PickupStage::Completed)
                | Stage::Task(TaskStage::Completed)
        )
    }

    /// Successor stage; `None` at the terminal stage.
    pub fn next(&self) -> Option<Stage> {
        use DeliveryStage as D;
        use PickupStage as P;
        use TaskStage as T;

        let next = match self {
            Stage::Delivery(D::Open) => Stage::Delivery(D::Picking),
            Stage::Delivery(D::Picking) => Stage::Delivery(D::Delivered),
            Stage::Delivery(D::Delivered) => Stage::Delivery(D::Completed),
            Stage::Pickup(P::Open) => Stage::Pickup(P::Picking),
            Stage::Pickup(P::Picking) => Stage::Pickup(P::Picked),
            Stage::Pickup(P::Picked) => Stage::Pickup(P::Completed),
            Stage::Task(T::Open) => Stage::Task(T::InProgress),
            Stage::Task(T::InProgress) => Stage::Task(T::Completed),
            Stage::Delivery(D::Completed)
            | Stage::Pickup(P::Completed)
            | Stage::Task(T::Completed) => return None,
        };
        Some(next)
    }

    /// Backend status the order is expected to carry after a successful
    /// submission from this stage. Only pickup stages map to one.
    pub fn backend_status_after(&self) -> Option<&'static str> {
        match self {
            Stage::Pickup(PickupStage::Picking) => Some("REQUESTED"),
            Stage::Pickup(PickupStage::Picked) => Some("CLOSED"),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Delivery(DeliveryStage::Open)
            | Stage::Pickup(PickupStage::Open)
            | Stage::Task(TaskStage::Open) => "open",
            Stage::Delivery(DeliveryStage::Picking) | Stage::Pickup(PickupStage::Picking) => {
                "picking"
            }
            Stage::Delivery(DeliveryStage::Delivered) => "delivered",
            Stage::Pickup(PickupStage::Picked) => "picked",
            Stage::Task(TaskStage::InProgress) => "in_progress",
            Stage::Delivery(DeliveryStage::Completed)
            | Stage::Pickup(PickupStage::Completed)
            | Stage::Task(TaskStage::Completed) => "completed",
        }
    }

    pub fn parse(kind: OrderKind, s: &str) -> Result<Stage, StageParseError> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let stage = match (kind, norm.as_str()) {
            (OrderKind::Delivery, "open") => Stage::Delivery(DeliveryStage::Open),
            (OrderKind::Delivery, "picking") => Stage::Delivery(DeliveryStage::Picking),
            (OrderKind::Delivery, "delivered") => Stage::Delivery(DeliveryStage::Delivered),
            (OrderKind::Delivery, "completed") => Stage::Delivery(DeliveryStage::Completed),
            (OrderKind::Pickup, "open") => Stage::Pickup(PickupStage::Open),
            (OrderKind::Pickup, "picking") => Stage::Pickup(PickupStage::Picking),
            (OrderKind::Pickup, "picked") => Stage::Pickup(PickupStage::Picked),
            (OrderKind::Pickup, "completed") => Stage::Pickup(PickupStage::Completed),
            (OrderKind::Task, "open") => Stage::Task(TaskStage::Open),
            (OrderKind::Task, "in_progress") => Stage::Task(TaskStage::InProgress),
            (OrderKind::Task, "completed") => Stage::Task(TaskStage::Completed),
            _ => {
                return Err(StageParseError {
                    kind,
                    input: s.to_string(),
                })
            }
        };
        Ok(stage)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(kind: OrderKind) -> Vec<&'static str> {
        let mut out = vec![];
        let mut s = Some(Stage::initial(kind));
        while let Some(stage) = s {
            out.push(stage.as_str());
            s = stage.next();
        }
        out
    }

    #[test]
    fn each_kind_walks_its_chain_to_completed() {
        assert_eq!(
            walk(OrderKind::Delivery),
            vec!["open", "picking", "delivered", "completed"]
        );
        assert_eq!(
            walk(OrderKind::Pickup),
            vec!["open", "picking", "picked", "completed"]
        );
        assert_eq!(walk(OrderKind::Task), vec!["open", "in_progress", "completed"]);
    }

    #[test]
    fn only_completed_is_terminal() {
        for kind in [OrderKind::Delivery, OrderKind::Pickup, OrderKind::Task] {
            let mut s = Stage::initial(kind);
            while let Some(n) = s.next() {
                assert!(!s.is_terminal(), "{s} must not be terminal");
                s = n;
            }
            assert!(s.is_terminal());
            assert_eq!(s.as_str(), "completed");
        }
    }

    #[test]
    fn pickup_backend_status_mapping() {
        assert_eq!(
            Stage::Pickup(PickupStage::Picking).backend_status_after(),
            Some("REQUESTED")
        );
        assert_eq!(
            Stage::Pickup(PickupStage::Picked).backend_status_after(),
            Some("CLOSED")
        );
        assert_eq!(Stage::Delivery(DeliveryStage::Picking).backend_status_after(), None);
    }

    #[test]
    fn parse_is_kind_scoped() {
        assert_eq!(
            Stage::parse(OrderKind::Task, "In-Progress").unwrap(),
            Stage::Task(TaskStage::InProgress)
        );
        assert!(Stage::parse(OrderKind::Delivery, "picked").is_err());
        let err = Stage::parse(OrderKind::Pickup, "delivered").unwrap_err();
        assert_eq!(err.to_string(), "unknown pickup stage 'delivered'");
    }

    #[test]
    fn display_includes_kind() {
        assert_eq!(Stage::Pickup(PickupStage::Picked).to_string(), "pickup/picked");
    }
}
