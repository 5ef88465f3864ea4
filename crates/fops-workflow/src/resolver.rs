//! Stage definition resolver: one lookup table for every order kind.
//!
//! A requirement describes the transition *out of* the current stage. Rules
//! are matched in table order; the first match wins. Pickup menu names are
//! keyed on the backend status, not on the stage, because the backend picks
//! its stage definitions by menu name.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::stage::{DeliveryStage, PickupStage, Stage, TaskStage};
use crate::types::{OrderKind, StageDefinition};

pub const MENU_DELIVERY_ORDER: &str = "Delivery Order";
pub const MENU_DELIVERY_PICKING: &str = "Delivery Picking";
pub const MENU_DELIVERY_CONFIRMATION: &str = "Delivery Confirmation";
pub const MENU_PICKUP_ORDER: &str = "Pickup Order";
pub const MENU_RETURN_CONFIRMATION: &str = "Return Confirmation";
pub const MENU_TASK: &str = "Task";
pub const MENU_TASK_COMPLETION: &str = "Task Completion";
pub const MENU_COMPLETED: &str = "Completed";

/// Structural requirements for one transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRequirement {
    pub kind: OrderKind,
    pub menu_name: String,
    pub remarks_required: bool,
    pub signature_required: bool,
    pub file_upload_required: bool,
    pub feedback_required: bool,
    /// Transition operates on line items.
    pub line_level: bool,
    /// Operator may action less than the open quantity.
    pub partial_allowed: bool,
    /// Absorbing state: no transition may be submitted.
    pub terminal: bool,
    /// No table row matched; this is the kind's initial-stage row.
    pub was_defaulted: bool,
}

impl StageRequirement {
    /// OR the server descriptor's mandatory flags into this requirement.
    /// The server can add requirements but never relax the table.
    pub fn tightened_by(mut self, def: &StageDefinition) -> Self {
        self.remarks_required |= def.remarks_mandatory;
        self.signature_required |= def.signature_mandatory;
        self.file_upload_required |= def.file_upload_mandatory;
        self.feedback_required |= def.feedback_mandatory;
        self
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum StageMatch {
    Any,
    AnyOf(&'static [Stage]),
}

#[derive(Clone, Copy)]
enum StatusMatch {
    Any,
    Exact(&'static str),
}

#[derive(Clone, Copy)]
struct Flags {
    remarks: bool,
    signature: bool,
    file: bool,
    feedback: bool,
    line_level: bool,
    partial: bool,
    terminal: bool,
}

const LINES: Flags = Flags {
    remarks: false,
    signature: false,
    file: false,
    feedback: false,
    line_level: true,
    partial: true,
    terminal: false,
};

const HEADER_ONLY: Flags = Flags {
    line_level: false,
    partial: false,
    ..LINES
};

#[derive(Clone, Copy)]
struct Rule {
    stage: StageMatch,
    status: StatusMatch,
    menu: &'static str,
    flags: Flags,
}

impl Rule {
    fn matches(&self, stage: Stage, status: &str) -> bool {
        let stage_ok = match self.stage {
            StageMatch::Any => true,
            StageMatch::AnyOf(stages) => stages.contains(&stage),
        };
        let status_ok = match self.status {
            StatusMatch::Any => true,
            StatusMatch::Exact(s) => s == status,
        };
        stage_ok && status_ok
    }
}

const DELIVERY_RULES: &[Rule] = &[
    Rule {
        stage: StageMatch::AnyOf(&[Stage::Delivery(DeliveryStage::Open)]),
        status: StatusMatch::Any,
        menu: MENU_DELIVERY_ORDER,
        flags: LINES,
    },
    Rule {
        stage: StageMatch::AnyOf(&[Stage::Delivery(DeliveryStage::Picking)]),
        status: StatusMatch::Any,
        menu: MENU_DELIVERY_PICKING,
        flags: LINES,
    },
    Rule {
        stage: StageMatch::AnyOf(&[Stage::Delivery(DeliveryStage::Delivered)]),
        status: StatusMatch::Any,
        menu: MENU_DELIVERY_CONFIRMATION,
        flags: Flags {
            signature: true,
            feedback: true,
            ..LINES
        },
    },
];

const PICKUP_EARLY: &[Stage] = &[
    Stage::Pickup(PickupStage::Open),
    Stage::Pickup(PickupStage::Picking),
];
const PICKUP_PICKED: &[Stage] = &[Stage::Pickup(PickupStage::Picked)];

const PICKUP_RULES: &[Rule] = &[
    Rule {
        stage: StageMatch::AnyOf(PICKUP_EARLY),
        status: StatusMatch::Exact("OPEN"),
        menu: MENU_PICKUP_ORDER,
        flags: LINES,
    },
    Rule {
        stage: StageMatch::AnyOf(PICKUP_PICKED),
        status: StatusMatch::Exact("OPEN"),
        menu: MENU_PICKUP_ORDER,
        flags: Flags {
            signature: true,
            ..LINES
        },
    },
    Rule {
        stage: StageMatch::AnyOf(PICKUP_EARLY),
        status: StatusMatch::Exact("REQUESTED"),
        menu: MENU_RETURN_CONFIRMATION,
        flags: LINES,
    },
    Rule {
        stage: StageMatch::AnyOf(PICKUP_PICKED),
        status: StatusMatch::Exact("REQUESTED"),
        menu: MENU_RETURN_CONFIRMATION,
        flags: Flags {
            signature: true,
            ..LINES
        },
    },
];

const TASK_RULES: &[Rule] = &[
    // A completed task absorbs every stage argument.
    Rule {
        stage: StageMatch::Any,
        status: StatusMatch::Exact("COMPLETED"),
        menu: MENU_COMPLETED,
        flags: Flags {
            terminal: true,
            ..HEADER_ONLY
        },
    },
    Rule {
        stage: StageMatch::AnyOf(&[Stage::Task(TaskStage::Open)]),
        status: StatusMatch::Any,
        menu: MENU_TASK,
        flags: HEADER_ONLY,
    },
    Rule {
        stage: StageMatch::AnyOf(&[Stage::Task(TaskStage::InProgress)]),
        status: StatusMatch::Any,
        menu: MENU_TASK_COMPLETION,
        flags: Flags {
            remarks: true,
            file: true,
            ..HEADER_ONLY
        },
    },
];

fn rules_for(kind: OrderKind) -> &'static [Rule] {
    match kind {
        OrderKind::Delivery => DELIVERY_RULES,
        OrderKind::Pickup => PICKUP_RULES,
        OrderKind::Task => TASK_RULES,
    }
}

/// Initial-stage row per kind, used when nothing matches.
fn default_rule(kind: OrderKind) -> &'static Rule {
    match kind {
        OrderKind::Delivery => &DELIVERY_RULES[0],
        OrderKind::Pickup => &PICKUP_RULES[0],
        OrderKind::Task => &TASK_RULES[1],
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Pure lookup; no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageDefinitionResolver;

impl StageDefinitionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the requirement for leaving `stage`.
    ///
    /// `stage` of a different kind than `kind` never matches a row and
    /// therefore yields the defaulted requirement.
    pub fn resolve(&self, kind: OrderKind, stage: Stage, status: &str) -> StageRequirement {
        let status = status.trim().to_ascii_uppercase();
        let hit = if stage.kind() == kind {
            rules_for(kind).iter().find(|r| r.matches(stage, &status))
        } else {
            None
        };

        match hit {
            Some(rule) => requirement(kind, rule, false),
            None => {
                warn!(
                    kind = kind.as_str(),
                    stage = %stage,
                    status = %status,
                    "no stage rule matched; falling back to initial-stage requirement"
                );
                requirement(kind, default_rule(kind), true)
            }
        }
    }
}

fn requirement(kind: OrderKind, rule: &Rule, was_defaulted: bool) -> StageRequirement {
    StageRequirement {
        kind,
        menu_name: rule.menu.to_string(),
        remarks_required: rule.flags.remarks,
        signature_required: rule.flags.signature,
        file_upload_required: rule.flags.file,
        feedback_required: rule.flags.feedback,
        line_level: rule.flags.line_level,
        partial_allowed: rule.flags.partial,
        terminal: rule.flags.terminal,
        was_defaulted,
    }
}
