//! Pre-submission validation. Pure; never touches the network.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolver::StageRequirement;
use crate::types::{FormState, LineItem};

/// One unmet requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum Missing {
    Remarks,
    Signature,
    FileUpload,
    Feedback,
    /// Submitted quantity is out of range, or short where partial is not allowed.
    ItemQuantity { line_id: i64 },
    /// Short quantity without a reason code.
    ItemReason { line_id: i64 },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Remarks => f.write_str("remarks"),
            Missing::Signature => f.write_str("signature"),
            Missing::FileUpload => f.write_str("file_upload"),
            Missing::Feedback => f.write_str("feedback"),
            Missing::ItemQuantity { line_id } => write!(f, "item_quantity(line={line_id})"),
            Missing::ItemReason { line_id } => write!(f, "item_reason(line={line_id})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Passed,
    /// Line-level transition with no active items. Not an error; the caller
    /// must confirm before proceeding.
    EmptyItemsWarning,
    Failed { missing: Vec<Missing> },
}

impl Validation {
    pub fn is_passed(&self) -> bool {
        matches!(self, Validation::Passed)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionValidator;

impl TransitionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check `form` and the active `items` against `req`.
    ///
    /// Failures are collected, not short-circuited. A hard failure wins over
    /// the empty-items warning.
    pub fn validate(
        &self,
        req: &StageRequirement,
        form: &FormState,
        items: &[&LineItem],
    ) -> Validation {
        let mut missing = Vec::new();

        if req.remarks_required && form.remarks_text().is_none() {
            missing.push(Missing::Remarks);
        }
        if req.signature_required && !form.has_signature() {
            missing.push(Missing::Signature);
        }
        if req.file_upload_required && !form.has_file() {
            missing.push(Missing::FileUpload);
        }
        if req.feedback_required && form.feedback.is_none() {
            missing.push(Missing::Feedback);
        }

        if req.line_level {
            for item in items {
                check_item(req, item, &mut missing);
            }
        }

        if !missing.is_empty() {
            return Validation::Failed { missing };
        }
        if req.line_level && items.is_empty() {
            return Validation::EmptyItemsWarning;
        }
        Validation::Passed
    }
}

// Checks the quantity that will be submitted, so an untouched item is held
// to the same range as an operator entry of its ordered quantity.
fn check_item(req: &StageRequirement, item: &LineItem, missing: &mut Vec<Missing>) {
    let qty = item.stage_qty();
    let line_id = item.id;

    if qty < 0 || qty > item.open_qty {
        missing.push(Missing::ItemQuantity { line_id });
        return;
    }
    if qty < item.open_qty {
        if !req.partial_allowed {
            missing.push(Missing::ItemQuantity { line_id });
            return;
        }
        let has_reason = item
            .reason_code
            .as_deref()
            .map(str::trim)
            .is_some_and(|s| !s.is_empty());
        if !has_reason {
            missing.push(Missing::ItemReason { line_id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeedbackSelection, OrderKind};

    fn req() -> StageRequirement {
        StageRequirement {
            kind: OrderKind::Delivery,
            menu_name: "Delivery Order".to_string(),
            remarks_required: false,
            signature_required: false,
            file_upload_required: false,
            feedback_required: false,
            line_level: true,
            partial_allowed: true,
            terminal: false,
            was_defaulted: false,
        }
    }

    fn item(id: i64, open: i64, actioned: Option<i64>, reason: Option<&str>) -> LineItem {
        LineItem {
            id,
            line_no: id as i32,
            item_code: format!("SKU-{id}"),
            description: String::new(),
            ordered_qty: open,
            open_qty: open,
            actioned_qty: actioned,
            cancelled: false,
            reason_code: reason.map(str::to_string),
            reason_description: None,
            remarks: None,
        }
    }

    #[test]
    fn empty_line_level_items_warn() {
        let v = TransitionValidator::new().validate(&req(), &FormState::default(), &[]);
        assert_eq!(v, Validation::EmptyItemsWarning);
    }

    #[test]
    fn empty_items_do_not_warn_for_header_only_transitions() {
        let r = StageRequirement {
            line_level: false,
            partial_allowed: false,
            ..req()
        };
        let v = TransitionValidator::new().validate(&r, &FormState::default(), &[]);
        assert_eq!(v, Validation::Passed);
    }

    #[test]
    fn hard_failure_takes_precedence_over_empty_warning() {
        let r = StageRequirement {
            signature_required: true,
            ..req()
        };
        let v = TransitionValidator::new().validate(&r, &FormState::default(), &[]);
        assert_eq!(
            v,
            Validation::Failed {
                missing: vec![Missing::Signature]
            }
        );
    }

    #[test]
    fn header_failures_are_all_collected() {
        let r = StageRequirement {
            remarks_required: true,
            signature_required: true,
            file_upload_required: true,
            feedback_required: true,
            ..req()
        };
        let form = FormState {
            remarks: Some("  \t".to_string()),
            ..FormState::default()
        };
        let a = item(1, 5, None, None);
        let v = TransitionValidator::new().validate(&r, &form, &[&a]);
        assert_eq!(
            v,
            Validation::Failed {
                missing: vec![
                    Missing::Remarks,
                    Missing::Signature,
                    Missing::FileUpload,
                    Missing::Feedback
                ]
            }
        );
    }

    #[test]
    fn satisfied_header_requirements_pass() {
        let r = StageRequirement {
            remarks_required: true,
            signature_required: true,
            feedback_required: true,
            ..req()
        };
        let form = FormState {
            remarks: Some("left at gate".to_string()),
            signature: Some("iVBORw0KGgo=".to_string()),
            file_upload_url: None,
            feedback: Some(FeedbackSelection::Happy),
        };
        let a = item(1, 5, None, None);
        assert!(TransitionValidator::new().validate(&r, &form, &[&a]).is_passed());
    }

    #[test]
    fn untouched_items_pass() {
        let a = item(1, 5, None, None);
        let b = item(2, 3, Some(3), None);
        let v = TransitionValidator::new().validate(&req(), &FormState::default(), &[&a, &b]);
        assert_eq!(v, Validation::Passed);
    }

    #[test]
    fn untouched_item_on_partially_fulfilled_line_is_checked_like_an_entry() {
        let untouched = LineItem {
            ordered_qty: 10,
            ..item(1, 4, None, None)
        };
        let typed = LineItem {
            actioned_qty: Some(10),
            ..untouched.clone()
        };
        let v = TransitionValidator::new();
        let expected = Validation::Failed {
            missing: vec![Missing::ItemQuantity { line_id: 1 }],
        };
        assert_eq!(v.validate(&req(), &FormState::default(), &[&untouched]), expected);
        assert_eq!(v.validate(&req(), &FormState::default(), &[&typed]), expected);

        let within_open = LineItem {
            actioned_qty: Some(4),
            ..untouched
        };
        assert!(v
            .validate(&req(), &FormState::default(), &[&within_open])
            .is_passed());
    }

    #[test]
    fn out_of_range_quantities_fail() {
        let over = item(1, 5, Some(6), None);
        let neg = item(2, 5, Some(-1), Some("DMG"));
        let v = TransitionValidator::new().validate(&req(), &FormState::default(), &[&over, &neg]);
        assert_eq!(
            v,
            Validation::Failed {
                missing: vec![
                    Missing::ItemQuantity { line_id: 1 },
                    Missing::ItemQuantity { line_id: 2 }
                ]
            }
        );
    }

    #[test]
    fn short_quantity_needs_reason() {
        let short = item(7, 5, Some(2), None);
        let reasoned = item(8, 5, Some(0), Some("OOS"));
        let v = TransitionValidator::new().validate(
            &req(),
            &FormState::default(),
            &[&short, &reasoned],
        );
        assert_eq!(
            v,
            Validation::Failed {
                missing: vec![Missing::ItemReason { line_id: 7 }]
            }
        );
    }

    #[test]
    fn short_quantity_rejected_when_partial_not_allowed() {
        let r = StageRequirement {
            partial_allowed: false,
            ..req()
        };
        let short = item(3, 5, Some(4), Some("DMG"));
        let v = TransitionValidator::new().validate(&r, &FormState::default(), &[&short]);
        assert_eq!(
            v,
            Validation::Failed {
                missing: vec![Missing::ItemQuantity { line_id: 3 }]
            }
        );
    }

    #[test]
    fn missing_display_is_stable() {
        assert_eq!(Missing::FileUpload.to_string(), "file_upload");
        assert_eq!(
            Missing::ItemReason { line_id: 12 }.to_string(),
            "item_reason(line=12)"
        );
    }
}
