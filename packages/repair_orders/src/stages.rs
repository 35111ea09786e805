// ABOUTME: The one ordered list of repair pipeline stages
// ABOUTME: Labels, badge colors, and customer-facing copy for each stage

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown stage: {0}")]
pub struct StageParseError(pub String);

/// Pipeline stage. Declaration order is pipeline order; `Ord` follows it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Intake,
    Estimate,
    Approval,
    Parts,
    Repair,
    Paint,
    Qc,
    Delivery,
    Closed,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Intake,
        Stage::Estimate,
        Stage::Approval,
        Stage::Parts,
        Stage::Repair,
        Stage::Paint,
        Stage::Qc,
        Stage::Delivery,
        Stage::Closed,
    ];

    /// Zero-based position in the pipeline
    pub fn position(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.position() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Intake => "intake",
            Stage::Estimate => "estimate",
            Stage::Approval => "approval",
            Stage::Parts => "parts",
            Stage::Repair => "repair",
            Stage::Paint => "paint",
            Stage::Qc => "qc",
            Stage::Delivery => "delivery",
            Stage::Closed => "closed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Intake => "Intake",
            Stage::Estimate => "Estimate",
            Stage::Approval => "Approval",
            Stage::Parts => "Parts",
            Stage::Repair => "Body Repair",
            Stage::Paint => "Paint",
            Stage::Qc => "Quality Check",
            Stage::Delivery => "Ready for Delivery",
            Stage::Closed => "Closed",
        }
    }

    /// Badge color used by the dashboard
    pub fn color(self) -> &'static str {
        match self {
            Stage::Intake => "#64748b",
            Stage::Estimate => "#3b82f6",
            Stage::Approval => "#8b5cf6",
            Stage::Parts => "#f59e0b",
            Stage::Repair => "#ef4444",
            Stage::Paint => "#ec4899",
            Stage::Qc => "#14b8a6",
            Stage::Delivery => "#22c55e",
            Stage::Closed => "#111827",
        }
    }

    /// What the customer is told when their vehicle enters this stage
    pub fn customer_message(self) -> &'static str {
        match self {
            Stage::Intake => "We've checked in your vehicle and opened your repair order.",
            Stage::Estimate => "Our estimator is preparing the repair estimate for your vehicle.",
            Stage::Approval => "Your repair has been approved and is being scheduled.",
            Stage::Parts => "We're ordering and receiving the parts for your repair.",
            Stage::Repair => "Your vehicle is in the body shop being repaired.",
            Stage::Paint => "Your vehicle is in our paint booth.",
            Stage::Qc => "Your vehicle is going through our final quality check.",
            Stage::Delivery => "Good news! Your vehicle is ready for pickup.",
            Stage::Closed => "Your repair order is complete. Thank you for choosing us!",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| StageParseError(s.to_string()))
    }
}

/// Every stage in pipeline order
pub fn stages() -> &'static [Stage] {
    &Stage::ALL
}

pub fn label(stage: Stage) -> &'static str {
    stage.label()
}

/// Following stage, or `None` for the terminal `closed`
pub fn next_stage(stage: Stage) -> Option<Stage> {
    stage.next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stage_order_is_pipeline_order() {
        let names: Vec<&str> = stages().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "intake", "estimate", "approval", "parts", "repair", "paint", "qc", "delivery",
                "closed"
            ]
        );

        for pair in stages().windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(next_stage(pair[0]), Some(pair[1]));
        }
    }

    #[test]
    fn test_closed_is_the_only_terminal_stage() {
        assert_eq!(next_stage(Stage::Closed), None);
        assert!(Stage::Closed.is_terminal());
        assert_eq!(
            stages().iter().filter(|s| s.is_terminal()).count(),
            1,
            "exactly one terminal stage"
        );
    }

    #[test]
    fn test_parse_round_trips_every_stage() {
        for stage in stages() {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), *stage);
            assert_eq!(stage.position(), stages().iter().position(|s| s == stage).unwrap());
        }
        assert!("siu_hold".parse::<Stage>().is_err());
        assert!("Intake".parse::<Stage>().is_err());
    }

    #[test]
    fn test_every_stage_has_copy() {
        for stage in stages() {
            assert!(!label(*stage).is_empty());
            assert!(stage.color().starts_with('#'));
            assert!(!stage.customer_message().is_empty());
        }
    }
}
