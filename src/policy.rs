//! Traversal policies.
//!
//! A policy decides two things about an edge: what it costs to walk and
//! whether it may be walked at all. Nothing else in the pathfinder depends on
//! which policy is active.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::path::{Path, CORRIDOR, ELEVATOR, RAMP, STAIRS};
use crate::room::Room;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraversalPolicy {
    #[default]
    Standard,
    Wheelchair,
    VisuallyImpaired,
    Emergency,
}

impl TraversalPolicy {
    pub const ALL: [TraversalPolicy; 4] = [
        TraversalPolicy::VisuallyImpaired,
        TraversalPolicy::Wheelchair,
        TraversalPolicy::Emergency,
        TraversalPolicy::Standard,
    ];

    /// Cost of walking `edge` from `from` to `to`. Returns `f64::INFINITY`
    /// for edges the policy can never use.
    pub fn cost(self, edge: &Path, from: &Room, to: &Room) -> f64 {
        let base = edge.distance;
        match self {
            TraversalPolicy::Standard => {
                if edge.is_type(STAIRS) {
                    base * 1.2
                } else if edge.is_type(ELEVATOR) {
                    base * 1.1
                } else {
                    base * (from.room_type().crowd_factor() + to.room_type().crowd_factor()) / 2.0
                }
            }
            TraversalPolicy::Wheelchair => {
                if edge.is_type(STAIRS) {
                    f64::INFINITY
                } else if edge.is_type(RAMP) {
                    base * 0.7
                } else if edge.is_type(ELEVATOR) {
                    base * 0.8
                } else if !from.accessible || !to.accessible {
                    base * 1.5
                } else {
                    base
                }
            }
            TraversalPolicy::VisuallyImpaired => {
                if edge.is_type(STAIRS) {
                    return base * 5.0;
                }
                if edge.is_type(ELEVATOR) || edge.is_type(RAMP) {
                    return base * 0.8;
                }
                let crowded =
                    base * from.room_type().crowd_factor() * to.room_type().crowd_factor();
                if edge.is_type(CORRIDOR) {
                    crowded * 0.9
                } else {
                    crowded
                }
            }
            TraversalPolicy::Emergency => base,
        }
    }

    /// Whether the policy permits `edge` to be part of a route.
    pub fn is_admissible(self, edge: &Path) -> bool {
        if edge.is_currently_blocked() {
            return false;
        }
        match self {
            TraversalPolicy::Standard | TraversalPolicy::Emergency => true,
            TraversalPolicy::Wheelchair => edge.accessible && !edge.is_type(STAIRS),
            TraversalPolicy::VisuallyImpaired => edge.accessible,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TraversalPolicy::Standard => "Standard",
            TraversalPolicy::Wheelchair => "Wheelchair User",
            TraversalPolicy::VisuallyImpaired => "Visually Impaired",
            TraversalPolicy::Emergency => "Emergency Mode",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TraversalPolicy::Standard => "Normal navigation with no special requirements",
            TraversalPolicy::Wheelchair => "Requires wheelchair accessible paths, no stairs",
            TraversalPolicy::VisuallyImpaired => {
                "Prefers wider corridors, avoids stairs, needs audio cues"
            }
            TraversalPolicy::Emergency => "Fastest route regardless of accessibility",
        }
    }

    pub fn persisted_name(self) -> &'static str {
        match self {
            TraversalPolicy::Standard => "STANDARD",
            TraversalPolicy::Wheelchair => "WHEELCHAIR",
            TraversalPolicy::VisuallyImpaired => "VISUALLY_IMPAIRED",
            TraversalPolicy::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for TraversalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown navigation mode: {0}")]
pub struct UnknownPolicy(pub String);

impl FromStr for TraversalPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TraversalPolicy::ALL
            .into_iter()
            .find(|p| {
                p.persisted_name().eq_ignore_ascii_case(s)
                    || p.display_name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| UnknownPolicy(s.to_string()))
    }
}
