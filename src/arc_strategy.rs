//! Connection legality and weight policy per arc type.
//!
//! Each [`ArcType`] decides which `(source, target)` entity kinds it may
//! join and what weight applies to a token the arc carries no explicit
//! weight for. The net consults this table from `add_arc` instead of
//! branching on arc kinds itself.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::events::EntityKind;
use crate::model::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum ArcType {
    /// Place to transition or transition to place.
    #[default]
    Normal,
    /// Tests a place for emptiness; carries no tokens.
    Inhibitor,
    /// Tagged-net variant restricted to transition to place.
    ForwardNormal,
    /// Tagged-net variant restricted to place to transition.
    BackwardNormal,
}

pub const NORMAL_DEFAULT_WEIGHT: &str = "1";
pub const INHIBITOR_DEFAULT_WEIGHT: &str = "0";

impl ArcType {
    pub const ALL: [ArcType; 4] = [
        ArcType::Normal,
        ArcType::Inhibitor,
        ArcType::ForwardNormal,
        ArcType::BackwardNormal,
    ];

    pub fn is_valid_connection(self, source: EntityKind, target: EntityKind) -> bool {
        use EntityKind::{Place, Transition};
        match self {
            ArcType::Normal | ArcType::Inhibitor => {
                matches!((source, target), (Place, Transition) | (Transition, Place))
            }
            ArcType::ForwardNormal => matches!((source, target), (Transition, Place)),
            ArcType::BackwardNormal => matches!((source, target), (Place, Transition)),
        }
    }

    /// Weight applied to a token the arc has no explicit entry for.
    pub fn default_weight(self) -> &'static str {
        match self {
            ArcType::Inhibitor => INHIBITOR_DEFAULT_WEIGHT,
            ArcType::Normal | ArcType::ForwardNormal | ArcType::BackwardNormal => {
                NORMAL_DEFAULT_WEIGHT
            }
        }
    }

    pub fn resolved_weight<'a>(self, arc: &'a Arc, token: &str) -> &'a str {
        arc.weights
            .get(token)
            .map(String::as_str)
            .unwrap_or_else(|| self.default_weight())
    }
}

impl fmt::Display for ArcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArcType::Normal => "normal",
            ArcType::Inhibitor => "inhibitor",
            ArcType::ForwardNormal => "forward normal",
            ArcType::BackwardNormal => "backward normal",
        })
    }
}
