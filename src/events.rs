use serde::Serialize;
use std::fmt;

/// The kinds of entity a net owns.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Place,
    Transition,
    Arc,
    Token,
    RateParameter,
    Annotation,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Place => "place",
            EntityKind::Transition => "transition",
            EntityKind::Arc => "arc",
            EntityKind::Token => "token",
            EntityKind::RateParameter => "rate parameter",
            EntityKind::Annotation => "annotation",
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Change {
    Added,
    Removed,
    Changed { field: String },
}

/// A single model change, queued by the net in the order it happened.
///
/// The view layer drains these after each mutating call; see
/// [`crate::PetriNet::drain_events`].
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetEvent {
    pub kind: EntityKind,
    pub id: String,
    pub change: Change,
}

impl NetEvent {
    pub fn added(kind: EntityKind, id: impl Into<String>) -> Self {
        NetEvent { kind, id: id.into(), change: Change::Added }
    }

    pub fn removed(kind: EntityKind, id: impl Into<String>) -> Self {
        NetEvent { kind, id: id.into(), change: Change::Removed }
    }

    pub fn changed(kind: EntityKind, id: impl Into<String>, field: &str) -> Self {
        NetEvent {
            kind,
            id: id.into(),
            change: Change::Changed { field: field.to_string() },
        }
    }
}
