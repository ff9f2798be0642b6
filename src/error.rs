use thiserror::Error;

use crate::arc_strategy::ArcType;
use crate::events::EntityKind;

/// Errors raised by structural edits on a [`crate::PetriNet`].
///
/// Every variant is recoverable: the call that produced it left the net
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("{arc_type} arc {arc} cannot connect a {source_kind} to a {target_kind}")]
    InvalidConnection {
        arc: String,
        arc_type: ArcType,
        source_kind: EntityKind,
        target_kind: EntityKind,
    },
    #[error("unknown {} `{id}`", kind_label(.kind))]
    UnknownEntityReference {
        /// `None` when any connectable kind would have done.
        kind: Option<EntityKind>,
        id: String,
    },
    #[error("unknown rate parameter `{0}`")]
    UnknownRateParameter(String),
    #[error("identifier `{0}` is already used in this net")]
    DuplicateIdentifier(String),
    #[error("token `{token}` is still referenced by {holder}")]
    TokenInUse { token: String, holder: String },
    #[error("rate parameter `{parameter}` is still referenced by transition {transition}")]
    RateParameterInUse {
        parameter: String,
        transition: String,
    },
    #[error("capacity exceeded at place {place}: {total} > {capacity}")]
    CapacityExceeded {
        place: String,
        total: u64,
        capacity: u64,
    },
    #[error("token counts at place {place} overflow")]
    MarkingOverflow { place: String },
    #[error("{kind} `{id}` has a non-finite coordinate")]
    NonFiniteCoordinate { kind: EntityKind, id: String },
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
}

impl NetError {
    pub(crate) fn unknown(kind: EntityKind, id: &str) -> Self {
        NetError::UnknownEntityReference { kind: Some(kind), id: id.to_string() }
    }

    pub(crate) fn unknown_entity(id: &str) -> Self {
        NetError::UnknownEntityReference { kind: None, id: id.to_string() }
    }
}

fn kind_label(kind: &Option<EntityKind>) -> String {
    kind.map_or_else(|| "entity".to_string(), |kind| kind.to_string())
}

/// Errors raised while reading or writing a net document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed document: {reason}")]
    Malformed { reason: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        DocumentError::Malformed {
            reason: reason.into(),
        }
    }
}

impl From<NetError> for DocumentError {
    fn from(err: NetError) -> Self {
        DocumentError::malformed(err.to_string())
    }
}

/// Errors raised while evaluating rate and weight expressions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("failed to compile `{expression}`: {message}")]
    Compile { expression: String, message: String },
    #[error("failed to evaluate `{expression}`: {message}")]
    Evaluate { expression: String, message: String },
    #[error("`{expression}` evaluated to {found}, expected a number")]
    NotNumeric { expression: String, found: String },
    #[error("`{expression}` refers to unknown place `{place}`")]
    UnknownPlace { expression: String, place: String },
    #[error(transparent)]
    Net(#[from] NetError),
}

pub type Result<T, E = NetError> = std::result::Result<T, E>;
