//! Identifier and display-name conventions.

use crate::error::{NetError, Result};

pub const COPY_SUFFIX: &str = "_copied";

/// Ids must be non-empty and carry no leading or trailing whitespace.
pub fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() || id.trim() != id {
        return Err(NetError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}

/// The id or name a pasted clone receives.
pub fn copied(original: &str) -> String {
    format!("{original}{COPY_SUFFIX}")
}

pub fn arc_id(source: &str, target: &str) -> String {
    format!("{source} TO {target}")
}

/// First `<prefix><n>` for which `is_taken` answers false.
pub fn next_free_id(prefix: &str, is_taken: impl Fn(&str) -> bool) -> String {
    (0..)
        .map(|n: u64| format!("{prefix}{n}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| prefix.to_string())
}
