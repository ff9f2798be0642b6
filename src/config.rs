use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};
use crate::model::checked_total;

/// What happens when a marking would exceed a bounded place's capacity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CapacityPolicy {
    /// Reject the edit with [`NetError::CapacityExceeded`].
    #[default]
    Strict,
    /// Trim counts, most recently registered token class first, until the
    /// total fits.
    Clamp,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NetConfig {
    pub capacity_policy: CapacityPolicy,
}

impl NetConfig {
    pub fn clamping() -> Self {
        NetConfig { capacity_policy: CapacityPolicy::Clamp }
    }
}

impl CapacityPolicy {
    /// Brings `counts` within `capacity` (zero = unbounded) or explains why
    /// it cannot.
    pub(crate) fn enforce(
        self,
        place: &str,
        capacity: u64,
        counts: &mut IndexMap<String, u64>,
    ) -> Result<()> {
        let total = checked_total(counts).ok_or_else(|| NetError::MarkingOverflow {
            place: place.to_string(),
        })?;
        if capacity == 0 || total <= capacity {
            return Ok(());
        }
        match self {
            CapacityPolicy::Strict => Err(NetError::CapacityExceeded {
                place: place.to_string(),
                total,
                capacity,
            }),
            CapacityPolicy::Clamp => {
                let mut excess = total - capacity;
                for count in counts.values_mut().rev() {
                    let cut = excess.min(*count);
                    *count -= cut;
                    excess -= cut;
                    if excess == 0 {
                        break;
                    }
                }
                counts.retain(|_, count| *count > 0);
                log::debug!("clamped marking of place {place} to capacity {capacity}");
                Ok(())
            }
        }
    }
}
