pub mod arc_strategy;
pub mod config;
pub mod error;
pub mod events;
pub mod expression;
pub mod io;
pub mod model;
pub mod naming;
pub mod paste;
mod petri_net;

pub use arc_strategy::ArcType;
pub use config::{CapacityPolicy, NetConfig};
pub use error::{DocumentError, ExpressionError, NetError};
pub use events::{Change, EntityKind, NetEvent};
pub use expression::ExpressionEngine;
pub use model::{Annotation, Arc, ArcPoint, Place, Position, Rate, RateParameter, Rgb, Size, Token, Transition};
pub use paste::{PasteBatch, Selection};
pub use petri_net::PetriNet;

// Conditionally include the wasm module only when targeting wasm32
cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "wasm32", feature = "wasm"))] {
        pub mod wasm;
    }
}

/// The editing facade used by the wasm and command-line front ends.
///
/// It owns one net loaded from a document and speaks in document strings and
/// plain ids, so front ends need not know the model types.
#[derive(Debug)]
pub struct CoreEditor {
    net: PetriNet,
}

impl CoreEditor {
    pub fn new(document: &str) -> Result<Self, String> {
        Self::with_config(document, NetConfig::default())
    }

    pub fn with_config(document: &str, config: NetConfig) -> Result<Self, String> {
        let net = io::from_json_str_with(document, config)
            .map_err(|e| format!("Failed to load net: {}", e))?;
        Ok(CoreEditor { net })
    }

    pub fn net(&self) -> &PetriNet {
        &self.net
    }

    pub fn to_json(&self) -> Result<String, String> {
        io::to_json_string(&self.net).map_err(|e| format!("Failed to write net: {}", e))
    }

    /// Copies the entities named by `ids` back into the net, shifted by
    /// `(dx, dy)`. Returns the ids of the clones.
    pub fn paste(&mut self, ids: &[String], dx: f64, dy: f64) -> Result<Vec<String>, String> {
        let selection = Selection::from_ids(&self.net, ids).map_err(|e| e.to_string())?;
        let batch = PasteBatch::from_selection(&selection, (dx, dy));
        let pasted = batch.ids().map(|(_, id)| id.to_string()).collect();
        self.net.paste(batch).map_err(|e| format!("Failed to paste: {}", e))?;
        Ok(pasted)
    }

    pub fn remove(&mut self, id: &str) -> Result<EntityKind, String> {
        self.net.remove(id).map_err(|e| e.to_string())
    }

    /// Notifications queued since the last call.
    pub fn drain_events(&mut self) -> Vec<NetEvent> {
        self.net.drain_events()
    }
}
