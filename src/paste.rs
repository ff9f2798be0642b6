//! Copy/paste of a selected sub-net.
//!
//! [`PasteBatch::from_selection`] is a pure transform: it never touches a
//! net. Places, transitions and annotations are cloned with `_copied` ids and
//! names and shifted by the paste offset. Arcs are cloned with their
//! endpoints remapped onto the clones where the endpoint was selected too;
//! an unselected endpoint keeps its original id, so the pasted arc straddles
//! the old and the new sub-net. Arc points are not shifted, as arcs are
//! redrawn relative to their endpoints.

use std::collections::HashMap;

use crate::error::{NetError, Result};
use crate::events::EntityKind;
use crate::model::{Annotation, Arc, Place, Transition};
use crate::naming::copied;
use crate::petri_net::PetriNet;

/// Entities picked for copying, borrowed from one net.
#[derive(Debug, Clone, Default)]
pub struct Selection<'a> {
    pub places: Vec<&'a Place>,
    pub transitions: Vec<&'a Transition>,
    pub arcs: Vec<&'a Arc>,
    pub annotations: Vec<&'a Annotation>,
}

impl<'a> Selection<'a> {
    pub fn new() -> Self {
        Selection::default()
    }

    /// Selects the places, transitions, arcs and annotations named by `ids`.
    ///
    /// Token classes and rate parameters are net-wide and cannot be selected.
    pub fn from_ids<S: AsRef<str>>(net: &'a PetriNet, ids: &[S]) -> Result<Self> {
        let mut selection = Selection::new();
        for id in ids {
            let id = id.as_ref();
            if let Some(place) = net.place(id) {
                selection.places.push(place);
            } else if let Some(transition) = net.transition(id) {
                selection.transitions.push(transition);
            } else if let Some(arc) = net.arc(id) {
                selection.arcs.push(arc);
            } else if let Some(annotation) = net.annotation(id) {
                selection.annotations.push(annotation);
            } else {
                return Err(NetError::unknown_entity(id));
            }
        }
        Ok(selection)
    }

    pub fn with_place(mut self, place: &'a Place) -> Self {
        self.places.push(place);
        self
    }

    pub fn with_transition(mut self, transition: &'a Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_arc(mut self, arc: &'a Arc) -> Self {
        self.arcs.push(arc);
        self
    }

    pub fn with_annotation(mut self, annotation: &'a Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
            && self.transitions.is_empty()
            && self.arcs.is_empty()
            && self.annotations.is_empty()
    }
}

/// Clones ready to be added to a net, in the order they must be added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasteBatch {
    pub places: Vec<Place>,
    pub transitions: Vec<Transition>,
    pub arcs: Vec<Arc>,
    pub annotations: Vec<Annotation>,
}

impl PasteBatch {
    pub fn from_selection(selection: &Selection<'_>, offset: (f64, f64)) -> Self {
        let (dx, dy) = offset;
        // original node id -> clone id, local to this paste
        let mut remap: HashMap<&str, String> = HashMap::new();

        let places = selection
            .places
            .iter()
            .map(|place| {
                let clone = Place {
                    id: copied(&place.id),
                    name: copied(&place.name),
                    position: place.position.translated(dx, dy),
                    ..(*place).clone()
                };
                remap.insert(place.id.as_str(), clone.id.clone());
                clone
            })
            .collect();

        let transitions = selection
            .transitions
            .iter()
            .map(|transition| {
                let mut clone = (*transition).clone();
                clone.id = copied(&transition.id);
                clone.name = copied(&transition.name);
                clone.position = transition.position.translated(dx, dy);
                remap.insert(transition.id.as_str(), clone.id.clone());
                clone
            })
            .collect();

        let resolve = |endpoint: &str| remap.get(endpoint).cloned().unwrap_or_else(|| endpoint.to_string());
        let arcs = selection
            .arcs
            .iter()
            .map(|arc| Arc {
                id: copied(&arc.id),
                name: copied(&arc.name),
                source: resolve(&arc.source),
                target: resolve(&arc.target),
                ..(*arc).clone()
            })
            .collect();

        let annotations = selection
            .annotations
            .iter()
            .map(|annotation| Annotation {
                id: copied(&annotation.id),
                position: annotation.position.translated(dx, dy),
                ..(*annotation).clone()
            })
            .collect();

        PasteBatch { places, transitions, arcs, annotations }
    }

    pub fn len(&self) -> usize {
        self.places.len() + self.transitions.len() + self.arcs.len() + self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every clone, with their kinds.
    pub fn ids(&self) -> impl Iterator<Item = (EntityKind, &str)> {
        let places = self.places.iter().map(|p| (EntityKind::Place, p.id.as_str()));
        let transitions = self.transitions.iter().map(|t| (EntityKind::Transition, t.id.as_str()));
        let arcs = self.arcs.iter().map(|a| (EntityKind::Arc, a.id.as_str()));
        let annotations = self.annotations.iter().map(|a| (EntityKind::Annotation, a.id.as_str()));
        places.chain(transitions).chain(arcs).chain(annotations)
    }
}
