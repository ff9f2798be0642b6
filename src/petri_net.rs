//! The net aggregate.
//!
//! [`PetriNet`] exclusively owns every token class, rate parameter, place,
//! transition, arc and annotation of one model, keyed by id in insertion
//! order. Every public mutation validates first and applies second, so a
//! rejected call leaves the net untouched. Successful mutations queue one
//! [`NetEvent`] per observable change; the view layer drains the queue
//! after the call returns and must not mutate the net while handling it.
//!
//! The net holds no internal synchronisation. A multi-threaded host wraps it
//! in a single-writer lock.

use indexmap::IndexMap;
use log::{debug, warn};

use crate::config::NetConfig;
use crate::error::{NetError, Result};
use crate::events::{EntityKind, NetEvent};
use crate::model::{Annotation, Arc, ArcPoint, Place, Position, Rate, RateParameter, Rgb, Token, Transition};
use crate::naming;
use crate::paste::PasteBatch;

#[derive(Debug, Clone, Default)]
pub struct PetriNet {
    config: NetConfig,
    tokens: IndexMap<String, Token>,
    rate_parameters: IndexMap<String, RateParameter>,
    places: IndexMap<String, Place>,
    transitions: IndexMap<String, Transition>,
    arcs: IndexMap<String, Arc>,
    annotations: IndexMap<String, Annotation>,
    events: Vec<NetEvent>,
}

/// Model equality: same entities with the same attributes. Configuration and
/// pending notifications are not part of the model.
impl PartialEq for PetriNet {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
            && self.rate_parameters == other.rate_parameters
            && self.places == other.places
            && self.transitions == other.transitions
            && self.arcs == other.arcs
            && self.annotations == other.annotations
    }
}

fn rejected(err: &NetError) {
    warn!("rejected net edit: {err}");
}

impl PetriNet {
    pub fn new() -> Self {
        PetriNet::default()
    }

    pub fn with_config(config: NetConfig) -> Self {
        PetriNet { config, ..PetriNet::default() }
    }

    pub fn config(&self) -> NetConfig {
        self.config
    }

    // --- Lookup ---

    /// The kind of entity registered under `id`, if any.
    pub fn kind_of(&self, id: &str) -> Option<EntityKind> {
        if self.places.contains_key(id) {
            Some(EntityKind::Place)
        } else if self.transitions.contains_key(id) {
            Some(EntityKind::Transition)
        } else if self.arcs.contains_key(id) {
            Some(EntityKind::Arc)
        } else if self.tokens.contains_key(id) {
            Some(EntityKind::Token)
        } else if self.rate_parameters.contains_key(id) {
            Some(EntityKind::RateParameter)
        } else if self.annotations.contains_key(id) {
            Some(EntityKind::Annotation)
        } else {
            None
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn token(&self, id: &str) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn rate_parameter(&self, id: &str) -> Option<&RateParameter> {
        self.rate_parameters.get(id)
    }

    pub fn place(&self, id: &str) -> Option<&Place> {
        self.places.get(id)
    }

    pub fn transition(&self, id: &str) -> Option<&Transition> {
        self.transitions.get(id)
    }

    pub fn arc(&self, id: &str) -> Option<&Arc> {
        self.arcs.get(id)
    }

    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.get(id)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn rate_parameters(&self) -> impl Iterator<Item = &RateParameter> {
        self.rate_parameters.values()
    }

    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.places.values()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.values()
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values()
    }

    /// Arcs whose target is `id`.
    pub fn inbound_arcs<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc> + 'a {
        self.arcs.values().filter(move |arc| arc.target == id)
    }

    /// Arcs whose source is `id`.
    pub fn outbound_arcs<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Arc> + 'a {
        self.arcs.values().filter(move |arc| arc.source == id)
    }

    pub fn next_place_id(&self) -> String {
        naming::next_free_id("P", |id| self.contains(id))
    }

    pub fn next_transition_id(&self) -> String {
        naming::next_free_id("T", |id| self.contains(id))
    }

    pub fn next_annotation_id(&self) -> String {
        naming::next_free_id("A", |id| self.contains(id))
    }

    // --- Notifications ---

    /// Hands every queued notification to the caller, oldest first.
    pub fn drain_events(&mut self) -> Vec<NetEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[NetEvent] {
        &self.events
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear();
    }

    fn emit(&mut self, event: NetEvent) {
        debug!("{:?} {} `{}`", event.change, event.kind, event.id);
        self.events.push(event);
    }

    // --- Validation ---

    fn ensure_fresh_id(&self, id: &str) -> Result<()> {
        naming::validate_identifier(id)?;
        if self.contains(id) {
            return Err(NetError::DuplicateIdentifier(id.to_string()));
        }
        Ok(())
    }

    fn ensure_tokens_registered<'a>(&self, tokens: impl IntoIterator<Item = &'a String>) -> Result<()> {
        match tokens.into_iter().find(|token| !self.tokens.contains_key(token.as_str())) {
            Some(token) => Err(NetError::unknown(EntityKind::Token, token)),
            None => Ok(()),
        }
    }

    fn ensure_rate_resolves(&self, rate: &Rate) -> Result<()> {
        match rate {
            Rate::Parameter(id) if !self.rate_parameters.contains_key(id) => {
                Err(NetError::UnknownRateParameter(id.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Coordinates must be finite to survive a JSON round trip.
    fn ensure_finite(kind: EntityKind, id: &str, finite: bool) -> Result<()> {
        if finite {
            Ok(())
        } else {
            Err(NetError::NonFiniteCoordinate { kind, id: id.to_string() })
        }
    }

    fn existing_kind(&self, id: &str) -> Result<EntityKind> {
        self.kind_of(id).ok_or_else(|| NetError::unknown_entity(id))
    }

    fn validate_arc(&self, arc: &Arc) -> Result<()> {
        self.ensure_fresh_id(&arc.id)?;
        let finite = arc.points.iter().all(|point| point.position.is_finite());
        Self::ensure_finite(EntityKind::Arc, &arc.id, finite)?;
        let source_kind = self.existing_kind(&arc.source)?;
        let target_kind = self.existing_kind(&arc.target)?;
        if arc.source == arc.target || !arc.arc_type.is_valid_connection(source_kind, target_kind) {
            return Err(NetError::InvalidConnection {
                arc: arc.id.clone(),
                arc_type: arc.arc_type,
                source_kind,
                target_kind,
            });
        }
        self.ensure_tokens_registered(arc.weights.keys())
    }

    fn place_mut(&mut self, id: &str) -> Result<&mut Place> {
        self.places.get_mut(id).ok_or_else(|| NetError::unknown(EntityKind::Place, id))
    }

    fn transition_mut(&mut self, id: &str) -> Result<&mut Transition> {
        self.transitions
            .get_mut(id)
            .ok_or_else(|| NetError::unknown(EntityKind::Transition, id))
    }

    fn arc_mut(&mut self, id: &str) -> Result<&mut Arc> {
        self.arcs.get_mut(id).ok_or_else(|| NetError::unknown(EntityKind::Arc, id))
    }

    // --- Tokens ---

    pub fn add_token(&mut self, token: Token) -> Result<()> {
        self.ensure_fresh_id(&token.id).inspect_err(rejected)?;
        let id = token.id.clone();
        self.tokens.insert(id.clone(), token);
        self.emit(NetEvent::added(EntityKind::Token, id));
        Ok(())
    }

    /// Removes a token class nobody holds or weighs.
    ///
    /// Places with a non-zero count and arcs with any weight entry for the
    /// token keep it alive; the call then fails with
    /// [`NetError::TokenInUse`].
    pub fn remove_token(&mut self, id: &str) -> Result<Token> {
        self.check_token_unused(id).inspect_err(rejected)?;
        for place in self.places.values_mut() {
            place.token_counts.shift_remove(id);
        }
        let token = self
            .tokens
            .shift_remove(id)
            .ok_or_else(|| NetError::unknown(EntityKind::Token, id))?;
        self.emit(NetEvent::removed(EntityKind::Token, id));
        Ok(token)
    }

    fn check_token_unused(&self, id: &str) -> Result<()> {
        if !self.tokens.contains_key(id) {
            return Err(NetError::unknown(EntityKind::Token, id));
        }
        if let Some(place) = self.places.values().find(|place| place.token_count(id) > 0) {
            return Err(NetError::TokenInUse {
                token: id.to_string(),
                holder: format!("place {}", place.id),
            });
        }
        if let Some(arc) = self.arcs.values().find(|arc| arc.weights.contains_key(id)) {
            return Err(NetError::TokenInUse {
                token: id.to_string(),
                holder: format!("arc {}", arc.id),
            });
        }
        Ok(())
    }

    /// Updates the display attributes of a token class.
    pub fn set_token_display(&mut self, id: &str, enabled: bool, order: i32, color: Rgb) -> Result<()> {
        let token = self
            .tokens
            .get_mut(id)
            .ok_or_else(|| NetError::unknown(EntityKind::Token, id))
            .inspect_err(rejected)?;
        token.enabled = enabled;
        token.order = order;
        token.color = color;
        self.emit(NetEvent::changed(EntityKind::Token, id, "display"));
        Ok(())
    }

    // --- Rate parameters ---

    pub fn add_rate_parameter(&mut self, parameter: RateParameter) -> Result<()> {
        self.ensure_fresh_id(&parameter.id).inspect_err(rejected)?;
        let id = parameter.id.clone();
        self.rate_parameters.insert(id.clone(), parameter);
        self.emit(NetEvent::added(EntityKind::RateParameter, id));
        Ok(())
    }

    /// Fails with [`NetError::RateParameterInUse`] while a transition still
    /// refers to the parameter.
    pub fn remove_rate_parameter(&mut self, id: &str) -> Result<RateParameter> {
        let check = || {
            if !self.rate_parameters.contains_key(id) {
                return Err(NetError::UnknownRateParameter(id.to_string()));
            }
            match self.transitions.values().find(|t| t.rate_parameter() == Some(id)) {
                Some(transition) => Err(NetError::RateParameterInUse {
                    parameter: id.to_string(),
                    transition: transition.id.clone(),
                }),
                None => Ok(()),
            }
        };
        check().inspect_err(rejected)?;
        let parameter = self
            .rate_parameters
            .shift_remove(id)
            .ok_or_else(|| NetError::UnknownRateParameter(id.to_string()))?;
        self.emit(NetEvent::removed(EntityKind::RateParameter, id));
        Ok(parameter)
    }

    pub fn set_rate_parameter_expression(&mut self, id: &str, expression: impl Into<String>) -> Result<()> {
        let parameter = self
            .rate_parameters
            .get_mut(id)
            .ok_or_else(|| NetError::UnknownRateParameter(id.to_string()))
            .inspect_err(rejected)?;
        parameter.expression = expression.into();
        self.emit(NetEvent::changed(EntityKind::RateParameter, id, "expression"));
        Ok(())
    }

    // --- Places ---

    /// Registers a place. Its marking must use registered tokens and fit its
    /// capacity under the configured [`crate::CapacityPolicy`].
    pub fn add_place(&mut self, mut place: Place) -> Result<()> {
        let policy = self.config.capacity_policy;
        self.ensure_fresh_id(&place.id)
            .and_then(|_| {
                let finite = place.position.is_finite()
                    && place.name_offset.is_finite()
                    && place.marking_offset.is_finite();
                Self::ensure_finite(EntityKind::Place, &place.id, finite)
            })
            .and_then(|_| self.ensure_tokens_registered(place.token_counts.keys()))
            .and_then(|_| policy.enforce(&place.id, place.capacity, &mut place.token_counts))
            .inspect_err(rejected)?;
        let id = place.id.clone();
        self.places.insert(id.clone(), place);
        self.emit(NetEvent::added(EntityKind::Place, id));
        Ok(())
    }

    /// Removes a place after removing, one by one, every arc touching it.
    pub fn remove_place(&mut self, id: &str) -> Result<Place> {
        if !self.places.contains_key(id) {
            let err = NetError::unknown(EntityKind::Place, id);
            rejected(&err);
            return Err(err);
        }
        self.remove_incident_arcs(id);
        let place = self.places.shift_remove(id).ok_or_else(|| NetError::unknown(EntityKind::Place, id))?;
        self.emit(NetEvent::removed(EntityKind::Place, id));
        Ok(place)
    }

    /// Sets the count of one token class; zero drops the entry.
    pub fn set_token_count(&mut self, place_id: &str, token: &str, count: u64) -> Result<()> {
        let policy = self.config.capacity_policy;
        let counts = self
            .places
            .get(place_id)
            .ok_or_else(|| NetError::unknown(EntityKind::Place, place_id))
            .and_then(|place| {
                if !self.tokens.contains_key(token) {
                    return Err(NetError::unknown(EntityKind::Token, token));
                }
                let mut counts = place.token_counts.clone();
                if count == 0 {
                    counts.shift_remove(token);
                } else {
                    counts.insert(token.to_string(), count);
                }
                policy.enforce(place_id, place.capacity, &mut counts)?;
                Ok(counts)
            })
            .inspect_err(rejected)?;
        self.place_mut(place_id)?.token_counts = counts;
        self.emit(NetEvent::changed(EntityKind::Place, place_id, "tokenCounts"));
        Ok(())
    }

    pub fn set_place_capacity(&mut self, place_id: &str, capacity: u64) -> Result<()> {
        let policy = self.config.capacity_policy;
        let counts = self
            .places
            .get(place_id)
            .ok_or_else(|| NetError::unknown(EntityKind::Place, place_id))
            .and_then(|place| {
                let mut counts = place.token_counts.clone();
                policy.enforce(place_id, capacity, &mut counts)?;
                Ok(counts)
            })
            .inspect_err(rejected)?;
        let place = self.place_mut(place_id)?;
        let marking_changed = place.token_counts != counts;
        place.capacity = capacity;
        place.token_counts = counts;
        self.emit(NetEvent::changed(EntityKind::Place, place_id, "capacity"));
        if marking_changed {
            self.emit(NetEvent::changed(EntityKind::Place, place_id, "tokenCounts"));
        }
        Ok(())
    }

    // --- Transitions ---

    pub fn add_transition(&mut self, transition: Transition) -> Result<()> {
        self.ensure_fresh_id(&transition.id)
            .and_then(|_| {
                let finite = transition.position.is_finite() && transition.name_offset.is_finite();
                Self::ensure_finite(EntityKind::Transition, &transition.id, finite)
            })
            .and_then(|_| self.ensure_rate_resolves(transition.rate()))
            .inspect_err(rejected)?;
        let id = transition.id.clone();
        self.transitions.insert(id.clone(), transition);
        self.emit(NetEvent::added(EntityKind::Transition, id));
        Ok(())
    }

    /// Removes a transition after removing, one by one, every arc touching it.
    pub fn remove_transition(&mut self, id: &str) -> Result<Transition> {
        if !self.transitions.contains_key(id) {
            let err = NetError::unknown(EntityKind::Transition, id);
            rejected(&err);
            return Err(err);
        }
        self.remove_incident_arcs(id);
        let transition = self
            .transitions
            .shift_remove(id)
            .ok_or_else(|| NetError::unknown(EntityKind::Transition, id))?;
        self.emit(NetEvent::removed(EntityKind::Transition, id));
        Ok(transition)
    }

    pub fn set_transition_rate(&mut self, id: &str, rate: Rate) -> Result<()> {
        self.ensure_rate_resolves(&rate).inspect_err(rejected)?;
        self.transition_mut(id).inspect_err(rejected)?.set_rate(rate);
        self.emit(NetEvent::changed(EntityKind::Transition, id, "rate"));
        Ok(())
    }

    pub fn set_transition_timed(&mut self, id: &str, timed: bool) -> Result<()> {
        self.transition_mut(id).inspect_err(rejected)?.timed = timed;
        self.emit(NetEvent::changed(EntityKind::Transition, id, "timed"));
        Ok(())
    }

    pub fn set_transition_infinite_server(&mut self, id: &str, infinite_server: bool) -> Result<()> {
        self.transition_mut(id).inspect_err(rejected)?.infinite_server = infinite_server;
        self.emit(NetEvent::changed(EntityKind::Transition, id, "infiniteServer"));
        Ok(())
    }

    pub fn set_transition_priority(&mut self, id: &str, priority: u32) -> Result<()> {
        self.transition_mut(id).inspect_err(rejected)?.priority = priority;
        self.emit(NetEvent::changed(EntityKind::Transition, id, "priority"));
        Ok(())
    }

    pub fn set_transition_angle(&mut self, id: &str, angle: i32) -> Result<()> {
        self.transition_mut(id).inspect_err(rejected)?.angle = angle;
        self.emit(NetEvent::changed(EntityKind::Transition, id, "angle"));
        Ok(())
    }

    // --- Shared node attributes ---

    /// Moves a place, transition or annotation.
    pub fn set_position(&mut self, id: &str, position: Position) -> Result<()> {
        let kind = match self.kind_of(id) {
            Some(kind @ (EntityKind::Place | EntityKind::Transition | EntityKind::Annotation)) => kind,
            _ => {
                let err = NetError::unknown_entity(id);
                rejected(&err);
                return Err(err);
            }
        };
        Self::ensure_finite(kind, id, position.is_finite()).inspect_err(rejected)?;
        match kind {
            EntityKind::Place => self.place_mut(id)?.position = position,
            EntityKind::Transition => self.transition_mut(id)?.position = position,
            _ => {
                self.annotations
                    .get_mut(id)
                    .ok_or_else(|| NetError::unknown(EntityKind::Annotation, id))?
                    .position = position
            }
        }
        self.emit(NetEvent::changed(kind, id, "position"));
        Ok(())
    }

    /// Renames a place, transition or arc. Ids never change.
    pub fn set_name(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        naming::validate_identifier(&name).inspect_err(rejected)?;
        let kind = if let Some(place) = self.places.get_mut(id) {
            place.name = name;
            EntityKind::Place
        } else if let Some(transition) = self.transitions.get_mut(id) {
            transition.name = name;
            EntityKind::Transition
        } else if let Some(arc) = self.arcs.get_mut(id) {
            arc.name = name;
            EntityKind::Arc
        } else {
            let err = NetError::unknown_entity(id);
            rejected(&err);
            return Err(err);
        };
        self.emit(NetEvent::changed(kind, id, "name"));
        Ok(())
    }

    // --- Arcs ---

    /// Connects two registered nodes. The arc type decides which kinds may
    /// be joined; weights may only name registered tokens.
    pub fn add_arc(&mut self, arc: Arc) -> Result<()> {
        self.validate_arc(&arc).inspect_err(rejected)?;
        let id = arc.id.clone();
        self.arcs.insert(id.clone(), arc);
        self.emit(NetEvent::added(EntityKind::Arc, id));
        Ok(())
    }

    pub fn remove_arc(&mut self, id: &str) -> Result<Arc> {
        let arc = self
            .arcs
            .shift_remove(id)
            .ok_or_else(|| NetError::unknown(EntityKind::Arc, id))
            .inspect_err(rejected)?;
        self.emit(NetEvent::removed(EntityKind::Arc, id));
        Ok(arc)
    }

    fn remove_incident_arcs(&mut self, node: &str) {
        let incident: Vec<String> = self
            .arcs
            .values()
            .filter(|arc| arc.touches(node))
            .map(|arc| arc.id.clone())
            .collect();
        for id in incident {
            self.arcs.shift_remove(&id);
            self.emit(NetEvent::removed(EntityKind::Arc, id));
        }
    }

    pub fn set_arc_weight(&mut self, arc_id: &str, token: &str, expression: impl Into<String>) -> Result<()> {
        if !self.tokens.contains_key(token) {
            let err = NetError::unknown(EntityKind::Token, token);
            rejected(&err);
            return Err(err);
        }
        self.arc_mut(arc_id)
            .inspect_err(rejected)?
            .weights
            .insert(token.to_string(), expression.into());
        self.emit(NetEvent::changed(EntityKind::Arc, arc_id, "weights"));
        Ok(())
    }

    /// Drops the explicit weight so the arc type's default applies again.
    pub fn remove_arc_weight(&mut self, arc_id: &str, token: &str) -> Result<Option<String>> {
        let previous = self.arc_mut(arc_id).inspect_err(rejected)?.weights.shift_remove(token);
        if previous.is_some() {
            self.emit(NetEvent::changed(EntityKind::Arc, arc_id, "weights"));
        }
        Ok(previous)
    }

    pub fn set_arc_points(&mut self, arc_id: &str, points: Vec<ArcPoint>) -> Result<()> {
        let finite = points.iter().all(|point| point.position.is_finite());
        Self::ensure_finite(EntityKind::Arc, arc_id, finite).inspect_err(rejected)?;
        self.arc_mut(arc_id).inspect_err(rejected)?.points = points;
        self.emit(NetEvent::changed(EntityKind::Arc, arc_id, "points"));
        Ok(())
    }

    // --- Annotations ---

    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<()> {
        self.ensure_fresh_id(&annotation.id)
            .and_then(|_| {
                let finite = annotation.position.is_finite() && annotation.size.is_finite();
                Self::ensure_finite(EntityKind::Annotation, &annotation.id, finite)
            })
            .inspect_err(rejected)?;
        let id = annotation.id.clone();
        self.annotations.insert(id.clone(), annotation);
        self.emit(NetEvent::added(EntityKind::Annotation, id));
        Ok(())
    }

    pub fn remove_annotation(&mut self, id: &str) -> Result<Annotation> {
        let annotation = self
            .annotations
            .shift_remove(id)
            .ok_or_else(|| NetError::unknown(EntityKind::Annotation, id))
            .inspect_err(rejected)?;
        self.emit(NetEvent::removed(EntityKind::Annotation, id));
        Ok(annotation)
    }

    pub fn set_annotation_text(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        self.annotations
            .get_mut(id)
            .ok_or_else(|| NetError::unknown(EntityKind::Annotation, id))
            .inspect_err(rejected)?
            .text = text.into();
        self.emit(NetEvent::changed(EntityKind::Annotation, id, "text"));
        Ok(())
    }

    // --- Whole-entity operations ---

    /// Removes whatever entity is registered under `id`.
    pub fn remove(&mut self, id: &str) -> Result<EntityKind> {
        let kind = self.kind_of(id).ok_or_else(|| NetError::unknown_entity(id)).inspect_err(rejected)?;
        match kind {
            EntityKind::Place => self.remove_place(id).map(drop),
            EntityKind::Transition => self.remove_transition(id).map(drop),
            EntityKind::Arc => self.remove_arc(id).map(drop),
            EntityKind::Token => self.remove_token(id).map(drop),
            EntityKind::RateParameter => self.remove_rate_parameter(id).map(drop),
            EntityKind::Annotation => self.remove_annotation(id).map(drop),
        }?;
        Ok(kind)
    }

    /// Adds every clone of `batch`, or none of them.
    ///
    /// Places and transitions go first so that arcs find their endpoints;
    /// annotations go last.
    pub fn paste(&mut self, batch: PasteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut staged = self.clone();
        let PasteBatch { places, transitions, arcs, annotations } = batch;
        for place in places {
            staged.add_place(place)?;
        }
        for transition in transitions {
            staged.add_transition(transition)?;
        }
        for arc in arcs {
            staged.add_arc(arc)?;
        }
        for annotation in annotations {
            staged.add_annotation(annotation)?;
        }
        *self = staged;
        Ok(())
    }
}
