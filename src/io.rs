//! The persisted net document.
//!
//! A document is one JSON object listing, in this order, token classes,
//! places, transitions, rate parameters, arcs and annotations. The format is
//! closed: unknown keys are rejected at every level. Entities are written in
//! the net's insertion order and every attribute is written, except that a
//! transition carries exactly one of `rate` and `rateParameter`.
//!
//! Loading is all or nothing. The document is decoded, then replayed through
//! the net's own `add_*` operations into a fresh net; any schema or
//! referential violation discards that net and surfaces as
//! [`DocumentError::Malformed`].

use std::fs;
use std::path::Path;

use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};

use crate::arc_strategy::ArcType;
use crate::config::NetConfig;
use crate::error::DocumentError;
use crate::model::{Annotation, Arc, ArcPoint, Place, Position, Rate, RateParameter, Rgb, Size, Token, Transition};
use crate::petri_net::PetriNet;

// --- Document schema ---

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetDocument {
    pub tokens: Vec<TokenElement>,
    pub places: Vec<PlaceElement>,
    pub transitions: Vec<TransitionElement>,
    pub rate_parameters: Vec<RateParameterElement>,
    pub arcs: Vec<ArcElement>,
    pub annotations: Vec<AnnotationElement>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PointElement {
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColorElement {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TokenElement {
    pub id: String,
    pub enabled: bool,
    pub order: i32,
    pub color: ColorElement,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TokenCountElement {
    pub token: String,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaceElement {
    pub id: String,
    pub name: String,
    pub position: PointElement,
    pub name_offset: PointElement,
    pub marking_offset: PointElement,
    pub capacity: u64,
    pub token_counts: Vec<TokenCountElement>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransitionElement {
    pub id: String,
    pub name: String,
    pub position: PointElement,
    pub name_offset: PointElement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_parameter: Option<String>,
    pub timed: bool,
    pub infinite_server: bool,
    pub priority: u32,
    pub angle: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RateParameterElement {
    pub id: String,
    pub name: String,
    pub expression: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightElement {
    pub token: String,
    pub expression: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArcPointElement {
    pub x: f64,
    pub y: f64,
    pub curved: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArcElement {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub arc_type: ArcType,
    pub source: String,
    pub target: String,
    pub weights: Vec<WeightElement>,
    pub points: Vec<ArcPointElement>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SizeElement {
    pub width: f64,
    pub height: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnnotationElement {
    pub id: String,
    pub position: PointElement,
    pub text: String,
    pub size: SizeElement,
    pub border: bool,
}

// --- Model -> document ---

impl From<Position> for PointElement {
    fn from(p: Position) -> Self {
        PointElement { x: p.x, y: p.y }
    }
}

impl From<PointElement> for Position {
    fn from(p: PointElement) -> Self {
        Position::new(p.x, p.y)
    }
}

impl From<&Token> for TokenElement {
    fn from(token: &Token) -> Self {
        let Rgb { r, g, b } = token.color;
        TokenElement {
            id: token.id.clone(),
            enabled: token.enabled,
            order: token.order,
            color: ColorElement { r, g, b },
        }
    }
}

impl From<&Place> for PlaceElement {
    fn from(place: &Place) -> Self {
        PlaceElement {
            id: place.id.clone(),
            name: place.name.clone(),
            position: place.position.into(),
            name_offset: place.name_offset.into(),
            marking_offset: place.marking_offset.into(),
            capacity: place.capacity,
            token_counts: place
                .token_counts
                .iter()
                .map(|(token, &count)| TokenCountElement { token: token.clone(), count })
                .collect(),
        }
    }
}

impl From<&Transition> for TransitionElement {
    fn from(transition: &Transition) -> Self {
        TransitionElement {
            id: transition.id.clone(),
            name: transition.name.clone(),
            position: transition.position.into(),
            name_offset: transition.name_offset.into(),
            rate: transition.rate_expr().map(str::to_string),
            rate_parameter: transition.rate_parameter().map(str::to_string),
            timed: transition.timed,
            infinite_server: transition.infinite_server,
            priority: transition.priority,
            angle: transition.angle,
        }
    }
}

impl From<&RateParameter> for RateParameterElement {
    fn from(parameter: &RateParameter) -> Self {
        RateParameterElement {
            id: parameter.id.clone(),
            name: parameter.name.clone(),
            expression: parameter.expression.clone(),
        }
    }
}

impl From<&Arc> for ArcElement {
    fn from(arc: &Arc) -> Self {
        ArcElement {
            id: arc.id.clone(),
            name: arc.name.clone(),
            arc_type: arc.arc_type,
            source: arc.source.clone(),
            target: arc.target.clone(),
            weights: arc
                .weights
                .iter()
                .map(|(token, expression)| WeightElement { token: token.clone(), expression: expression.clone() })
                .collect(),
            points: arc
                .points
                .iter()
                .map(|point| ArcPointElement { x: point.position.x, y: point.position.y, curved: point.curved })
                .collect(),
        }
    }
}

impl From<&Annotation> for AnnotationElement {
    fn from(annotation: &Annotation) -> Self {
        AnnotationElement {
            id: annotation.id.clone(),
            position: annotation.position.into(),
            text: annotation.text.clone(),
            size: SizeElement { width: annotation.size.width, height: annotation.size.height },
            border: annotation.border,
        }
    }
}

impl From<&PetriNet> for NetDocument {
    fn from(net: &PetriNet) -> Self {
        NetDocument {
            tokens: net.tokens().map(TokenElement::from).collect(),
            places: net.places().map(PlaceElement::from).collect(),
            transitions: net.transitions().map(TransitionElement::from).collect(),
            rate_parameters: net.rate_parameters().map(RateParameterElement::from).collect(),
            arcs: net.arcs().map(ArcElement::from).collect(),
            annotations: net.annotations().map(AnnotationElement::from).collect(),
        }
    }
}

// --- Document -> model ---

fn duplicate_keys<'a>(keys: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    keys.duplicates().next()
}

impl TransitionElement {
    fn into_transition(self) -> Result<Transition, DocumentError> {
        let rate = match (self.rate, self.rate_parameter) {
            (Some(expr), None) => Rate::Inline(expr),
            (None, Some(parameter)) => Rate::Parameter(parameter),
            (Some(_), Some(_)) => {
                return Err(DocumentError::malformed(format!(
                    "transition {} has both rate and rateParameter",
                    self.id
                )))
            }
            (None, None) => {
                return Err(DocumentError::malformed(format!(
                    "transition {} has neither rate nor rateParameter",
                    self.id
                )))
            }
        };
        let mut transition = Transition::new(self.id, self.name).with_rate(rate);
        transition.position = self.position.into();
        transition.name_offset = self.name_offset.into();
        transition.timed = self.timed;
        transition.infinite_server = self.infinite_server;
        transition.priority = self.priority;
        transition.angle = self.angle;
        Ok(transition)
    }
}

impl PlaceElement {
    fn into_place(self) -> Result<Place, DocumentError> {
        if let Some(token) = duplicate_keys(self.token_counts.iter().map(|c| c.token.as_str())) {
            return Err(DocumentError::malformed(format!(
                "place {} lists token {token} more than once",
                self.id
            )));
        }
        let mut place = Place::new(self.id, self.name).with_capacity(self.capacity);
        place.position = self.position.into();
        place.name_offset = self.name_offset.into();
        place.marking_offset = self.marking_offset.into();
        place.token_counts = self.token_counts.into_iter().map(|c| (c.token, c.count)).collect();
        Ok(place)
    }
}

impl ArcElement {
    fn into_arc(self) -> Result<Arc, DocumentError> {
        if let Some(token) = duplicate_keys(self.weights.iter().map(|w| w.token.as_str())) {
            return Err(DocumentError::malformed(format!(
                "arc {} weighs token {token} more than once",
                self.id
            )));
        }
        let mut arc = Arc::new(self.id, self.source, self.target, self.arc_type);
        arc.name = self.name;
        arc.weights = self.weights.into_iter().map(|w| (w.token, w.expression)).collect();
        arc.points = self
            .points
            .into_iter()
            .map(|p| ArcPoint::new(p.x, p.y, p.curved))
            .collect();
        Ok(arc)
    }
}

impl NetDocument {
    /// Rebuilds a net, replaying every element through the net's own checks.
    pub fn into_net(self, config: NetConfig) -> Result<PetriNet, DocumentError> {
        let mut net = PetriNet::with_config(config);
        for token in self.tokens {
            let ColorElement { r, g, b } = token.color;
            net.add_token(Token::new(token.id, token.enabled, token.order, Rgb::new(r, g, b)))?;
        }
        for parameter in self.rate_parameters {
            net.add_rate_parameter(RateParameter::new(parameter.id, parameter.name, parameter.expression))?;
        }
        for place in self.places {
            net.add_place(place.into_place()?)?;
        }
        for transition in self.transitions {
            net.add_transition(transition.into_transition()?)?;
        }
        for arc in self.arcs {
            net.add_arc(arc.into_arc()?)?;
        }
        for annotation in self.annotations {
            net.add_annotation(Annotation {
                id: annotation.id,
                position: annotation.position.into(),
                text: annotation.text,
                size: Size { width: annotation.size.width, height: annotation.size.height },
                border: annotation.border,
            })?;
        }
        net.clear_events();
        Ok(net)
    }
}

// --- Entry points ---

pub fn to_json_value(net: &PetriNet) -> Result<serde_json::Value, DocumentError> {
    Ok(serde_json::to_value(NetDocument::from(net))?)
}

pub fn to_json_string(net: &PetriNet) -> Result<String, DocumentError> {
    let document = NetDocument::from(net);
    info!(
        "writing net: {} tokens, {} places, {} transitions, {} arcs",
        document.tokens.len(),
        document.places.len(),
        document.transitions.len(),
        document.arcs.len()
    );
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn from_json_str(s: &str) -> Result<PetriNet, DocumentError> {
    from_json_str_with(s, NetConfig::default())
}

pub fn from_json_str_with(s: &str, config: NetConfig) -> Result<PetriNet, DocumentError> {
    let document: NetDocument = serde_json::from_str(s).map_err(|err| {
        if err.is_data() {
            DocumentError::malformed(err.to_string())
        } else {
            DocumentError::Json(err)
        }
    })?;
    let net = document.into_net(config)?;
    info!(
        "loaded net: {} tokens, {} places, {} transitions, {} arcs",
        net.tokens().count(),
        net.places().count(),
        net.transitions().count(),
        net.arcs().count()
    );
    Ok(net)
}

pub fn write_json<P: AsRef<Path>>(path: P, net: &PetriNet) -> Result<(), DocumentError> {
    fs::write(path, to_json_string(net)?)?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>>(path: P) -> Result<PetriNet, DocumentError> {
    read_json_with(path, NetConfig::default())
}

pub fn read_json_with<P: AsRef<Path>>(path: P, config: NetConfig) -> Result<PetriNet, DocumentError> {
    let content = fs::read_to_string(path)?;
    from_json_str_with(&content, config)
}
