use indexmap::IndexMap;

use crate::arc_strategy::ArcType;

// --- Geometry ---

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Position { x: self.x + dx, y: self.y + dy }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn is_finite(self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

pub const PLACE_NAME_OFFSET: Position = Position::new(5.0, 26.0);
pub const TRANSITION_NAME_OFFSET: Position = Position::new(-5.0, 35.0);

// --- Tokens and rates ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// A token class. Its id doubles as its display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub id: String,
    pub enabled: bool,
    pub order: i32,
    pub color: Rgb,
}

pub const DEFAULT_TOKEN: &str = "Default";

impl Token {
    pub fn new(id: impl Into<String>, enabled: bool, order: i32, color: Rgb) -> Self {
        Token { id: id.into(), enabled, order, color }
    }

    /// The black `Default` token every fresh editor net starts with.
    pub fn default_token() -> Self {
        Token::new(DEFAULT_TOKEN, true, 0, Rgb::BLACK)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateParameter {
    pub id: String,
    pub name: String,
    pub expression: String,
}

impl RateParameter {
    pub fn new(id: impl Into<String>, name: impl Into<String>, expression: impl Into<String>) -> Self {
        RateParameter { id: id.into(), name: name.into(), expression: expression.into() }
    }
}

/// A transition's rate: owned inline or borrowed from a shared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rate {
    Inline(String),
    Parameter(String),
}

impl Default for Rate {
    fn default() -> Self {
        Rate::Inline("1".to_string())
    }
}

// --- Nodes ---

pub(crate) fn checked_total(counts: &IndexMap<String, u64>) -> Option<u64> {
    counts.values().try_fold(0u64, |total, &count| total.checked_add(count))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub name_offset: Position,
    pub marking_offset: Position,
    /// Zero means unbounded.
    pub capacity: u64,
    pub token_counts: IndexMap<String, u64>,
}

impl Place {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Place {
            id: id.into(),
            name: name.into(),
            position: Position::default(),
            name_offset: PLACE_NAME_OFFSET,
            marking_offset: Position::default(),
            capacity: 0,
            token_counts: IndexMap::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_tokens(mut self, token: impl Into<String>, count: u64) -> Self {
        self.token_counts.insert(token.into(), count);
        self
    }

    pub fn token_count(&self, token: &str) -> u64 {
        self.token_counts.get(token).copied().unwrap_or(0)
    }

    /// `None` when the counts do not fit in a `u64`.
    pub fn total_tokens(&self) -> Option<u64> {
        checked_total(&self.token_counts)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub name_offset: Position,
    rate: Rate,
    pub timed: bool,
    pub infinite_server: bool,
    pub priority: u32,
    /// Rotation in degrees.
    pub angle: i32,
}

impl Transition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Transition {
            id: id.into(),
            name: name.into(),
            position: Position::default(),
            name_offset: TRANSITION_NAME_OFFSET,
            rate: Rate::default(),
            timed: false,
            infinite_server: false,
            priority: 1,
            angle: 0,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_rate(mut self, rate: Rate) -> Self {
        self.rate = rate;
        self
    }

    pub fn rate(&self) -> &Rate {
        &self.rate
    }

    /// Replaces the rate; the previous variant is dropped entirely.
    pub fn set_rate(&mut self, rate: Rate) {
        self.rate = rate;
    }

    /// The inline expression, `None` while a rate parameter is in use.
    pub fn rate_expr(&self) -> Option<&str> {
        match &self.rate {
            Rate::Inline(expr) => Some(expr),
            Rate::Parameter(_) => None,
        }
    }

    pub fn rate_parameter(&self) -> Option<&str> {
        match &self.rate {
            Rate::Parameter(id) => Some(id),
            Rate::Inline(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: String,
    pub position: Position,
    pub text: String,
    pub size: Size,
    pub border: bool,
}

impl Annotation {
    pub fn new(id: impl Into<String>, x: f64, y: f64, text: impl Into<String>, width: f64, height: f64, border: bool) -> Self {
        Annotation {
            id: id.into(),
            position: Position::new(x, y),
            text: text.into(),
            size: Size { width, height },
            border,
        }
    }
}

// --- Arcs ---

/// An intermediate routing point on an arc path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPoint {
    pub position: Position,
    pub curved: bool,
}

impl ArcPoint {
    pub fn new(x: f64, y: f64, curved: bool) -> Self {
        ArcPoint { position: Position::new(x, y), curved }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub id: String,
    pub name: String,
    pub arc_type: ArcType,
    /// Id of the source place or transition.
    pub source: String,
    /// Id of the target place or transition.
    pub target: String,
    /// Token id -> weight expression.
    pub weights: IndexMap<String, String>,
    pub points: Vec<ArcPoint>,
}

impl Arc {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        arc_type: ArcType,
    ) -> Self {
        let id = id.into();
        Arc {
            name: id.clone(),
            id,
            arc_type,
            source: source.into(),
            target: target.into(),
            weights: IndexMap::new(),
            points: Vec::new(),
        }
    }

    /// An arc named the conventional way, `"<source> TO <target>"`.
    pub fn between(source: impl Into<String>, target: impl Into<String>, arc_type: ArcType) -> Self {
        let (source, target) = (source.into(), target.into());
        Arc::new(crate::naming::arc_id(&source, &target), source, target, arc_type)
    }

    pub fn with_weight(mut self, token: impl Into<String>, expression: impl Into<String>) -> Self {
        self.weights.insert(token.into(), expression.into());
        self
    }

    pub fn with_point(mut self, point: ArcPoint) -> Self {
        self.points.push(point);
        self
    }

    pub fn resolved_weight(&self, token: &str) -> &str {
        self.arc_type.resolved_weight(self, token)
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_rate_variant_clears_the_other() {
        let mut transition = Transition::new("T0", "T0");
        assert_eq!(transition.rate_expr(), Some("1"));
        assert_eq!(transition.rate_parameter(), None);

        transition.set_rate(Rate::Parameter("foo".into()));
        assert_eq!(transition.rate_expr(), None);
        assert_eq!(transition.rate_parameter(), Some("foo"));

        transition.set_rate(Rate::Inline("2.5".into()));
        assert_eq!(transition.rate_expr(), Some("2.5"));
        assert_eq!(transition.rate_parameter(), None);
    }

    #[test]
    fn place_totals_all_token_classes() {
        let place = Place::new("P0", "P0").with_tokens("Default", 2).with_tokens("red", 3);
        assert_eq!(place.total_tokens(), Some(5));
        assert_eq!(place.token_count("red"), 3);
        assert_eq!(place.token_count("blue"), 0);

        let overfull = place.with_tokens("Default", u64::MAX);
        assert_eq!(overfull.total_tokens(), None);
    }
}
