//! Rate and arc-weight evaluation for simulators built on the model.
//!
//! Expressions are Rhai expressions extended with the functional marking
//! syntax of the editor: `#(P0)` is the total number of tokens in the place
//! named `P0`, `#(P0, red)` the number of `red` tokens there. References are
//! checked against the net and rewritten into lookups on two constants,
//! `marking` and `counts`, before compilation.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rhai::{Dynamic, Engine, Map, Scope};

use crate::error::{ExpressionError, NetError};
use crate::events::EntityKind;
use crate::model::Rate;
use crate::petri_net::PetriNet;

static MARKING_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#\(\s*([^,()]+?)\s*(?:,\s*([^,()]+?)\s*)?\)").expect("marking reference pattern")
});

fn quoted(s: &str) -> String {
    format!("{s:?}")
}

fn lookup(caps: &Captures<'_>) -> String {
    match caps.get(2) {
        Some(token) => format!("counts[{}][{}]", quoted(&caps[1]), quoted(token.as_str())),
        None => format!("marking[{}]", quoted(&caps[1])),
    }
}

/// Rewrites marking references into map lookups without checking them.
pub fn rewrite(expression: &str) -> String {
    MARKING_REF.replace_all(expression, |caps: &Captures<'_>| lookup(caps)).into_owned()
}

fn as_count(count: u64) -> Dynamic {
    Dynamic::from(i64::try_from(count).unwrap_or(i64::MAX))
}

pub struct ExpressionEngine {
    engine: Engine,
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        ExpressionEngine::new()
    }
}

impl ExpressionEngine {
    pub fn new() -> Self {
        ExpressionEngine { engine: Engine::new() }
    }

    /// Checks that `expression` compiles; marking references are not
    /// resolved.
    pub fn validate(&self, expression: &str) -> Result<(), ExpressionError> {
        self.engine
            .compile_expression(rewrite(expression))
            .map(drop)
            .map_err(|err| ExpressionError::Compile {
                expression: expression.to_string(),
                message: err.to_string(),
            })
    }

    /// Evaluates `expression` against the current marking of `net`.
    pub fn evaluate(&self, net: &PetriNet, expression: &str) -> Result<f64, ExpressionError> {
        for caps in MARKING_REF.captures_iter(expression) {
            let place_name = &caps[1];
            if !net.places().any(|place| place.name == place_name) {
                return Err(ExpressionError::UnknownPlace {
                    expression: expression.to_string(),
                    place: place_name.to_string(),
                });
            }
            if let Some(token) = caps.get(2) {
                if net.token(token.as_str()).is_none() {
                    return Err(NetError::unknown(EntityKind::Token, token.as_str()).into());
                }
            }
        }

        let ast = self
            .engine
            .compile_expression(rewrite(expression))
            .map_err(|err| ExpressionError::Compile {
                expression: expression.to_string(),
                message: err.to_string(),
            })?;

        let mut scope = Scope::new();
        scope.push_constant("marking", Self::marking(net));
        scope.push_constant("counts", Self::counts(net));

        let value = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|err| ExpressionError::Evaluate {
                expression: expression.to_string(),
                message: err.to_string(),
            })?;

        if let Ok(float) = value.as_float() {
            Ok(float)
        } else if let Ok(int) = value.as_int() {
            Ok(int as f64)
        } else {
            Err(ExpressionError::NotNumeric {
                expression: expression.to_string(),
                found: value.type_name().to_string(),
            })
        }
    }

    /// The firing rate of a transition, following its rate parameter if it
    /// has one.
    pub fn transition_rate(&self, net: &PetriNet, transition_id: &str) -> Result<f64, ExpressionError> {
        let transition = net
            .transition(transition_id)
            .ok_or_else(|| NetError::unknown(EntityKind::Transition, transition_id))?;
        let expression = match transition.rate() {
            Rate::Inline(expr) => expr.as_str(),
            Rate::Parameter(id) => net
                .rate_parameter(id)
                .map(|parameter| parameter.expression.as_str())
                .ok_or_else(|| NetError::UnknownRateParameter(id.clone()))?,
        };
        self.evaluate(net, expression)
    }

    /// The weight an arc puts on one token class, after the arc type's
    /// default is applied.
    pub fn arc_weight(&self, net: &PetriNet, arc_id: &str, token: &str) -> Result<f64, ExpressionError> {
        let arc = net.arc(arc_id).ok_or_else(|| NetError::unknown(EntityKind::Arc, arc_id))?;
        if net.token(token).is_none() {
            return Err(NetError::unknown(EntityKind::Token, token).into());
        }
        self.evaluate(net, arc.resolved_weight(token))
    }

    fn marking(net: &PetriNet) -> Map {
        net.places()
            .map(|place| (place.name.as_str().into(), as_count(place.total_tokens().unwrap_or(u64::MAX))))
            .collect()
    }

    fn counts(net: &PetriNet) -> Map {
        net.places()
            .map(|place| {
                let per_token: Map = net
                    .tokens()
                    .map(|token| (token.id.as_str().into(), as_count(place.token_count(&token.id))))
                    .collect();
                (place.name.as_str().into(), Dynamic::from_map(per_token))
            })
            .collect()
    }
}
