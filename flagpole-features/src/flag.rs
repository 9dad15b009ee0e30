//! Flags and the state decision.

use crate::condition::Condition;
use crate::context::EvaluationContext;
use crate::registry::ConditionRegistry;
use serde::{Deserialize, Serialize};

/// A named flag with every condition known for it, static ones first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    pub conditions: Vec<Condition>,
}

impl Flag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Decide the flag's state.
    ///
    /// A flag with no conditions is off. Otherwise every required condition
    /// must hold and at least one condition (required or not) must hold.
    pub fn check_state(&self, registry: &ConditionRegistry, ctx: &EvaluationContext) -> bool {
        decide(
            self.conditions
                .iter()
                .map(|c| (c.required, registry.check(&c.condition, &c.value, ctx))),
        )
    }

    /// State from boolean conditions alone, as shown by the admin toggle.
    pub fn boolean_state(&self, registry: &ConditionRegistry) -> bool {
        let ctx = EvaluationContext::new();
        decide(
            self.conditions
                .iter()
                .filter(|c| c.is_boolean())
                .map(|c| (c.required, registry.check(&c.condition, &c.value, &ctx))),
        )
    }

    pub fn static_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().filter(|c| c.stored_id().is_none())
    }

    pub fn stored_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().filter(|c| c.stored_id().is_some())
    }
}

/// Combine `(required, outcome)` pairs.
fn decide(outcomes: impl Iterator<Item = (bool, bool)>) -> bool {
    let mut any_true = false;
    for (required, outcome) in outcomes {
        if required && !outcome {
            return false;
        }
        any_true |= outcome;
    }
    any_true
}
