/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use crate::{
    debug::Trace,
    errors::RollError,
    limits::Limits,
    random::RandomSource,
    result::{AppliedModifier, AppliedValue},
    Roller,
};
use std::{fmt, iter::FromIterator};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value of a named modifier, either a fixed number or a dice expression rolled separately.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ModifierValue {
    Static(i64),
    Expression(String),
}

impl From<i64> for ModifierValue {
    fn from(value: i64) -> Self {
        ModifierValue::Static(value)
    }
}

impl From<&str> for ModifierValue {
    fn from(expression: &str) -> Self {
        ModifierValue::Expression(expression.to_owned())
    }
}

impl From<String> for ModifierValue {
    fn from(expression: String) -> Self {
        ModifierValue::Expression(expression)
    }
}

impl fmt::Display for ModifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierValue::Static(value) => write!(f, "{}", value),
            ModifierValue::Expression(expression) => f.write_str(expression),
        }
    }
}

/// Named modifiers, applied in insertion order.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Modifiers(Vec<(String, ModifierValue)>);

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<N: Into<String>, V: Into<ModifierValue>>(mut self, name: N, value: V) -> Self {
        self.push(name, value);
        self
    }

    pub fn push<N: Into<String>, V: Into<ModifierValue>>(&mut self, name: N, value: V) {
        self.0.push((name.into(), value.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ModifierValue)> {
        self.0.iter()
    }

    /// Resolves every modifier, rolling expression modifiers through the full pipeline.
    pub(crate) fn resolve(
        &self,
        limits: &Limits,
        rng: &mut dyn RandomSource,
        trace: &Trace,
    ) -> Result<Vec<AppliedModifier>, RollError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        trace.step("MODIFIERS", format!("Processing {} modifiers", self.len()));
        let mut applied = Vec::with_capacity(self.len());
        for (name, value) in self.iter() {
            let modifier = match value {
                ModifierValue::Static(v) => AppliedModifier {
                    name: name.clone(),
                    value: AppliedValue::Static(*v),
                    contribution: *v,
                },
                ModifierValue::Expression(expression) => {
                    let trimmed = expression.trim();
                    let (negated, inner) = match trimmed.strip_prefix('-') {
                        Some(rest) => (true, rest),
                        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
                    };
                    let result = Roller::new().limits(*limits).evaluate(inner, rng, trace)?;
                    let contribution = if negated {
                        result.total().checked_neg().ok_or(RollError::Overflow)?
                    } else {
                        result.total()
                    };
                    AppliedModifier {
                        name: name.clone(),
                        value: AppliedValue::Rolled {
                            expression: inner.to_owned(),
                            negated,
                            result: Box::new(result),
                        },
                        contribution,
                    }
                }
            };
            trace.log(format!(
                "Added modifier '{}': {}",
                modifier.name, modifier.contribution
            ));
            applied.push(modifier);
        }
        Ok(applied)
    }
}

impl<N: Into<String>, V: Into<ModifierValue>> FromIterator<(N, V)> for Modifiers {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Modifiers(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
