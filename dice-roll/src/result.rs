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

use crate::{dice_types::DiceType, errors::RollError};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of a single dice term.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SingleRollResult {
    pub count: i64,
    pub dice: DiceType,
    /// Term as written with defaults filled in, e.g. `1d6e6`.
    pub label: String,
    /// Values still counted after every clause, in kept order.
    pub rolls: Vec<i64>,
    /// Every value rolled, rerolls and explosions included, in roll order.
    pub all_rolls: Vec<i64>,
    pub total: i64,
}

fn face(dice: &DiceType, value: i64) -> String {
    match dice {
        DiceType::Number(_) => value.to_string(),
        DiceType::Fudge => match value {
            v if v < 0 => "-".to_string(),
            0 => "B".to_string(),
            _ => "+".to_string(),
        },
        DiceType::Percentile => {
            let (tens, ones) = if value == 100 {
                (0, 0)
            } else {
                (value / 10 * 10, value % 10)
            };
            format!("[{:02}, {}]", tens, ones)
        }
    }
}

impl SingleRollResult {
    /// Every rolled value, rendered the way the die shows it.
    pub fn faces(&self) -> String {
        self.all_rolls
            .iter()
            .map(|value| face(&self.dice, *value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SingleRollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_rolls.is_empty() {
            write!(f, "{} ({})", self.total, self.label)
        } else {
            write!(f, "{} ({}: {})", self.total, self.label, self.faces())
        }
    }
}

/// What a named modifier resolved to.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AppliedValue {
    Static(i64),
    Rolled {
        expression: String,
        negated: bool,
        result: Box<RollResultSet>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AppliedModifier {
    pub name: String,
    pub value: AppliedValue,
    /// Amount added to the grand total.
    pub contribution: i64,
}

impl fmt::Display for AppliedModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            AppliedValue::Static(value) => {
                let sign = if *value < 0 { "-" } else { "+" };
                write!(f, "{} {}", sign, value.unsigned_abs())?;
                if !self.name.is_empty() {
                    write!(f, " ({})", self.name)?;
                }
                Ok(())
            }
            AppliedValue::Rolled {
                negated, result, ..
            } => {
                let sign = if *negated { "-" } else { "+" };
                if self.name.is_empty() {
                    write!(f, "{} {} ({})", sign, result.total(), result)
                } else {
                    write!(f, "{} {} ({}: {})", sign, result.total(), self.name, result)
                }
            }
        }
    }
}

/// Everything one call to roll produced. Built once, read only afterwards.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RollResultSet {
    total: i64,
    subtotal: i64,
    results: Vec<SingleRollResult>,
    modifiers: Vec<AppliedModifier>,
    description: String,
}

impl RollResultSet {
    /// `expression` is the rendered main expression, without the leading total.
    pub(crate) fn new(
        subtotal: i64,
        expression: String,
        results: Vec<SingleRollResult>,
        modifiers: Vec<AppliedModifier>,
    ) -> Result<RollResultSet, RollError> {
        let total = modifiers
            .iter()
            .try_fold(subtotal, |acc, modifier| acc.checked_add(modifier.contribution))
            .ok_or(RollError::Overflow)?;
        let mut parts = vec![expression];
        parts.extend(modifiers.iter().map(|modifier| modifier.to_string()));
        let description = format!("{} = {}", total, parts.join(" "));
        Ok(RollResultSet {
            total,
            subtotal,
            results,
            modifiers,
            description,
        })
    }

    /// Grand total, modifiers included.
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Value of the main expression alone.
    pub fn subtotal(&self) -> i64 {
        self.subtotal
    }

    /// One entry per dice term, in evaluation order.
    pub fn results(&self) -> &[SingleRollResult] {
        &self.results
    }

    pub fn modifiers(&self) -> &[AppliedModifier] {
        &self.modifiers
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for RollResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
