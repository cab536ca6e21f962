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

use crate::dice_types::*;
use crate::errors::{ConditionKind, RollError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub trait DiceLimits {
    fn min(&self) -> i64;
    fn max(&self) -> i64;
}

impl DiceLimits for DiceType {
    fn min(&self) -> i64 {
        match self {
            DiceType::Number(_) => 1,
            DiceType::Fudge => -1,
            DiceType::Percentile => 1,
        }
    }

    fn max(&self) -> i64 {
        match self {
            DiceType::Number(n) => (*n).into(),
            DiceType::Fudge => 1,
            DiceType::Percentile => 100,
        }
    }
}

/// Runtime bounds for a single roll.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Limits {
    /// Maximum number of extra dice a single die may explode into.
    pub explode_depth: u32,
    /// Deepest expression tree accepted, counting parentheses and chained operators.
    pub max_depth: u32,
    /// Most dice a single term may roll before rerolls and explosions.
    pub max_dice: u32,
}

pub const DEFAULT_EXPLODE_DEPTH: u32 = 100;
pub const DEFAULT_MAX_DEPTH: u32 = 256;
pub const DEFAULT_MAX_DICE: u32 = 10_000;

impl Default for Limits {
    fn default() -> Self {
        Limits {
            explode_depth: DEFAULT_EXPLODE_DEPTH,
            max_depth: DEFAULT_MAX_DEPTH,
            max_dice: DEFAULT_MAX_DICE,
        }
    }
}

impl Condition {
    /// True if every face between `min` and `max` satisfies the condition.
    pub fn covers(&self, min: i64, max: i64) -> bool {
        let t = self.target;
        match self.comparison {
            Comparison::SmallerEq => t >= max,
            Comparison::Smaller => t > max,
            Comparison::BiggerEq => t <= min,
            Comparison::Bigger => t < min,
            Comparison::Equal => min == max && t == min,
        }
    }
}

fn face_range(dice: &DiceType) -> String {
    if dice.min() == dice.max() {
        format!("{}", dice.min())
    } else {
        format!("{}-{}", dice.min(), dice.max())
    }
}

impl DiceSpec {
    /// Rejects reroll and explode clauses that every face would trigger.
    pub fn check_conditions(&self) -> Result<(), RollError> {
        for modifier in &self.modifiers {
            let (kind, condition) = match modifier {
                Modifier::Reroll(r) => (ConditionKind::Reroll, r.condition),
                Modifier::Explode(e) => (ConditionKind::Explode, e.condition),
                _ => continue,
            };
            if condition.covers(self.dice.min(), self.dice.max()) {
                return Err(RollError::InfiniteCondition {
                    kind,
                    expression: self.to_string(),
                    clause: modifier.to_string(),
                    reason: format!(
                        "condition '{} {}' matches all possible rolls ({})",
                        condition.comparison,
                        condition.target,
                        face_range(&self.dice)
                    ),
                });
            }
        }
        Ok(())
    }
}

impl DiceSpec {
    /// Checks the dice count and every condition without rolling anything.
    pub fn validate(&self, limits: &Limits) -> Result<(), RollError> {
        let requested = self.count.unsigned_abs();
        if requested > u64::from(limits.max_dice) {
            return Err(RollError::TooManyDice {
                requested,
                limit: limits.max_dice,
            });
        }
        self.check_conditions()
    }
}

impl Term {
    /// Validates every dice term of the tree, in evaluation order.
    pub fn validate(&self, limits: &Limits) -> Result<(), RollError> {
        match self {
            Term::Constant(_) => Ok(()),
            Term::DiceThrow(spec) => spec.validate(limits),
            Term::Negate(inner) => inner.validate(limits),
            Term::Calculation { left, right, .. } => {
                left.validate(limits)?;
                right.validate(limits)
            }
        }
    }
}
