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
    dice_types::*,
    errors::RollError,
    limits::Limits,
    normalize::Flux,
    random::RandomSource,
    result::SingleRollResult,
};
use std::convert::TryFrom;

#[cfg(feature = "logging")]
use log::debug;

/// State shared by every node while one expression is evaluated.
pub(crate) struct Environment<'a, 'r> {
    limits: &'a Limits,
    rng: &'r mut dyn RandomSource,
    trace: Trace<'a>,
    results: Vec<SingleRollResult>,
}

impl<'a, 'r> Environment<'a, 'r> {
    pub(crate) fn new(limits: &'a Limits, rng: &'r mut dyn RandomSource, trace: Trace<'a>) -> Self {
        Environment {
            limits,
            rng,
            trace,
            results: Vec::new(),
        }
    }

    /// Dice results in the order their terms were evaluated.
    pub(crate) fn into_results(self) -> Vec<SingleRollResult> {
        self.results
    }

    fn roll_die(&mut self, dice: &DiceType) -> i64 {
        match dice {
            DiceType::Number(faces) => {
                let value = self.rng.uniform(1, i64::from(*faces));
                self.trace.roll(&format!("1d{}", faces), value);
                value
            }
            DiceType::Fudge => {
                let value = self.rng.uniform(-1, 1);
                self.trace.roll("1dF", value);
                value
            }
            DiceType::Percentile => {
                let tens = self.rng.uniform(0, 9) * 10;
                let ones = self.rng.uniform(0, 9);
                let value = match tens + ones {
                    0 => 100,
                    v => v,
                };
                self.trace.roll(
                    "1d%",
                    format!("{} (tens: {}, ones: {})", value, tens, ones),
                );
                value
            }
        }
    }

    fn reroll(&mut self, dice: &DiceType, reroll: &Reroll, kept: &mut [i64], all: &mut Vec<i64>) {
        let max = reroll.limit.max();
        for value in kept.iter_mut() {
            let mut times = 0u32;
            while reroll.condition.matches(*value) && max.map_or(true, |m| times < m) {
                let new = self.roll_die(dice);
                self.trace.log(format!("Rerolled {} -> {}", value, new));
                all.push(new);
                *value = new;
                times += 1;
            }
        }
    }

    fn explode(
        &mut self,
        dice: &DiceType,
        explode: &Explode,
        kept: &mut Vec<i64>,
        all: &mut Vec<i64>,
    ) {
        let depth = if explode.once {
            1
        } else {
            self.limits.explode_depth
        };
        let mut extra = Vec::new();
        for value in kept.iter() {
            let mut current = *value;
            let mut chain = 0u32;
            while chain < depth && explode.condition.matches(current) {
                let new = self.roll_die(dice);
                self.trace.log(format!("Exploded {} -> {}", current, new));
                extra.push(new);
                all.push(new);
                current = new;
                chain += 1;
            }
            if chain == depth && explode.condition.matches(current) {
                self.trace.log(format!("Explosion depth limit {} reached", depth));
            }
        }
        kept.extend(extra);
    }
}

fn as_len(n: u32) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn sort_descending(kept: &mut [i64]) {
    kept.sort_unstable_by(|a, b| b.cmp(a));
}

/// Applies a keep or drop clause to the currently kept values.
fn select(kept: &mut Vec<i64>, modifier: &Modifier) {
    match *modifier {
        Modifier::KeepHighest(n) if as_len(n) < kept.len() => {
            sort_descending(kept);
            kept.truncate(as_len(n));
        }
        Modifier::KeepLowest(n) if as_len(n) < kept.len() => {
            sort_descending(kept);
            let cut = kept.len() - as_len(n);
            kept.drain(..cut);
        }
        Modifier::DropHighest(n) if n > 0 => {
            sort_descending(kept);
            let cut = as_len(n).min(kept.len());
            kept.drain(..cut);
        }
        Modifier::DropLowest(n) if n > 0 => {
            sort_descending(kept);
            let keep = kept.len().saturating_sub(as_len(n));
            kept.truncate(keep);
        }
        _ => (),
    }
}

pub(crate) trait DiceEvaluate {
    fn evaluate(&self, env: &mut Environment) -> Result<SingleRollResult, RollError>;
}

impl DiceEvaluate for DiceSpec {
    fn evaluate(&self, env: &mut Environment) -> Result<SingleRollResult, RollError> {
        self.validate(env.limits)?;

        let mut kept = Vec::new();
        let mut all_rolls = Vec::new();
        for _ in 0..self.count.unsigned_abs() {
            let value = env.roll_die(&self.dice);
            kept.push(value);
            all_rolls.push(value);
        }

        for modifier in &self.modifiers {
            match modifier {
                Modifier::Reroll(reroll) => {
                    env.reroll(&self.dice, reroll, &mut kept, &mut all_rolls)
                }
                Modifier::Explode(explode) => {
                    env.explode(&self.dice, explode, &mut kept, &mut all_rolls)
                }
                keep_or_drop => select(&mut kept, keep_or_drop),
            }
            env.trace.log(format!("After {}: kept {:?}", modifier, kept));
        }

        let sum = kept
            .iter()
            .try_fold(0i64, |acc, value| acc.checked_add(*value))
            .ok_or(RollError::Overflow)?;
        let total = if self.count < 0 {
            sum.checked_neg().ok_or(RollError::Overflow)?
        } else {
            sum
        };

        #[cfg(feature = "logging")]
        {
            debug!("Dice roll result for {} is {:?} of {:?}", &self, &kept, &all_rolls);
        }

        Ok(SingleRollResult {
            count: self.count,
            dice: self.dice,
            label: self.to_string(),
            rolls: kept,
            all_rolls,
            total,
        })
    }
}

/// Value and rendered trace of an evaluated subtree.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct Evaluated {
    pub value: i64,
    pub description: String,
    /// Whether any dice were rolled below this node.
    pub dice: bool,
}

impl Evaluated {
    fn is_plain_integer(&self) -> bool {
        !self.dice && self.description.parse::<i64>().is_ok()
    }
}

fn floor_div(left: i64, right: i64, position: usize) -> Result<i64, RollError> {
    if right == 0 {
        return Err(RollError::DivisionByZero {
            position: Some(position),
        });
    }
    let quotient = left.checked_div(right).ok_or(RollError::Overflow)?;
    let remainder = left.checked_rem(right).ok_or(RollError::Overflow)?;
    if remainder != 0 && ((remainder < 0) != (right < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

fn describe(left: &Evaluated, op: Operation, right: &Evaluated) -> String {
    let symbol = op.symbol();
    if !left.dice && !right.dice {
        if matches!(op, Operation::Mul | Operation::Div)
            && left.is_plain_integer()
            && right.is_plain_integer()
        {
            return format!("({} {} {})", left.description, symbol, right.description);
        }
        return format!("{} {} {}", left.description, symbol, right.description);
    }
    let negative = right.value < 0 && right.description.starts_with('-');
    match op {
        Operation::Add if negative => format!("{} - {}", left.description, &right.description[1..]),
        Operation::Sub if negative => format!("{} + {}", left.description, &right.description[1..]),
        _ => format!("{} {} {}", left.description, symbol, right.description),
    }
}

/// Negated dice render as a subtraction from zero: `0 - 3 (1d6: 3)`.
fn describe_negation(inner: &Evaluated) -> String {
    if !inner.dice {
        format!("-{}", inner.description)
    } else if inner.value < 0 && inner.description.starts_with('-') {
        format!("0 + {}", &inner.description[1..])
    } else {
        format!("0 - {}", inner.description)
    }
}

pub(crate) trait TermEvaluate {
    fn evaluate(&self, env: &mut Environment) -> Result<Evaluated, RollError>;
}

impl TermEvaluate for Term {
    fn evaluate(&self, env: &mut Environment) -> Result<Evaluated, RollError> {
        let result = match self {
            Term::Constant(c) => Evaluated {
                value: *c,
                description: c.to_string(),
                dice: false,
            },
            Term::DiceThrow(spec) => {
                let rolled = spec.evaluate(env)?;
                let evaluated = Evaluated {
                    value: rolled.total,
                    description: rolled.to_string(),
                    dice: true,
                };
                env.results.push(rolled);
                evaluated
            }
            Term::Negate(inner) => {
                let inner = inner.evaluate(env)?;
                Evaluated {
                    value: inner.value.checked_neg().ok_or(RollError::Overflow)?,
                    description: describe_negation(&inner),
                    dice: inner.dice,
                }
            }
            Term::Calculation {
                left,
                op,
                right,
                position,
            } => {
                let left = left.evaluate(env)?;
                let right = right.evaluate(env)?;
                let value = match op {
                    Operation::Add => left.value.checked_add(right.value),
                    Operation::Sub => left.value.checked_sub(right.value),
                    Operation::Mul => left.value.checked_mul(right.value),
                    Operation::Div => Some(floor_div(left.value, right.value, *position)?),
                }
                .ok_or(RollError::Overflow)?;
                Evaluated {
                    value,
                    description: describe(&left, *op, &right),
                    dice: left.dice || right.dice,
                }
            }
        };
        #[cfg(feature = "logging")]
        {
            debug!("got {} for term {}", result.value, &self)
        }
        Ok(result)
    }
}

impl Flux {
    /// Rolls two d6 and orders them by the flux kind.
    pub(crate) fn evaluate(&self, env: &mut Environment) -> Evaluated {
        let a = env.roll_die(&DiceType::Number(6));
        let b = env.roll_die(&DiceType::Number(6));
        let (higher, lower) = if a >= b { (a, b) } else { (b, a) };
        let (first, second) = match self {
            Flux::Good => (higher, lower),
            Flux::Bad => (lower, higher),
        };
        let halves: Vec<SingleRollResult> = [first, second]
            .iter()
            .map(|value| SingleRollResult {
                count: 1,
                dice: DiceType::Number(6),
                label: "1d6".to_string(),
                rolls: vec![*value],
                all_rolls: vec![*value],
                total: *value,
            })
            .collect();
        let description = format!("{} - {}", halves[0], halves[1]);
        env.results.extend(halves);
        Evaluated {
            value: first - second,
            description,
            dice: true,
        }
    }
}
