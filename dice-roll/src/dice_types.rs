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

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sidedness of a die.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiceType {
    Number(u32),
    Fudge,
    Percentile,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Comparison {
    Bigger,
    BiggerEq,
    Smaller,
    SmallerEq,
    Equal,
}

impl Comparison {
    pub fn matches(&self, value: i64, target: i64) -> bool {
        match self {
            Comparison::Bigger => value > target,
            Comparison::BiggerEq => value >= target,
            Comparison::Smaller => value < target,
            Comparison::SmallerEq => value <= target,
            Comparison::Equal => value == target,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Condition {
    pub comparison: Comparison,
    pub target: i64,
}

impl Condition {
    pub fn new(comparison: Comparison, target: i64) -> Condition {
        Condition { comparison, target }
    }

    pub fn matches(&self, value: i64) -> bool {
        self.comparison.matches(value, self.target)
    }
}

/// How often a single die may be rerolled.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RerollLimit {
    Unlimited,
    Times(u32),
    /// `ro`, same as `r1` but keeps its spelling.
    Once,
}

impl RerollLimit {
    pub fn max(&self) -> Option<u32> {
        match self {
            RerollLimit::Unlimited => None,
            RerollLimit::Times(n) => Some(*n),
            RerollLimit::Once => Some(1),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reroll {
    pub condition: Condition,
    pub limit: RerollLimit,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Explode {
    pub condition: Condition,
    /// `eo`: at most one extra die per original die.
    pub once: bool,
}

/// One modifier clause of a dice term. Clauses apply in the order they were written.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Modifier {
    KeepHighest(u32),
    KeepLowest(u32),
    DropHighest(u32),
    DropLowest(u32),
    Reroll(Reroll),
    Explode(Explode),
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiceSpec {
    pub count: i64,
    pub dice: DiceType,
    pub modifiers: Vec<Modifier>,
}

impl DiceSpec {
    pub fn new(count: i64, dice: DiceType) -> DiceSpec {
        DiceSpec {
            count,
            dice,
            modifiers: Vec::new(),
        }
    }

    pub fn with(mut self, modifier: Modifier) -> DiceSpec {
        self.modifiers.push(modifier);
        self
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    Mul,
    Div,
    Add,
    Sub,
}

impl Operation {
    /// Binding strength for precedence climbing, higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            Operation::Add | Operation::Sub => 1,
            Operation::Mul | Operation::Div => 2,
        }
    }

    /// Symbol used in rendered descriptions.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "x",
            Operation::Div => "/",
        }
    }
}

/// Expression tree. Every node owns its children.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Term {
    Constant(i64),
    DiceThrow(DiceSpec),
    Negate(Box<Term>),
    Calculation {
        left: Box<Term>,
        op: Operation,
        right: Box<Term>,
        /// Offset of the operator in the normalized expression.
        position: usize,
    },
}

impl Term {
    pub fn calculation(left: Term, op: Operation, right: Term, position: usize) -> Term {
        Term::Calculation {
            left: Box::new(left),
            op,
            right: Box::new(right),
            position,
        }
    }
}

impl fmt::Display for DiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceType::Number(n) => write!(f, "{}", n),
            DiceType::Fudge => write!(f, "F"),
            DiceType::Percentile => write!(f, "%"),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Bigger => ">",
            Comparison::BiggerEq => ">=",
            Comparison::Smaller => "<",
            Comparison::SmallerEq => "<=",
            Comparison::Equal => "=",
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.comparison, self.target)
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::KeepHighest(n) => write!(f, "kh{}", n),
            Modifier::KeepLowest(n) => write!(f, "kl{}", n),
            Modifier::DropHighest(n) => write!(f, "dh{}", n),
            Modifier::DropLowest(n) => write!(f, "dl{}", n),
            Modifier::Reroll(Reroll { condition, limit }) => match limit {
                RerollLimit::Unlimited => write!(f, "r{}", condition),
                RerollLimit::Times(n) => write!(f, "r{}{}", n, condition),
                RerollLimit::Once => write!(f, "ro{}", condition),
            },
            Modifier::Explode(Explode { condition, once }) => {
                f.write_str(if *once { "eo" } else { "e" })?;
                // a plain target means "equals", which is how it is usually written
                if condition.comparison == Comparison::Equal {
                    write!(f, "{}", condition.target)
                } else {
                    write!(f, "{}", condition)
                }
            }
        }
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.dice)?;
        for modifier in &self.modifiers {
            write!(f, "{}", modifier)?;
        }
        Ok(())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(c) => write!(f, "{}", c),
            Term::DiceThrow(dice) => write!(f, "{}", dice),
            Term::Negate(term) => write!(f, "-{}", term),
            Term::Calculation {
                left, op, right, ..
            } => {
                let symbol = match op {
                    Operation::Mul => "*",
                    other => other.symbol(),
                };
                write!(f, "({} {} {})", left, symbol, right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dice_spec_display() {
        assert_eq!(DiceSpec::new(2, DiceType::Number(20)).to_string(), "2d20");
        assert_eq!(
            DiceSpec::new(4, DiceType::Number(6))
                .with(Modifier::KeepHighest(3))
                .to_string(),
            "4d6kh3"
        );
        assert_eq!(
            DiceSpec::new(1, DiceType::Number(6))
                .with(Modifier::Reroll(Reroll {
                    condition: Condition::new(Comparison::SmallerEq, 2),
                    limit: RerollLimit::Once,
                }))
                .with(Modifier::Explode(Explode {
                    condition: Condition::new(Comparison::Equal, 6),
                    once: false,
                }))
                .to_string(),
            "1d6ro<=2e6"
        );
        assert_eq!(
            DiceSpec::new(3, DiceType::Number(6))
                .with(Modifier::Reroll(Reroll {
                    condition: Condition::new(Comparison::Smaller, 3),
                    limit: RerollLimit::Times(2),
                }))
                .with(Modifier::Explode(Explode {
                    condition: Condition::new(Comparison::BiggerEq, 5),
                    once: true,
                }))
                .to_string(),
            "3d6r2<3eo>=5"
        );
        assert_eq!(DiceSpec::new(4, DiceType::Fudge).to_string(), "4dF");
        assert_eq!(DiceSpec::new(1, DiceType::Percentile).to_string(), "1d%");
    }

    #[test]
    fn test_term_display() {
        let term = Term::calculation(
            Term::DiceThrow(DiceSpec::new(2, DiceType::Number(6))),
            Operation::Add,
            Term::calculation(
                Term::Constant(3),
                Operation::Mul,
                Term::Negate(Box::new(Term::Constant(2))),
                6,
            ),
            3,
        );
        assert_eq!(term.to_string(), "(2d6 + (3 * -2))");
    }

    #[test]
    fn test_comparison() {
        assert!(Comparison::SmallerEq.matches(2, 2));
        assert!(!Comparison::Smaller.matches(2, 2));
        assert!(Comparison::Bigger.matches(3, 2));
        assert!(Comparison::BiggerEq.matches(2, 2));
        assert!(Comparison::Equal.matches(6, 6));
        assert!(!Comparison::Equal.matches(5, 6));
    }
}
