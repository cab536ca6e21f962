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

/// Which dice mechanic an infinite condition was found on.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConditionKind {
    Reroll,
    Explode,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::Reroll => write!(f, "reroll"),
            ConditionKind::Explode => write!(f, "explode"),
        }
    }
}

/// Every way a single roll can fail. None of them leave partial results behind.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum RollError {
    #[error("{message}{}", .position.map(|p| format!(" at position {}", p)).unwrap_or_default())]
    Parse {
        message: String,
        position: Option<usize>,
    },

    #[error("Division by zero")]
    DivisionByZero { position: Option<usize> },

    #[error("Infinite {kind} condition in '{expression}': {reason}")]
    InfiniteCondition {
        kind: ConditionKind,
        expression: String,
        clause: String,
        reason: String,
    },

    #[error("Too many dice: {requested} requested, at most {limit} allowed")]
    TooManyDice { requested: u64, limit: u32 },

    #[error("Integer overflow while evaluating expression")]
    Overflow,
}

impl RollError {
    pub(crate) fn parse<S: ToString>(message: S, position: usize) -> RollError {
        RollError::Parse {
            message: message.to_string(),
            position: Some(position),
        }
    }

    pub(crate) fn parse_unpositioned<S: ToString>(message: S) -> RollError {
        RollError::Parse {
            message: message.to_string(),
            position: None,
        }
    }

    /// Offset into the normalized expression the error refers to, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            RollError::Parse { position, .. } | RollError::DivisionByZero { position } => {
                *position
            }
            RollError::InfiniteCondition { .. }
            | RollError::TooManyDice { .. }
            | RollError::Overflow => None,
        }
    }

    /// Shifts a positioned error by `offset`, used when a dice term is parsed on its own.
    pub(crate) fn shifted(self, offset: usize) -> RollError {
        match self {
            RollError::Parse {
                message,
                position: Some(p),
            } => RollError::Parse {
                message,
                position: Some(p + offset),
            },
            other => other,
        }
    }
}
