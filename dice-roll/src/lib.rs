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

//! Dice notation engine.
//!
//! An expression such as `4d6kh3+2` is normalized, tokenized, parsed into a [`Term`] tree and
//! evaluated against a [`RandomSource`]. Named [`Modifiers`] are rolled afterwards and added to
//! the total.
//!
//! ```
//! use dice_roll::{random::seeded, Modifiers, Roller};
//!
//! let result = Roller::new()
//!     .modifiers(Modifiers::new().with("Bless", "1d4"))
//!     .roll("1d20+5", &mut seeded(7))
//!     .unwrap();
//! assert!(result.total() >= 7 && result.total() <= 29);
//! ```

pub mod debug;
mod dice_roll;
pub mod dice_types;
pub mod errors;
pub mod limits;
pub mod modifiers;
mod normalize;
pub mod parser;
pub mod random;
pub mod result;
pub mod tokenizer;

pub use debug::{DebugSink, StringSink};
#[cfg(feature = "logging")]
pub use debug::LogSink;
pub use dice_types::{DiceSpec, DiceType, Modifier, Term};
pub use errors::{ConditionKind, RollError};
pub use limits::Limits;
pub use modifiers::{ModifierValue, Modifiers};
pub use normalize::SHORTHANDS;
pub use random::{RandomSource, RngSource};
pub use result::{AppliedModifier, AppliedValue, RollResultSet, SingleRollResult};

use crate::{
    debug::Trace,
    dice_roll::{Environment, TermEvaluate},
    normalize::{normalize, Normalized},
    parser::parse_tokens,
    tokenizer::tokenize,
};

/// Rolls `expression` with the generator of the current thread.
pub fn roll(expression: &str) -> Result<RollResultSet, RollError> {
    Roller::new().roll(expression, &mut random::thread_source())
}

/// Configures and performs rolls. Holds no random state of its own.
#[derive(Clone, Default)]
pub struct Roller<'a> {
    modifiers: Modifiers,
    limits: Limits,
    debug: Option<&'a dyn DebugSink>,
}

impl<'a> Roller<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Reports every pipeline step to `sink`.
    pub fn debug(mut self, sink: &'a dyn DebugSink) -> Self {
        self.debug = Some(sink);
        self
    }

    pub fn roll(
        &self,
        expression: &str,
        rng: &mut dyn RandomSource,
    ) -> Result<RollResultSet, RollError> {
        let trace = Trace::new(self.debug);
        trace.step("START", format!("Rolling expression: '{}'", expression));
        if !self.modifiers.is_empty() {
            trace.step("MODIFIERS", format!("Using modifiers: {}", self.modifiers));
        }
        match self.evaluate(expression, rng, &trace) {
            Ok(result) => {
                trace.step("COMPLETE", format!("Final result: {}", result.total()));
                Ok(result)
            }
            Err(e) => {
                trace.failure(&e);
                Err(e)
            }
        }
    }

    pub(crate) fn evaluate(
        &self,
        expression: &str,
        rng: &mut dyn RandomSource,
        trace: &Trace,
    ) -> Result<RollResultSet, RollError> {
        let (evaluated, results) = match normalize(expression, trace)? {
            Normalized::Flux(flux) => {
                let mut env = Environment::new(&self.limits, &mut *rng, *trace);
                let evaluated = flux.evaluate(&mut env);
                (evaluated, env.into_results())
            }
            Normalized::Expression(normalized) => {
                trace.step(
                    "TOKENIZING",
                    format!("Tokenizing expression: '{}'", normalized),
                );
                let tokens = tokenize(&normalized)?;
                trace.log(format!(
                    "Tokens: [{}]",
                    tokens
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
                trace.step("PARSING", "Parsing tokens with precedence rules");
                let term = parse_tokens(&tokens, normalized.len(), &self.limits)?;
                trace.log(format!("Parsed: {}", term));
                term.validate(&self.limits)?;
                trace.step("EVALUATING", "Evaluating parsed expression");
                let mut env = Environment::new(&self.limits, &mut *rng, *trace);
                let evaluated = term.evaluate(&mut env)?;
                (evaluated, env.into_results())
            }
        };
        trace.step(
            "RESULT",
            format!("Expression evaluated to: {}", evaluated.value),
        );
        let applied = self.modifiers.resolve(&self.limits, rng, trace)?;
        RollResultSet::new(evaluated.value, evaluated.description, results, applied)
    }
}
