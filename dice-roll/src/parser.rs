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
    dice_types::{
        Comparison, Condition, DiceSpec, DiceType, Explode, Modifier, Operation, Reroll,
        RerollLimit, Term,
    },
    errors::RollError,
    limits::{DiceLimits, Limits},
    tokenizer::{Token, TokenKind},
};
use std::{convert::TryFrom, str::FromStr};

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{digit0, digit1},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{pair, preceded, tuple},
    IResult,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Selector {
    Higher,
    Lower,
}

/// A modifier suffix as written, before defaults are filled in.
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) enum Clause<'a> {
    Keep(Selector, &'a str),
    Drop(Selector, &'a str),
    Reroll(Option<&'a str>, Option<(Comparison, &'a str)>),
    Explode(bool, Option<(Comparison, &'a str)>),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct RawDice<'a> {
    count: &'a str,
    sides: &'a str,
    clauses: Vec<Clause<'a>>,
}

pub fn parse_comparison(input: &str) -> IResult<&str, Comparison> {
    alt((
        map(tag("<="), |_| Comparison::SmallerEq),
        map(tag(">="), |_| Comparison::BiggerEq),
        map(tag("<"), |_| Comparison::Smaller),
        map(tag(">"), |_| Comparison::Bigger),
        map(tag("="), |_| Comparison::Equal),
    ))(input)
}

pub fn parse_selector(input: &str) -> IResult<&str, Selector> {
    alt((
        map(tag_no_case("h"), |_| Selector::Higher),
        map(tag_no_case("l"), |_| Selector::Lower),
    ))(input)
}

fn parse_target(input: &str) -> IResult<&str, &str> {
    recognize(pair(opt(tag("-")), digit1))(input)
}

fn parse_condition(input: &str) -> IResult<&str, (Comparison, &str)> {
    pair(parse_comparison, parse_target)(input)
}

fn parse_keep(input: &str) -> IResult<&str, Clause> {
    map(
        preceded(tag_no_case("k"), pair(parse_selector, digit0)),
        |(selector, n)| Clause::Keep(selector, n),
    )(input)
}

fn parse_drop(input: &str) -> IResult<&str, Clause> {
    map(
        preceded(tag_no_case("d"), pair(parse_selector, digit0)),
        |(selector, n)| Clause::Drop(selector, n),
    )(input)
}

fn parse_reroll(input: &str) -> IResult<&str, Clause> {
    map(
        preceded(
            tag_no_case("r"),
            pair(opt(alt((digit1, tag_no_case("o")))), opt(parse_condition)),
        ),
        |(limit, condition)| Clause::Reroll(limit, condition),
    )(input)
}

fn parse_explode(input: &str) -> IResult<&str, Clause> {
    map(
        preceded(
            tag_no_case("e"),
            pair(
                opt(tag_no_case("o")),
                opt(alt((
                    parse_condition,
                    map(digit1, |target| (Comparison::Equal, target)),
                ))),
            ),
        ),
        |(once, condition)| Clause::Explode(once.is_some(), condition),
    )(input)
}

fn parse_clause(input: &str) -> IResult<&str, Clause> {
    alt((parse_keep, parse_drop, parse_reroll, parse_explode))(input)
}

pub fn parse_dice_sides(input: &str) -> IResult<&str, &str> {
    alt((digit1, tag_no_case("f"), tag("%")))(input)
}

/// `<count?>d<sides><clauses*>`, shared by the tokenizer and [`parse_dice_spec`].
pub(crate) fn parse_raw_dice(input: &str) -> IResult<&str, RawDice> {
    map(
        tuple((
            digit0,
            preceded(tag_no_case("d"), parse_dice_sides),
            many0(parse_clause),
        )),
        |(count, sides, clauses)| RawDice {
            count,
            sides,
            clauses,
        },
    )(input)
}

fn number<T: FromStr>(digits: &str, what: &str) -> Result<T, RollError> {
    digits
        .parse::<T>()
        .map_err(|_| RollError::parse(format!("{} out of range: {}", what, digits), 0))
}

fn count_or_one(digits: &str, what: &str) -> Result<u32, RollError> {
    if digits.is_empty() {
        Ok(1)
    } else {
        number(digits, what)
    }
}

fn condition(
    written: Option<(Comparison, &str)>,
    default_target: i64,
) -> Result<Condition, RollError> {
    match written {
        Some((comparison, target)) => Ok(Condition::new(
            comparison,
            number(target, "Condition target")?,
        )),
        None => Ok(Condition::new(Comparison::Equal, default_target)),
    }
}

/// Turns the text of a single dice term into a [`DiceSpec`].
///
/// Omitted counts default to one, an omitted reroll condition to the lowest face and an
/// omitted explode condition to the highest face. Error positions are relative to `text`.
pub fn parse_dice_spec(text: &str) -> Result<DiceSpec, RollError> {
    let (rest, raw) = parse_raw_dice(text)
        .map_err(|_| RollError::parse(format!("Invalid dice term '{}'", text), 0))?;
    if !rest.is_empty() {
        return Err(RollError::parse(
            format!("Unknown dice modifier '{}'", rest),
            text.len() - rest.len(),
        ));
    }

    let count: i64 = if raw.count.is_empty() {
        1
    } else {
        number(raw.count, "Dice count")?
    };
    let dice = if raw.sides.eq_ignore_ascii_case("f") {
        DiceType::Fudge
    } else if raw.sides == "%" {
        DiceType::Percentile
    } else {
        match number::<u32>(raw.sides, "Die sides")? {
            0 => return Err(RollError::parse("Zero-sided dice not allowed", 0)),
            n => DiceType::Number(n),
        }
    };

    let mut spec = DiceSpec::new(count, dice);
    let mut exploding = false;
    for clause in raw.clauses {
        let modifier = match clause {
            Clause::Keep(Selector::Higher, n) => {
                Modifier::KeepHighest(count_or_one(n, "Keep count")?)
            }
            Clause::Keep(Selector::Lower, n) => {
                Modifier::KeepLowest(count_or_one(n, "Keep count")?)
            }
            Clause::Drop(Selector::Higher, n) => {
                Modifier::DropHighest(count_or_one(n, "Drop count")?)
            }
            Clause::Drop(Selector::Lower, n) => {
                Modifier::DropLowest(count_or_one(n, "Drop count")?)
            }
            Clause::Reroll(limit, written) => {
                if dice == DiceType::Fudge {
                    return Err(RollError::parse(
                        "Reroll is not supported for fudge dice",
                        0,
                    ));
                }
                let limit = match limit {
                    None => RerollLimit::Unlimited,
                    Some(o) if o.eq_ignore_ascii_case("o") => RerollLimit::Once,
                    Some(n) => RerollLimit::Times(number(n, "Reroll limit")?),
                };
                Modifier::Reroll(Reroll {
                    condition: condition(written, dice.min())?,
                    limit,
                })
            }
            Clause::Explode(once, written) => {
                if exploding {
                    return Err(RollError::parse(
                        format!(
                            "Multiple explode conditions not allowed in dice expression: {}",
                            text
                        ),
                        0,
                    ));
                }
                exploding = true;
                Modifier::Explode(Explode {
                    condition: condition(written, dice.max())?,
                    once,
                })
            }
        };
        spec = spec.with(modifier);
    }
    Ok(spec)
}

/// Precedence climbing over a token slice.
struct TermParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Offset reported for errors at the end of input.
    end: usize,
    max_depth: usize,
}

impl<'t> TermParser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check_depth(&self, depth: usize, offset: usize) -> Result<(), RollError> {
        if depth > self.max_depth {
            Err(RollError::parse(
                format!("Expression nested too deeply (limit {})", self.max_depth),
                offset,
            ))
        } else {
            Ok(())
        }
    }

    /// Returns the parsed subtree and its depth. `nesting` counts enclosing parentheses.
    fn expression(
        &mut self,
        min_precedence: u8,
        negate_allowed: bool,
        nesting: usize,
    ) -> Result<(Term, usize), RollError> {
        let (mut left, mut depth) = self.operand(negate_allowed, nesting)?;
        while let Some(Token {
            kind: TokenKind::Operator(op),
            offset,
        }) = self.peek()
        {
            if op.precedence() < min_precedence {
                break;
            }
            self.advance();
            let (right, right_depth) = self.expression(op.precedence() + 1, false, nesting)?;
            depth = depth.max(right_depth) + 1;
            self.check_depth(depth, *offset)?;
            left = Term::calculation(left, *op, right, *offset);
        }
        Ok((left, depth))
    }

    fn operand(
        &mut self,
        negate_allowed: bool,
        nesting: usize,
    ) -> Result<(Term, usize), RollError> {
        let token = match self.advance() {
            Some(token) => token,
            None if self.pos == 0 => {
                return Err(RollError::parse_unpositioned("Empty expression"))
            }
            None => {
                return Err(RollError::parse(
                    "Trailing operator without operand",
                    self.end,
                ))
            }
        };
        match &token.kind {
            TokenKind::Number(n) => Ok((Term::Constant(*n), 0)),
            TokenKind::Dice(text) => parse_dice_spec(text)
                .map(|spec| (Term::DiceThrow(spec), 0))
                .map_err(|e| e.shifted(token.offset)),
            TokenKind::Operator(Operation::Sub) if negate_allowed => {
                let (inner, depth) = self.operand(false, nesting)?;
                self.check_depth(depth + 1, token.offset)?;
                Ok((Term::Negate(Box::new(inner)), depth + 1))
            }
            TokenKind::Operator(_) if self.pos == 1 => Err(RollError::parse(
                "Leading operator without operand",
                token.offset,
            )),
            TokenKind::Operator(_) => Err(RollError::parse(
                "Double operators not allowed",
                token.offset,
            )),
            TokenKind::LeftParen => {
                self.check_depth(nesting + 1, token.offset)?;
                let inner = self.expression(1, true, nesting + 1)?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(RollError::parse(
                        format!("Unexpected token '{}'", other),
                        other.offset,
                    )),
                    None => Err(RollError::parse("Missing closing parenthesis", self.end)),
                }
            }
            TokenKind::RightParen => Err(RollError::parse(
                "Unexpected closing parenthesis",
                token.offset,
            )),
        }
    }
}

/// Builds the expression tree for `tokens`. `end` is the length of the scanned string.
///
/// Parentheses and operator chains deeper than `limits.max_depth` are rejected.
pub fn parse_tokens(tokens: &[Token], end: usize, limits: &Limits) -> Result<Term, RollError> {
    let mut parser = TermParser {
        tokens,
        pos: 0,
        end,
        max_depth: usize::try_from(limits.max_depth).unwrap_or(usize::MAX),
    };
    let (term, _) = parser.expression(1, true, 0)?;
    match parser.peek() {
        None => Ok(term),
        Some(Token {
            kind: TokenKind::RightParen,
            offset,
        }) => Err(RollError::parse("Unbalanced closing parenthesis", *offset)),
        Some(other) => Err(RollError::parse(
            format!("Unexpected token '{}'", other),
            other.offset,
        )),
    }
}
