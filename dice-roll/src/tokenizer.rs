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

use crate::{dice_types::Operation, errors::RollError, parser::parse_raw_dice};
use std::fmt;

use nom::{character::complete::digit1, combinator::recognize};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Number(i64),
    /// Raw dice term including its modifier suffixes, e.g. `4d6kh3`.
    Dice(String),
    Operator(Operation),
    LeftParen,
    RightParen,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset into the scanned string.
    pub offset: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Dice(text) => f.write_str(text),
            TokenKind::Operator(Operation::Mul) => f.write_str("*"),
            TokenKind::Operator(op) => f.write_str(op.symbol()),
            TokenKind::LeftParen => f.write_str("("),
            TokenKind::RightParen => f.write_str(")"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Lazily scans a normalized expression. Stops after the first error.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    offset: usize,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            offset: 0,
            failed: false,
        }
    }

    fn scan_token(&self) -> Result<Option<(TokenKind, usize)>, RollError> {
        let rest = &self.input[self.offset..];
        let c = match rest.chars().next() {
            Some(c) => c,
            None => return Ok(None),
        };
        let token = match c {
            '+' => (TokenKind::Operator(Operation::Add), 1),
            '-' => (TokenKind::Operator(Operation::Sub), 1),
            '*' | 'x' | 'X' => (TokenKind::Operator(Operation::Mul), 1),
            '/' => (TokenKind::Operator(Operation::Div), 1),
            '(' => (TokenKind::LeftParen, 1),
            ')' => (TokenKind::RightParen, 1),
            '0'..='9' | 'd' | 'D' => self.scan_operand(rest)?,
            '.' => return Err(self.decimal(self.offset)),
            other => {
                return Err(RollError::parse(
                    format!("Unexpected character '{}'", other),
                    self.offset,
                ))
            }
        };
        Ok(Some(token))
    }

    fn scan_operand(&self, rest: &str) -> Result<(TokenKind, usize), RollError> {
        if let Ok((remaining, text)) = recognize(parse_raw_dice)(rest) {
            if let Some(next) = remaining.chars().next() {
                if next == '.' {
                    return Err(self.decimal(self.offset + text.len()));
                }
                if next.is_ascii_alphabetic() && !next.eq_ignore_ascii_case(&'x') {
                    return Err(RollError::parse(
                        format!("Unknown dice modifier '{}' after '{}'", next, text),
                        self.offset + text.len(),
                    ));
                }
            }
            return Ok((TokenKind::Dice(text.to_owned()), text.len()));
        }
        match digit1::<&str, nom::error::Error<&str>>(rest) {
            Ok((remaining, digits)) => {
                if remaining.starts_with(|c: char| c == 'd' || c == 'D') {
                    return Err(RollError::parse(
                        "Missing die sides",
                        self.offset + digits.len(),
                    ));
                }
                if remaining.starts_with('.') {
                    return Err(self.decimal(self.offset + digits.len()));
                }
                let value = digits.parse::<i64>().map_err(|_| {
                    RollError::parse(format!("Number too large: {}", digits), self.offset)
                })?;
                Ok((TokenKind::Number(value), digits.len()))
            }
            Err(_) => Err(RollError::parse("Missing die sides", self.offset)),
        }
    }

    fn decimal(&self, position: usize) -> RollError {
        RollError::parse("Decimal numbers are not supported", position)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token, RollError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let rest = &self.input[self.offset..];
        self.offset += rest.len() - rest.trim_start().len();
        match self.scan_token() {
            Ok(Some((kind, len))) => {
                let token = Token {
                    kind,
                    offset: self.offset,
                };
                self.offset += len;
                Some(Ok(token))
            }
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, RollError> {
    Tokenizer::new(input).collect()
}
