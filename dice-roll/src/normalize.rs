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

use crate::{debug::Trace, errors::RollError, parser::parse_raw_dice};

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_till1},
    character::complete::alpha1,
    combinator::opt,
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, tuple},
    IResult,
};

/// Shorthand words and what they expand to.
pub const SHORTHANDS: &[(&str, &str)] = &[
    ("FUDGE", "4dF"),
    ("BOON", "3d6kh2"),
    ("BANE", "3d6kl2"),
    ("FLUX", "1d6-1d6"),
    ("PERC", "1d%"),
    ("PERCENTILE", "1d%"),
];

/// Two d6, reported as the difference between them.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flux {
    /// higher - lower
    Good,
    /// lower - higher
    Bad,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Normalized {
    Expression(String),
    Flux(Flux),
}

fn canonical_char(c: char) -> char {
    match c {
        '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
        '＋' => '+',
        '－' | '−' => '-',
        '＊' | '×' => '*',
        '／' | '÷' => '/',
        '（' => '(',
        '）' => ')',
        other => other,
    }
}

fn flux_word(word: &str) -> Option<Flux> {
    if word.eq_ignore_ascii_case("GOODFLUX") {
        Some(Flux::Good)
    } else if word.eq_ignore_ascii_case("BADFLUX") {
        Some(Flux::Bad)
    } else {
        None
    }
}

/// Longest shorthand name at the start of `input`, yielding its expansion.
fn shorthand(input: &str) -> IResult<&str, &'static str> {
    SHORTHANDS
        .iter()
        .filter(|(name, _)| {
            input
                .get(..name.len())
                .map_or(false, |prefix| prefix.eq_ignore_ascii_case(name))
        })
        .max_by_key(|(name, _)| name.len())
        .map(|(name, expanded)| (&input[name.len()..], *expanded))
        .ok_or_else(|| nom::Err::Error(Error::new(input, ErrorKind::Tag)))
}

fn times(input: &str) -> IResult<&str, &str> {
    tag_no_case("x")(input)
}

/// A letter run made of shorthands joined by the `x` operator, e.g. `xBOON` or `PERCxFUDGE`.
fn shorthand_run(input: &str) -> IResult<&str, (Option<&str>, Vec<&'static str>, Option<&str>)> {
    tuple((opt(times), separated_list1(times, shorthand), opt(times)))(input)
}

fn expand_run(run: &str) -> Option<String> {
    let (leading, words, trailing) = match shorthand_run(run) {
        Ok(("", parsed)) => parsed,
        _ => return None,
    };
    let words: Vec<String> = words
        .iter()
        .map(|expanded| {
            if expanded.contains('-') {
                format!("({})", expanded)
            } else {
                expanded.to_string()
            }
        })
        .collect();
    let mut out = String::new();
    if leading.is_some() {
        out.push('x');
    }
    out.push_str(&words.join("x"));
    if trailing.is_some() {
        out.push('x');
    }
    Some(out)
}

/// GOODFLUX or BADFLUX inside a letter run, possibly touching an `x` operator.
fn flux_run(input: &str) -> IResult<&str, &str> {
    delimited(
        opt(times),
        alt((tag_no_case("GOODFLUX"), tag_no_case("BADFLUX"))),
        opt(times),
    )(input)
}

/// True for a letters-only dice term such as `dF`.
fn is_dice_term(word: &str) -> bool {
    matches!(parse_raw_dice(word), Ok((rest, _)) if rest.is_empty())
}

/// Splits into maximal runs of ASCII letters and everything in between.
fn pieces(input: &str) -> IResult<&str, Vec<&str>> {
    many0(alt((alpha1, take_till1(|c: char| c.is_ascii_alphabetic()))))(input)
}

/// Maps unicode operators and digits to ASCII, strips whitespace and expands shorthands.
pub(crate) fn normalize(input: &str, trace: &Trace) -> Result<Normalized, RollError> {
    let canonical: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(canonical_char)
        .collect();
    if canonical.is_empty() {
        return Err(RollError::parse_unpositioned(format!(
            "Empty or whitespace-only expression: {:?}",
            input
        )));
    }
    trace.log(format!("NORMALIZED: '{}'", canonical));

    if let Some(flux) = flux_word(&canonical) {
        trace.step("SPECIAL_CASE", format!("Handling {}", canonical.to_uppercase()));
        return Ok(Normalized::Flux(flux));
    }

    let parts = match pieces(&canonical) {
        Ok((_, parts)) => parts,
        Err(_) => vec![canonical.as_str()],
    };

    if let [word] = parts.as_slice() {
        if word.chars().all(|c| c.is_ascii_alphabetic())
            && expand_run(word).is_none()
            && !is_dice_term(word)
        {
            return Err(RollError::parse(
                format!("No valid dice expression found: '{}'", word),
                0,
            ));
        }
    }

    let mut expanded = String::with_capacity(canonical.len());
    let mut offset = 0;
    for part in parts {
        if let Ok(("", word)) = flux_run(part) {
            return Err(RollError::parse(
                format!("{} can not be combined with other terms", word.to_uppercase()),
                offset,
            ));
        }
        match expand_run(part) {
            Some(replacement) => expanded.push_str(&replacement),
            None => expanded.push_str(part),
        }
        offset += part.len();
    }

    if expanded != canonical {
        trace.step(
            "SHORTHAND_EXPANSION",
            format!("'{}' -> '{}'", canonical, expanded),
        );
    }
    Ok(Normalized::Expression(expanded))
}
