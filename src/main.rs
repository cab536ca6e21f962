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

mod config;

use config::RollConfig;
use dice_roll::{LogSink, ModifierValue, RngSource, RollResultSet, Roller, StringSink};
use log::LevelFilter;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use std::path::PathBuf;

const USAGE: &str = "usage: roll <expression> [-n COUNT] [--json] [--debug] [--seed N] \
                     [--config PATH] [-m NAME=VALUE]...";

#[derive(Debug, PartialEq, Eq)]
struct Options {
    expression: String,
    count: u32,
    json: bool,
    debug: bool,
    seed: Option<u64>,
    config: Option<PathBuf>,
    modifiers: Vec<(String, ModifierValue)>,
}

fn parse_modifier(arg: &str) -> Result<(String, ModifierValue), String> {
    let (name, value) = match arg.find('=') {
        Some(i) => (&arg[..i], &arg[i + 1..]),
        None => return Err(format!("modifier {} is not of the form NAME=VALUE", arg)),
    };
    let value = match value.trim().parse::<i64>() {
        Ok(i) => ModifierValue::Static(i),
        Err(_) => ModifierValue::Expression(value.to_string()),
    };
    Ok((name.to_string(), value))
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Options, String> {
    let mut expression: Option<String> = None;
    let mut options = Options {
        expression: String::new(),
        count: 1,
        json: false,
        debug: false,
        seed: None,
        config: None,
        modifiers: Vec::new(),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--debug" => options.debug = true,
            "-n" | "--count" => {
                options.count = args
                    .next()
                    .and_then(|a| u32::from_str_radix(&a, 10).ok())
                    .ok_or_else(|| "-n expects a positive number".to_string())?
            }
            "--seed" => {
                options.seed = Some(
                    args.next()
                        .and_then(|a| a.parse::<u64>().ok())
                        .ok_or_else(|| "--seed expects an unsigned integer".to_string())?,
                )
            }
            "--config" => {
                options.config = Some(PathBuf::from(
                    args.next()
                        .ok_or_else(|| "--config expects a path".to_string())?,
                ))
            }
            "-m" | "--modifier" => {
                let modifier = args
                    .next()
                    .ok_or_else(|| "-m expects NAME=VALUE".to_string())?;
                options.modifiers.push(parse_modifier(&modifier)?)
            }
            _ if expression.is_none() => expression = Some(arg),
            _ => return Err(format!("unexpected argument {}", arg)),
        }
    }
    options.expression = expression.ok_or_else(|| "missing dice expression".to_string())?;
    Ok(options)
}

#[derive(Serialize)]
struct RollOutput<'a> {
    result: i64,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<String>,
    detail: &'a RollResultSet,
}

fn main() {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let mut logger = pretty_env_logger::formatted_builder();
    logger.parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()));
    if options.debug && !options.json {
        logger.filter_module("dice_roll::debug", LevelFilter::Debug);
    }
    logger.init();

    let config = match &options.config {
        Some(path) => RollConfig::load(path),
        None => RollConfig::default(),
    };
    let mut modifiers = config.modifiers;
    for (name, value) in options.modifiers.iter().cloned() {
        modifiers.push(name, value);
    }

    let capture = StringSink::new();
    let roller = Roller::new().modifiers(modifiers).limits(config.limits);
    let roller = match (options.debug, options.json) {
        (true, true) => roller.debug(&capture),
        (true, false) => roller.debug(&LogSink),
        (false, _) => roller,
    };

    let mut master_rng = match options.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let mut outputs = Vec::new();
    for _ in 0..options.count {
        let mut seed: <Xoshiro256PlusPlus as SeedableRng>::Seed = Default::default();
        master_rng.fill(&mut seed);
        let mut rng = RngSource::new(Xoshiro256PlusPlus::from_seed(seed));
        match roller.roll(&options.expression, &mut rng) {
            Ok(result) => {
                if options.json {
                    let debug = if options.debug {
                        let logs = capture.logs();
                        capture.clear();
                        Some(logs)
                    } else {
                        None
                    };
                    outputs.push((result, debug));
                } else {
                    println!("{}", result);
                }
            }
            Err(e) => {
                log::debug!("roll of {} failed: {:?}", &options.expression, &e);
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if options.json {
        let rendered: Vec<RollOutput> = outputs
            .iter()
            .map(|(result, debug)| RollOutput {
                result: result.total(),
                description: result.description(),
                debug: debug.clone(),
                detail: result,
            })
            .collect();
        match serde_json::to_string_pretty(&rendered) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: unable to serialize results: {}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Options, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let options = args(&[
            "4d6kh3", "-n", "6", "--json", "--seed", "42", "-m", "Bless=1d4", "-m", "Str=-1",
        ])
        .unwrap();
        assert_eq!(options.expression, "4d6kh3");
        assert_eq!(options.count, 6);
        assert!(options.json);
        assert!(!options.debug);
        assert_eq!(options.seed, Some(42));
        assert_eq!(
            options.modifiers,
            vec![
                (
                    "Bless".to_string(),
                    ModifierValue::Expression("1d4".to_string())
                ),
                ("Str".to_string(), ModifierValue::Static(-1)),
            ]
        );
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["1d6", "2d6"]).is_err());
        assert!(args(&["1d6", "-n"]).is_err());
        assert!(args(&["1d6", "-m", "Bless"]).is_err());
    }

    #[test]
    fn test_seeded_master_is_reproducible() {
        let roll_all = |seed: u64| -> Vec<i64> {
            let mut master = ChaCha20Rng::seed_from_u64(seed);
            (0..5)
                .map(|_| {
                    let mut seed: <Xoshiro256PlusPlus as SeedableRng>::Seed = Default::default();
                    master.fill(&mut seed);
                    let mut rng = RngSource::new(Xoshiro256PlusPlus::from_seed(seed));
                    Roller::new().roll("3d6", &mut rng).unwrap().total()
                })
                .collect()
        };
        assert_eq!(roll_all(9), roll_all(9));
    }
}
