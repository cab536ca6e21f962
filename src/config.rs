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

use dice_roll::{
    limits::{DEFAULT_EXPLODE_DEPTH, DEFAULT_MAX_DEPTH, DEFAULT_MAX_DICE},
    Limits, ModifierValue, Modifiers,
};
use std::{convert::TryInto, path::Path};
use toml::{map::Map, Value};

/// Settings read from the optional configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RollConfig {
    pub limits: Limits,
    /// Applied to every roll before any given on the command line.
    pub modifiers: Modifiers,
}

impl RollConfig {
    pub fn load(path: &Path) -> RollConfig {
        let mut config: Map<String, Value> = match toml::from_slice(&match std::fs::read(path) {
            Ok(a) => a,
            Err(e) => {
                log::warn!("Unable to read config file {}: {}", path.display(), e);
                vec![]
            }
        }) {
            Ok(a) => a,
            Err(e) => {
                log::warn!("Unable to parse config: {}", e);
                Map::new()
            }
        };
        RollConfig::from_config(&mut config)
    }

    pub fn from_config(config: &mut Map<String, Value>) -> RollConfig {
        let limits = Limits {
            explode_depth: read_limit(config, "explode_depth", DEFAULT_EXPLODE_DEPTH),
            max_depth: read_limit(config, "max_depth", DEFAULT_MAX_DEPTH),
            max_dice: read_limit(config, "max_dice", DEFAULT_MAX_DICE),
        };

        let mut modifiers = Modifiers::new();
        if let Some(table) = config.get("modifiers").and_then(|m| m.as_table()) {
            for (name, value) in table.iter() {
                match value {
                    Value::Integer(i) => modifiers.push(name.as_str(), ModifierValue::Static(*i)),
                    Value::String(s) => modifiers.push(name.as_str(), s.as_str()),
                    other => log::warn!(
                        "ignoring modifier {}: expected integer or dice expression, got {}",
                        name,
                        other
                    ),
                }
            }
        }

        RollConfig { limits, modifiers }
    }
}

fn read_limit(config: &Map<String, Value>, key: &str, default: u32) -> u32 {
    match config
        .get("limits")
        .and_then(|l| l.get(key))
        .and_then(|v| v.as_integer())
        .and_then(|v| v.try_into().ok())
    {
        Some(v) => v,
        None => {
            log::warn!("unable to read limits.{}, using default of {}", key, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> RollConfig {
        let mut map: Map<String, Value> = toml::from_str(text).unwrap();
        RollConfig::from_config(&mut map)
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse(""), RollConfig::default());
        assert_eq!(
            parse("[limits]\nexplode_depth = -3\n").limits,
            Limits::default()
        );
    }

    #[test]
    fn test_values() {
        let config = parse(
            r#"
[limits]
explode_depth = 5
max_dice = 50

[modifiers]
Strength = 3
Bless = "1d4"
Broken = 1.5
"#,
        );
        assert_eq!(config.limits.explode_depth, 5);
        assert_eq!(config.limits.max_dice, 50);
        assert_eq!(config.limits.max_depth, DEFAULT_MAX_DEPTH);
        let modifiers: Vec<_> = config.modifiers.iter().cloned().collect();
        assert_eq!(
            modifiers,
            vec![
                ("Strength".to_string(), ModifierValue::Static(3)),
                ("Bless".to_string(), ModifierValue::Expression("1d4".to_string())),
            ]
        );
    }

    #[test]
    fn test_missing_file() {
        let config = RollConfig::load(Path::new("/nonexistent/roll.toml"));
        assert_eq!(config, RollConfig::default());
    }
}
