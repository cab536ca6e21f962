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
    random::{seeded, ScriptedSource},
    roll, AppliedValue, ConditionKind, DiceType, Limits, Modifiers, RollError, Roller,
    StringSink,
};

fn scripted(expression: &str, script: Vec<i64>) -> Result<dice_roll::RollResultSet, RollError> {
    Roller::new().roll(expression, &mut ScriptedSource::new(script))
}

#[test]
fn keep_highest_of_two_d20() {
    let result = scripted("2d20kh1", vec![19, 12]).unwrap();
    assert_eq!(result.total(), 19);
    assert_eq!(result.results().len(), 1);
    assert_eq!(result.results()[0].rolls, vec![19]);
    assert_eq!(result.results()[0].all_rolls, vec![19, 12]);
    assert_eq!(result.description(), "19 = 19 (2d20kh1: 19, 12)");
}

#[test]
fn division_by_zero() {
    assert!(matches!(
        scripted("1d6/0", vec![4]),
        Err(RollError::DivisionByZero { .. })
    ));
    assert!(matches!(
        scripted("4/(2-2)", vec![]),
        Err(RollError::DivisionByZero { position: Some(1) })
    ));
}

#[test]
fn named_modifier_nesting() {
    let result = Roller::new()
        .modifiers(Modifiers::new().with("Bless", "1d4"))
        .roll("1d20", &mut ScriptedSource::new(vec![15, 3]))
        .unwrap();
    assert_eq!(result.subtotal(), 15);
    assert_eq!(result.total(), 18);
    assert_eq!(result.modifiers().len(), 1);
    let bless = &result.modifiers()[0];
    assert_eq!(bless.name, "Bless");
    assert_eq!(bless.contribution, 3);
    match &bless.value {
        AppliedValue::Rolled { result, .. } => {
            assert_eq!(result.total(), 3);
            assert_eq!(result.results()[0].dice, DiceType::Number(4));
        }
        other => panic!("expected a rolled modifier, got {:?}", other),
    }
    assert_eq!(
        result.description(),
        "18 = 15 (1d20: 15) + 3 (Bless: 3 = 3 (1d4: 3))"
    );
}

#[test]
fn modifiers_keep_insertion_order() {
    let result = Roller::new()
        .modifiers(
            Modifiers::new()
                .with("Strength", 3i64)
                .with("Bane", "-1d4")
                .with("Proficiency", 2i64),
        )
        .roll("1d20", &mut ScriptedSource::new(vec![10, 2]))
        .unwrap();
    assert_eq!(result.total(), 13);
    assert_eq!(
        result.description(),
        "13 = 10 (1d20: 10) + 3 (Strength) - 2 (Bane: 2 = 2 (1d4: 2)) + 2 (Proficiency)"
    );
}

#[test]
fn infinite_conditions() {
    match scripted("1d6r<=6", vec![]) {
        Err(RollError::InfiniteCondition { kind, clause, .. }) => {
            assert_eq!(kind, ConditionKind::Reroll);
            assert_eq!(clause, "r<=6");
        }
        other => panic!("expected an infinite condition, got {:?}", other),
    }
    assert!(scripted("1d6r<=5", vec![6]).is_ok());
    assert!(matches!(
        scripted("3d6e>=1", vec![]),
        Err(RollError::InfiniteCondition {
            kind: ConditionKind::Explode,
            ..
        })
    ));
    assert!(matches!(
        scripted("1d1e", vec![]),
        Err(RollError::InfiniteCondition { .. })
    ));
}

#[test]
fn seeded_rolls_are_deterministic() {
    let first = Roller::new().roll("2d6+3", &mut seeded(1234)).unwrap();
    let second = Roller::new().roll("2d6+3", &mut seeded(1234)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn reroll_and_explode_chain() {
    let result = scripted("2d6r<=2e6", vec![1, 6, 4, 6, 3]).unwrap();
    assert_eq!(result.results()[0].all_rolls, vec![1, 6, 4, 6, 3]);
    assert_eq!(result.results()[0].rolls, vec![4, 6, 6, 3]);
    assert_eq!(result.total(), 19);
}

#[test]
fn explode_depth_is_configurable() {
    let result = Roller::new()
        .limits(Limits {
            explode_depth: 2,
            ..Limits::default()
        })
        .roll("1d6e", &mut ScriptedSource::new(vec![6]))
        .unwrap();
    assert_eq!(result.results()[0].all_rolls, vec![6, 6, 6]);
    assert_eq!(result.total(), 18);
}

#[test]
fn negative_terms() {
    let result = scripted("-1d6+10", vec![4]).unwrap();
    assert_eq!(result.total(), 6);
    assert_eq!(result.description(), "6 = 0 - 4 (1d6: 4) + 10");
    let result = scripted("1d20+(-2)", vec![12]).unwrap();
    assert_eq!(result.total(), 10);
    assert_eq!(result.description(), "10 = 12 (1d20: 12) - 2");
}

#[test]
fn negated_dice_with_modifier() {
    let result = Roller::new()
        .modifiers(Modifiers::new().with("positive_mod", "1d6"))
        .roll("-1d6", &mut ScriptedSource::new(vec![3, 4]))
        .unwrap();
    assert_eq!(result.total(), 1);
    assert_eq!(
        result.description(),
        "1 = 0 - 3 (1d6: 3) + 4 (positive_mod: 4 = 4 (1d6: 4))"
    );
    let result = scripted("-1d6 + 2d6", vec![3, 4, 5]).unwrap();
    assert_eq!(result.description(), "6 = 0 - 3 (1d6: 3) + 9 (2d6: 4, 5)");
}

#[test]
fn whole_expression_is_validated_before_rolling() {
    let sink = StringSink::new();
    let mut rng = ScriptedSource::new(vec![4]);
    let result = Roller::new().debug(&sink).roll("1d6+1d6r<=6", &mut rng);
    assert!(matches!(
        result,
        Err(RollError::InfiniteCondition {
            kind: ConditionKind::Reroll,
            ..
        })
    ));
    assert_eq!(rng.consumed(), 0);
    assert!(!sink.logs().contains("Rolling 1d6:"));
}

#[test]
fn too_many_dice() {
    let mut rng = ScriptedSource::new(vec![1]);
    assert_eq!(
        Roller::new().roll("999999999999d6", &mut rng),
        Err(RollError::TooManyDice {
            requested: 999_999_999_999,
            limit: 10_000,
        })
    );
    assert_eq!(rng.consumed(), 0);
    let limited = Roller::new().limits(Limits {
        max_dice: 3,
        ..Limits::default()
    });
    assert!(limited.roll("3d6", &mut ScriptedSource::new(vec![2])).is_ok());
    assert!(matches!(
        limited.roll("1d20+4d6", &mut ScriptedSource::new(vec![2])),
        Err(RollError::TooManyDice { requested: 4, .. })
    ));
}

#[test]
fn deep_nesting_is_rejected() {
    let expression = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
    assert!(matches!(
        scripted(&expression, vec![]),
        Err(RollError::Parse { .. })
    ));
    let chain = vec!["1"; 1000].join("+");
    assert!(matches!(
        scripted(&chain, vec![]),
        Err(RollError::Parse { .. })
    ));
    let fits = vec!["1"; 200].join("+");
    assert_eq!(scripted(&fits, vec![]).unwrap().total(), 200);
}

#[test]
fn precedence() {
    assert_eq!(scripted("2+3*4", vec![]).unwrap().total(), 14);
    assert_eq!(scripted("(2+3)*4", vec![]).unwrap().total(), 20);
    assert_eq!(scripted("20-5-3", vec![]).unwrap().total(), 12);
    assert_eq!(scripted("1d6+2x3", vec![5]).unwrap().total(), 11);
}

#[test]
fn unicode_and_shorthands() {
    assert_eq!(scripted("２d６ × ２", vec![3, 4]).unwrap().total(), 14);
    assert_eq!(scripted("10 ÷ 3 − 1", vec![]).unwrap().total(), 2);
    let fudge = scripted("fudge", vec![1, 1, 0, -1]).unwrap();
    assert_eq!(fudge.total(), 1);
    assert_eq!(fudge.description(), "1 = 1 (4dF: +, +, B, -)");
    let bane = scripted("BANE+1", vec![2, 6, 5]).unwrap();
    assert_eq!(bane.total(), 8);
    let perc = scripted("PERC", vec![0, 7]).unwrap();
    assert_eq!(perc.total(), 7);
    assert_eq!(perc.description(), "7 = 7 (1d%: [00, 7])");
}

#[test]
fn shorthand_times_operand() {
    let boon = scripted("BOON x 2", vec![3, 4, 5]).unwrap();
    assert_eq!(boon.total(), 18);
    assert_eq!(boon.description(), "18 = 9 (3d6kh2: 3, 4, 5) x 2");
    assert_eq!(scripted("FUDGE x 2", vec![1, 1, 0, -1]).unwrap().total(), 2);
    assert_eq!(scripted("PERC x 2", vec![4, 2]).unwrap().total(), 84);
    assert_eq!(scripted("1d6 x BOON", vec![2, 3, 4, 5]).unwrap().total(), 18);
}

#[test]
fn flux() {
    let good = scripted("GOODFLUX", vec![2, 6]).unwrap();
    assert_eq!(good.total(), 4);
    assert_eq!(good.description(), "4 = 6 (1d6: 6) - 2 (1d6: 2)");
    let bad = scripted("BADFLUX", vec![2, 6]).unwrap();
    assert_eq!(bad.total(), -4);
    assert_eq!(bad.description(), "-4 = 2 (1d6: 2) - 6 (1d6: 6)");
}

#[test]
fn zero_dice() {
    let result = scripted("0d6+1", vec![]).unwrap();
    assert_eq!(result.total(), 1);
    assert!(result.results()[0].rolls.is_empty());
    assert_eq!(result.description(), "1 = 0 (0d6) + 1");
}

#[test]
fn parse_errors() {
    for expression in &[
        "",
        "   ",
        "+1d6",
        "1d6+",
        "1d6++2",
        "1d0",
        "1d",
        "1.5d6",
        "1d6e6e5",
        "4dFr",
        "(1d6",
        "1d6)",
        "1d6q",
        "fireball",
        "GOODFLUX+1",
    ] {
        assert!(
            matches!(scripted(expression, vec![]), Err(RollError::Parse { .. })),
            "{:?} should not parse",
            expression
        );
    }
}

#[test]
fn parse_error_positions() {
    assert_eq!(scripted("1d6 + $", vec![]).unwrap_err().position(), Some(4));
    assert_eq!(scripted("2+1d0", vec![]).unwrap_err().position(), Some(2));
}

#[test]
fn debug_sink_records_steps() {
    let sink = StringSink::new();
    Roller::new()
        .debug(&sink)
        .modifiers(Modifiers::new().with("Bless", "1d4"))
        .roll("boon", &mut ScriptedSource::new(vec![1, 2, 3, 4]))
        .unwrap();
    let logs = sink.logs();
    assert!(logs.starts_with("DEBUG: [START] Rolling expression: 'boon'"));
    assert!(logs.contains("DEBUG: [SHORTHAND_EXPANSION] 'boon' -> '3d6kh2'"));
    assert!(logs.contains("DEBUG: Rolling 1d6: 1"));
    assert!(logs.contains("DEBUG: Rolling 1d4: 4"));
    assert!(logs.contains("DEBUG: Added modifier 'Bless': 4"));
    assert!(logs.ends_with("DEBUG: [COMPLETE] Final result: 9"));
}

#[test]
fn concurrent_rolls_share_nothing() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let expression = if i % 2 == 0 { "4d6kh3" } else { "1d20+5" };
                    let total = roll(expression).unwrap().total();
                    assert!((3..=25).contains(&total));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
