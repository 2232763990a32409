mod common;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use common::Scripted;
use fits_sweep::{
    analyze, resolve, ActionController, Choice, Escalation, FileOps, HeaderRecord, OpError,
    Outcome, Value,
};
use proptest::prelude::*;

// --- Fixed keyword schema ---
const FIELDS: &[&str] = &["ECC", "GAIN", "OFFSET", "FILTER", "DATE-OBS", "HFR"];
const FILTERS: &[&str] = &["Ha", "OIII", "SII", "L"];
const OPS: &[&str] = &["==", "!=", "<", "<=", ">", ">="];
const OBSERVERS: &[&str] = &["O'Brien", r"C:\raw\night1", "it's \\"];

/// Condition text together with the field names it was built from.
#[derive(Debug, Clone)]
struct GenCondition {
    text: String,
    fields: BTreeSet<String>,
}

fn field_text(name: &str) -> String {
    if name.contains('-') {
        format!("`{name}`")
    } else {
        name.to_string()
    }
}

fn arb_literal() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1000_i64..1000).prop_map(|v| v.to_string()),
        (-100.0_f64..100.0).prop_map(|v| format!("{v:.3}")),
        prop::sample::select(FILTERS).prop_map(|f| format!("'{f}'")),
        prop::sample::select(OBSERVERS).prop_map(|o| format!("\"{}\"", o.replace('\\', "\\\\"))),
    ]
}

fn arb_leaf() -> impl Strategy<Value = GenCondition> {
    let field = || prop::sample::select(FIELDS);
    let op = || prop::sample::select(OPS);
    prop_oneof![
        (field(), op(), arb_literal()).prop_map(|(f, op, lit)| GenCondition {
            text: format!("{} {op} {lit}", field_text(f)),
            fields: BTreeSet::from([f.to_string()]),
        }),
        (arb_literal(), op(), field()).prop_map(|(lit, op, f)| GenCondition {
            text: format!("{lit} {op} {}", field_text(f)),
            fields: BTreeSet::from([f.to_string()]),
        }),
        (field(), op(), field()).prop_map(|(a, op, b)| GenCondition {
            text: format!("{} {op} {}", field_text(a), field_text(b)),
            fields: BTreeSet::from([a.to_string(), b.to_string()]),
        }),
    ]
}

fn combine(a: GenCondition, keyword: &str, b: GenCondition) -> GenCondition {
    GenCondition {
        text: format!("({}) {keyword} ({})", a.text, b.text),
        fields: a.fields.union(&b.fields).cloned().collect(),
    }
}

fn arb_condition() -> impl Strategy<Value = GenCondition> {
    arb_leaf().prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| combine(a, "and", b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| combine(a, "or", b)),
            inner.prop_map(|a| GenCondition {
                text: format!("not ({})", a.text),
                fields: a.fields,
            }),
        ]
    })
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1000_i64..1000).prop_map(Value::Int),
        (-100.0_f64..100.0).prop_map(Value::Float),
        any::<bool>().prop_map(Value::Bool),
        prop::sample::select(FILTERS).prop_map(Value::from),
        prop::sample::select(OBSERVERS).prop_map(Value::from),
    ]
}

/// A header holding a random subset of the schema's keywords.
fn arb_record() -> impl Strategy<Value = HeaderRecord> {
    prop::collection::vec((prop::sample::select(FIELDS), arb_value()), 0..8).prop_map(|pairs| {
        pairs
            .into_iter()
            .fold(HeaderRecord::new(), |record, (k, v)| record.with(k, v))
    })
}

fn arb_choice() -> impl Strategy<Value = Choice> {
    prop::sample::select(
        &[
            Choice::DeleteOne,
            Choice::DeleteAll,
            Choice::MoveOne,
            Choice::MoveAll,
            Choice::Skip,
            Choice::Quit,
        ][..],
    )
}

struct NoopOps;

impl FileOps for NoopOps {
    fn delete(&self, _path: &Path) -> Result<(), OpError> {
        Ok(())
    }

    fn move_into(&self, path: &Path, dest_dir: &Path) -> Result<PathBuf, OpError> {
        Ok(dest_dir.join(path))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn field_set_is_exactly_the_referenced_names(gen in arb_condition()) {
        let condition = analyze(&gen.text).unwrap();
        let fields: BTreeSet<String> = condition.fields().iter().map(str::to_owned).collect();
        prop_assert_eq!(fields, gen.fields);
    }

    #[test]
    fn evaluation_is_repeatable(gen in arb_condition(), record in arb_record()) {
        let condition = analyze(&gen.text).unwrap();
        match resolve(condition.fields(), &record) {
            Ok(env) => {
                let first = condition.matches(&env).map_err(|e| e.to_string());
                for _ in 0..3 {
                    let again = condition.matches(&env).map_err(|e| e.to_string());
                    prop_assert_eq!(&first, &again);
                }
            }
            Err(missing) => {
                prop_assert!(!missing.names.is_empty());
                for name in &missing.names {
                    prop_assert!(condition.fields().contains(name));
                    prop_assert!(record.get(name).is_none());
                }
            }
        }
    }

    #[test]
    fn rendered_condition_means_the_same(gen in arb_condition(), record in arb_record()) {
        let condition = analyze(&gen.text).unwrap();
        let rendered = analyze(&condition.expr().to_string()).unwrap();
        prop_assert_eq!(condition.fields(), rendered.fields());

        if let Ok(env) = resolve(condition.fields(), &record) {
            // 5.000 renders as 5, so only the outcome is compared, not the message
            prop_assert_eq!(condition.matches(&env).ok(), rendered.matches(&env).ok());
        }
    }

    #[test]
    fn escalation_never_reverts(choices in prop::collection::vec(arb_choice(), 1..12)) {
        let mut controller = ActionController::new(NoopOps, Scripted::new(&choices), "/dest");
        let mut escalated: Option<Escalation> = None;

        for i in 0..choices.len() + 5 {
            let file = PathBuf::from(format!("f{i}.fits"));
            let asked_before = controller.prompter().asked.len();
            let outcome = match controller.handle_match(&file) {
                Ok(outcome) => outcome,
                // script exhausted
                Err(_) => break,
            };

            let state = controller.state();
            if let Some(previous) = escalated {
                prop_assert_eq!(state, previous);
                prop_assert_eq!(controller.prompter().asked.len(), asked_before);
            } else if state != Escalation::None {
                escalated = Some(state);
            }
            if matches!(outcome, Outcome::Quit) {
                break;
            }
        }

        let expected = choices
            .iter()
            .take_while(|c| **c != Choice::Quit)
            .find_map(|c| match c {
                Choice::DeleteAll => Some(Escalation::Delete),
                Choice::MoveAll => Some(Escalation::Move),
                _ => None,
            });
        prop_assert_eq!(escalated, expected);
    }
}
