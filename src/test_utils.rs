use std::path::PathBuf;

use anyhow::Context;
use itertools::Itertools;
use serde::{de::{Error, Visitor}, Deserialize};


/// What a test script is expected to do: print these lines and finish, or
/// fail with the named error.
#[derive(Debug, PartialEq)]
pub enum TestOutcome {
    Output(Vec<String>),
    Failure(String),
}

pub struct TestCase {
    pub source: String,
    pub input: String,
    pub expected: TestOutcome,
}

struct TestOutcomeVisitor {}

impl<'de> Deserialize<'de> for TestOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de> {

        deserializer.deserialize_map(TestOutcomeVisitor {})
    }
}

impl<'de> Visitor<'de> for TestOutcomeVisitor {
    type Value = TestOutcome;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "A structure containing the boolean key 'ok'. If it's okay, contains the key 'output', otherwise the key 'type'")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>, {

        if map.next_key::<String>()?.as_deref() != Some("ok") {
            return Err(A::Error::custom("First key should be 'ok'"))
        }

        let ok: bool = map.next_value()?;
        let second = map.next_key::<String>()?
            .ok_or_else(|| A::Error::custom("Must have two keys"))?;

        let outcome = match (ok, second.as_str()) {
            (true, "output") => TestOutcome::Output(map.next_value()?),
            (false, "type") => TestOutcome::Failure(map.next_value()?),
            (true, other) => return Err(A::Error::custom(format!("Second ok key should be 'output', got '{}'", other))),
            (false, other) => return Err(A::Error::custom(format!("Second key of a failure should be 'type', got '{}'", other))),
        };

        if map.next_key::<String>()?.is_some() {
            return Err(A::Error::custom("Only two keys should be present"));
        }

        Ok(outcome)
    }
}

fn base_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn load_test_case(testcase: &str) -> anyhow::Result<TestCase> {
    let base_path = base_path();
    let source_path = base_path.join("test_inputs").join(format!("{}.kt", testcase));
    let input_path = base_path.join("test_inputs").join(format!("{}.stdin", testcase));
    let output_path = base_path.join("test_outputs").join(format!("{}.json", testcase));

    let source = std::fs::read_to_string(&source_path)
        .with_context(|| format!("Reading {}", source_path.display()))?;
    let input = if input_path.exists() {
        std::fs::read_to_string(&input_path)?
    } else {
        String::new()
    };
    let expected = serde_json::from_slice(&std::fs::read(&output_path)?)
        .with_context(|| format!("Parsing {}", output_path.display()))?;

    Ok(TestCase { source, input, expected })
}

/// Names of every script under `test_inputs`, without the extension.
pub fn all_testcases() -> anyhow::Result<Vec<String>> {
    let entries = std::fs::read_dir(base_path().join("test_inputs"))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries.into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|extension| extension == "kt"))
        .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .sorted()
        .collect_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_outcomes_parse() -> anyhow::Result<()> {
        let success: TestOutcome = serde_json::from_str(r#"{"ok": true, "output": ["1", "two"]}"#)?;
        assert_eq!(success, TestOutcome::Output(vec!["1".to_owned(), "two".to_owned()]));

        let failure: TestOutcome = serde_json::from_str(r#"{"ok": false, "type": "DivisionByZero"}"#)?;
        assert_eq!(failure, TestOutcome::Failure("DivisionByZero".to_owned()));

        assert!(serde_json::from_str::<TestOutcome>(r#"{"output": []}"#).is_err());
        assert!(serde_json::from_str::<TestOutcome>(r#"{"ok": true, "type": "X"}"#).is_err());
        Ok(())
    }
}
