use html::{sanitize, sanitize_default};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct Corpus {
    case: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    input: String,
    #[serde(default)]
    expected: Option<String>,
    /// The input must fail to parse.
    #[serde(default)]
    error: bool,
    /// Sanitize with a validator that accepts every URI.
    #[serde(default)]
    allow_all_uris: bool,
}

fn load_corpus() -> Vec<Case> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sanitize.toml");
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read sanitize corpus {path:?}: {err}"));
    let corpus: Corpus = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse sanitize corpus {path:?}: {err}"));
    corpus.case
}

fn run(case: &Case, input: &str) -> Result<String, html::ParseError> {
    if case.allow_all_uris {
        sanitize(input, |_, _| true)
    } else {
        sanitize_default(input)
    }
}

#[test]
fn sanitize_golden_corpus() {
    let cases = load_corpus();
    assert!(!cases.is_empty(), "empty sanitize corpus");
    let mut failures = Vec::new();
    for case in &cases {
        let actual = run(case, &case.input);
        match (&actual, case.error, &case.expected) {
            (Err(_), true, _) => {}
            (Ok(out), false, Some(expected)) if out == expected => {}
            _ => failures.push(format!(
                "{}: input={:?} expected={:?} error={} actual={:?}",
                case.name, case.input, case.expected, case.error, actual
            )),
        }
    }
    assert!(failures.is_empty(), "sanitize corpus failures:\n{}", failures.join("\n"));
}

#[test]
fn sanitize_golden_outputs_are_fixed_points() {
    for case in load_corpus() {
        let Some(expected) = case.expected.as_deref() else {
            continue;
        };
        let again = run(&case, expected)
            .unwrap_or_else(|err| panic!("{}: sanitized output failed to parse: {err}", case.name));
        assert_eq!(again, expected, "{}: output is not stable", case.name);
    }
}
