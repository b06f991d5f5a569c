// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{anyhow, bail, Result};
use rpcdl::{unstable::*, *};
use serde::Deserialize;
use test_generator::test_resources;

#[derive(Deserialize, Debug)]
struct TestCase {
    note: String,
    source: String,
    config: Option<Config>,
    #[serde(default)]
    diagnostics: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn run_case(case: &TestCase) -> Result<()> {
    let schema = parse("case.rpcdl", &case.source).map_err(|e| anyhow!(e.render()))?;
    let combined = CombinedSchema::from_schema(schema);
    let config = case.config.clone().unwrap_or_default();
    let diagnostics = Analyzer::with_config(&combined, config).analyze();

    for d in &diagnostics {
        println!("{}", d.render());
    }

    let actual: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
    if actual != case.diagnostics {
        bail!(
            "diagnostics mismatch\nexpected: {:#?}\nactual: {:#?}",
            case.diagnostics,
            actual
        );
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    for case in &test.cases {
        print!("\ncase {} ", case.note);
        run_case(case)?;
        println!("passed");
    }

    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test_resources("tests/analyzer/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
fn first_error_is_the_first_diagnostic() -> Result<()> {
    let schema = parse("case.rpcdl", "type A { b: B }\ntype B { a: A c: Nope }")
        .map_err(|e| anyhow!(e.render()))?;
    let combined = CombinedSchema::from_schema(schema);
    let diagnostics = analyze(&combined);
    assert_eq!(diagnostics.len(), 2);

    match first_error(&diagnostics) {
        Err(d) => assert_eq!(d.to_string(), "case.rpcdl:2:18: type \"Nope\" is not declared"),
        Ok(()) => bail!("expected an error"),
    }
    assert!(first_error(&[]).is_ok());
    Ok(())
}
