// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use rpcdl::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct TestCase {
    note: String,
    entry: String,
    files: BTreeMap<String, String>,
    #[serde(default)]
    declarations: Vec<String>,
    #[serde(default)]
    diagnostics: Vec<String>,
    #[serde(default)]
    docstrings: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn run_case(case: &TestCase) -> Result<()> {
    let provider = MemoryFileProvider::new();
    for (path, contents) in &case.files {
        provider.insert(path, contents);
    }

    let resolved = Resolver::new(&provider).resolve(&case.entry);

    let diagnostics: Vec<String> = resolved.diagnostics.iter().map(|d| d.to_string()).collect();
    if diagnostics != case.diagnostics {
        bail!(
            "diagnostics mismatch\nexpected: {:#?}\nactual: {:#?}",
            case.diagnostics,
            diagnostics
        );
    }

    let declarations: Vec<String> = resolved
        .schema
        .schema
        .children
        .iter()
        .filter_map(|c| c.decl_name())
        .map(|n| format!("{}:{}", n.span.file(), n.name))
        .collect();
    if declarations != case.declarations {
        bail!(
            "declarations mismatch\nexpected: {:#?}\nactual: {:#?}",
            case.declarations,
            declarations
        );
    }

    for (name, expected) in &case.docstrings {
        let actual = resolved
            .schema
            .types
            .get(name)
            .and_then(|t| t.docstring.as_ref())
            .map(|d| d.value.as_str());
        if actual != Some(expected.as_str()) {
            bail!("docstring of {name}: expected {expected:?}, found {actual:?}");
        }
    }

    for (path, contents) in &case.files {
        if let Some(hash) = resolved.schema.files.get(path) {
            if *hash != hash_content(contents) {
                bail!("hash mismatch for {path}");
            }
        }
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

#[test_resources("tests/resolver/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
