// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use rpcdl::unstable::*;
use serde::{Deserialize, Serialize};
use std::env;
use test_generator::test_resources;

// The caret rendered by `Source::message` must point at the token's text.
fn check_loc(tok: &Token) -> Result<()> {
    if matches!(tok.kind, TokenKind::Eof | TokenKind::Newline) {
        return Ok(());
    }
    let msg = tok.span.message("", "");
    let lines: Vec<&str> = msg.split('\n').collect();
    let source_line = lines[3];
    let caret_line = lines[4];

    let (Some(bar), Some(caret)) = (source_line.find('|'), caret_line.find('^')) else {
        bail!("malformed message for {tok:?}\n{msg}");
    };
    let col = caret - bar - 2;
    let source_str: String = source_line[bar + 2..].chars().skip(col).collect();
    let span_str = tok.span.text().split('\n').next().unwrap_or_default();
    if !source_str.starts_with(span_str) {
        bail!("location mismatch for {tok:?}\n{msg}\n{span_str}\n{source_str}");
    }
    Ok(())
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Case {
    pub note: String,
    pub source: String,
    pub tokens: Vec<String>,
    pub kinds: Option<Vec<String>>,
    pub literals: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        print!("case {} ", &case.note);
        let source = Source::new("case.rpcdl".to_string(), case.source.clone());
        let tokens = Lexer::new(&source).read_all_tokens();

        for (idx, tok) in tokens.iter().enumerate().take(case.tokens.len()) {
            assert_eq!(
                tok.span.text(),
                case.tokens[idx],
                "{} Expected token `{}` not found",
                tok.span.message("mismatch-error", &case.tokens[idx]),
                &case.tokens[idx]
            );

            if let Some(k) = case.kinds.as_ref().and_then(|k| k.get(idx)) {
                assert_eq!(
                    &format!("{:?}", tok.kind),
                    k,
                    "{}",
                    tok.span.message("mismatch-error", "token kind mismatch")
                );
            }

            if let Some(l) = case.literals.as_ref().and_then(|l| l.get(idx)) {
                assert_eq!(
                    &tok.literal,
                    l,
                    "{}",
                    tok.span.message("mismatch-error", "token literal mismatch")
                );
            }

            check_loc(tok)?;
        }

        assert_eq!(
            tokens.len(),
            case.tokens.len(),
            "\n. Token count mismatch.\nLexed tokens:{tokens:?}"
        );
        if let Some(k) = &case.kinds {
            assert_eq!(
                tokens.len(),
                k.len(),
                "\n. Kind count mismatch.\nLexed tokens:{tokens:?}"
            );
        }

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

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let Some(file) = env::args().find(|a| a.ends_with(".yaml")) else {
        bail!("missing yaml test file");
    };
    yaml_test(&file)
}

#[test_resources("tests/lexer/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
