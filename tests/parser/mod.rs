// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use rpcdl::unstable::*;
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

macro_rules! my_assert_eq {
    ($left:expr, $right:expr, $($arg:tt)+) => {
	match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
		    bail!("mismatch:\nleft  = {:?}\nright = {:?}\n{}",
		          left_val, right_val, format_args!($($arg)+));
                }
            }
	}
    }
}

fn param_str(p: &FieldRuleParam) -> String {
    match p {
        FieldRuleParam::Single(l) => l.value.to_string(),
        FieldRuleParam::Array { items, .. } => {
            let items: Vec<String> = items.iter().map(|i| i.value.to_string()).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

fn type_str(ty: &FieldType) -> String {
    match &ty.base {
        FieldTypeBase::Named(_) => ty.to_string(),
        FieldTypeBase::Object(children) => {
            let suffix = if ty.is_array { "[]" } else { "" };
            format!("{}{suffix}", fields_str(children))
        }
    }
}

fn field_str(f: &Field) -> String {
    let mut s = String::new();
    if f.docstring.is_some() {
        s.push_str("(doc) ");
    }
    s.push_str(&f.name.name);
    if f.optional {
        s.push('?');
    }
    s.push_str(": ");
    s.push_str(&type_str(&f.ty));
    for r in &f.rules {
        s.push_str(&format!(" @{}", r.name));
        match (&r.param, &r.error) {
            (None, None) => (),
            (Some(p), None) => s.push_str(&format!("({})", param_str(p))),
            (None, Some(e)) => s.push_str(&format!("(error: {:?})", e.message)),
            (Some(p), Some(e)) => {
                s.push_str(&format!("({}, error: {:?})", param_str(p), e.message))
            }
        }
    }
    s
}

fn fields_str(children: &[FieldOrComment]) -> String {
    let items: Vec<String> = children
        .iter()
        .map(|c| match c {
            FieldOrComment::Field(f) => field_str(f),
            FieldOrComment::Comment(c) => format!("// {}", c.text),
            FieldOrComment::Docstring(d) => format!("doc {:?}", d.value),
        })
        .collect();
    format!("{{{}}}", items.join(", "))
}

fn decl_prefix(kind: &str, name: &Name, doc: &Option<Docstring>, dep: &Option<Deprecation>) -> String {
    let mut s = String::new();
    if doc.is_some() {
        s.push_str("(doc) ");
    }
    match dep {
        Some(Deprecation { message: Some(m), .. }) => s.push_str(&format!("(deprecated {m:?}) ")),
        Some(_) => s.push_str("(deprecated) "),
        None => (),
    }
    s.push_str(&format!("{kind} {name}"));
    s
}

fn proc_str(kind: &str, p: &ProcDecl) -> String {
    let blocks: Vec<String> = p
        .children
        .iter()
        .map(|c| match c {
            ProcChild::Input(b) => format!("input {}", fields_str(&b.children)),
            ProcChild::Output(b) => format!("output {}", fields_str(&b.children)),
            ProcChild::Meta(m) => {
                let entries: Vec<String> = m
                    .entries()
                    .map(|e| format!("{}: {}", e.key, e.value.value))
                    .collect();
                format!("meta {{{}}}", entries.join(", "))
            }
            ProcChild::Comment(c) => format!("// {}", c.text),
        })
        .collect();
    format!(
        "{} {{{}}}",
        decl_prefix(kind, &p.name, &p.docstring, &p.deprecation),
        blocks.join(", ")
    )
}

/// A compact, stable rendering of a top-level item.
fn describe(child: &SchemaChild) -> String {
    match child {
        SchemaChild::Version(v) => format!("version {}", v.number),
        SchemaChild::Import(i) => format!("import {}", i.path),
        SchemaChild::Comment(c) => format!("// {}", c.text),
        SchemaChild::Docstring(d) => format!("doc {:?}", d.value),
        SchemaChild::Rule(r) => {
            let clauses: Vec<String> = r
                .children
                .iter()
                .map(|c| match c {
                    RuleChild::For(f) => format!("for: {}", f.target_display()),
                    RuleChild::Param(p) => {
                        format!("param: {}{}", p.ty, if p.is_array { "[]" } else { "" })
                    }
                    RuleChild::Error(e) => format!("error: {:?}", e.message),
                    RuleChild::Comment(c) => format!("// {}", c.text),
                })
                .collect();
            format!(
                "{} {{{}}}",
                decl_prefix("rule", &r.name, &r.docstring, &r.deprecation),
                clauses.join(", ")
            )
        }
        SchemaChild::Type(t) => format!(
            "{} {}",
            decl_prefix("type", &t.name, &t.docstring, &t.deprecation),
            fields_str(&t.children)
        ),
        SchemaChild::Proc(p) => proc_str("proc", p),
        SchemaChild::Stream(s) => proc_str("stream", s),
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct TestCase {
    note: String,
    source: String,
    declarations: Option<Vec<String>>,
    error: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");

    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    for case in &test.cases {
        print!("\ncase {} ", case.note);
        let source = Source::new("case.rpcdl".to_string(), case.source.clone());
        let mut parser = Parser::new(&source);
        match parser.parse() {
            Ok(schema) => {
                if let Some(e) = &case.error {
                    bail!("error `{}` not raised by parser.", e);
                }
                if let Some(expected) = &case.declarations {
                    let actual: Vec<String> = schema.children.iter().map(describe).collect();
                    my_assert_eq!(
                        actual.len(),
                        expected.len(),
                        "mismatch in number of declarations\n{actual:#?}"
                    );
                    for (a, e) in actual.iter().zip(expected) {
                        my_assert_eq!(a, e, "declaration mismatch");
                    }
                }
            }
            Err(actual) => match &case.error {
                Some(expected) => {
                    let actual = actual.to_string();
                    if !actual.contains(expected) {
                        bail!(
                            "Error message\n`{}\n`\ndoes not contain `{}`",
                            actual,
                            expected
                        );
                    }
                    println!("{actual}");
                }
                _ => bail!("{}", actual.render()),
            },
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

#[test_resources("tests/parser/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
