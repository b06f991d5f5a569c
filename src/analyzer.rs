// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod builtins;
mod cycles;

pub use builtins::{BuiltinRule, ParamKind, BUILTIN_RULES};

use crate::ast::*;
use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::lexer::Span;
use crate::resolver::CombinedSchema;
use crate::token::is_primitive_type;
use crate::utils::{is_camel_case, is_pascal_case};

use std::collections::BTreeMap;

use tracing::debug;

/// Types a rule `param` clause may name.
const PARAM_TYPES: [&str; 4] = ["string", "int", "float", "bool"];

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Whether `literal` is acceptable where a value of primitive type `ty` is
/// expected. Integers are accepted for floats.
fn literal_matches(ty: &str, literal: &Literal) -> bool {
    matches!(
        (ty, &literal.value),
        ("string", LiteralValue::String(_))
            | ("int", LiteralValue::Int(_))
            | ("float", LiteralValue::Float(_) | LiteralValue::Int(_))
            | ("bool", LiteralValue::Bool(_))
    )
}

/// Semantic checks over a resolved schema. Every pass runs; diagnostics are
/// accumulated rather than stopping at the first one.
pub struct Analyzer<'a> {
    schema: &'a CombinedSchema,
    config: Config,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Analyzer<'a> {
    pub fn new(schema: &'a CombinedSchema) -> Self {
        Self::with_config(schema, Config::default())
    }

    pub fn with_config(schema: &'a CombinedSchema, config: Config) -> Self {
        Self {
            schema,
            config,
            diagnostics: vec![],
        }
    }

    pub fn analyze(mut self) -> Vec<Diagnostic> {
        let schema = self.schema;

        self.check_declarations();
        debug!(diagnostics = self.diagnostics.len(), "declarations checked");

        for rule in schema.schema.rules() {
            self.check_rule_decl(rule);
        }
        for ty in schema.schema.types() {
            self.check_field_list(&ty.children);
        }
        for child in &schema.schema.children {
            match child {
                SchemaChild::Proc(p) => self.check_proc(p, "proc"),
                SchemaChild::Stream(s) => self.check_proc(s, "stream"),
                _ => (),
            }
        }
        debug!(diagnostics = self.diagnostics.len(), "references checked");

        self.diagnostics.extend(cycles::check(schema));
        debug!(diagnostics = self.diagnostics.len(), "analysis done");

        self.diagnostics
    }

    fn report(&mut self, span: &Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(span.clone(), message));
    }

    // Uniqueness of names within each namespace, and casing.
    fn check_declarations(&mut self) {
        let schema = self.schema;
        let mut seen: BTreeMap<(&str, &str), Span> = BTreeMap::new();
        for child in &schema.schema.children {
            let (kind, name) = match child {
                SchemaChild::Rule(r) => ("rule", &r.name),
                SchemaChild::Type(t) => ("type", &t.name),
                SchemaChild::Proc(p) => ("proc", &p.name),
                SchemaChild::Stream(s) => ("stream", &s.name),
                _ => continue,
            };

            match seen.get(&(kind, name.name.as_str())) {
                Some(first) => {
                    let msg = format!("{kind} \"{name}\" is already declared at {first}");
                    self.report(&name.span, msg);
                }
                None => {
                    seen.insert((kind, name.name.as_str()), name.span.clone());
                }
            }

            if kind == "rule" && builtins::is_builtin(&name.name) {
                self.report(
                    &name.span,
                    format!("rule \"{name}\" is a built-in rule and cannot be redeclared"),
                );
            }

            if self.config.check_casing {
                let (ok, casing) = match kind {
                    "rule" => (is_camel_case(&name.name), "camelCase"),
                    _ => (is_pascal_case(&name.name), "PascalCase"),
                };
                if !ok {
                    self.report(
                        &name.span,
                        format!("{kind} name \"{name}\" must be in {casing}"),
                    );
                }
            }
        }
    }

    fn check_type_ref(&mut self, name: &Name) {
        if !is_primitive_type(&name.name) && !self.schema.types.contains_key(&name.name) {
            self.report(&name.span, format!("type \"{name}\" is not declared"));
        }
    }

    fn check_rule_decl(&mut self, rule: &RuleDecl) {
        let name = &rule.name;

        let mut fors = rule.for_clauses();
        match fors.next() {
            None => self.report(
                &name.span,
                format!("rule \"{name}\" must have exactly one for clause"),
            ),
            Some(f) => {
                // `array` on its own names any array.
                if f.is_array || f.target.name != "array" {
                    self.check_type_ref(&f.target);
                }
            }
        }
        for extra in fors {
            self.report(
                &extra.span,
                format!("rule \"{name}\" has more than one for clause"),
            );
        }

        let mut params = rule.param_clauses();
        if let Some(p) = params.next() {
            if !PARAM_TYPES.contains(&p.ty.name.as_str()) {
                self.report(
                    &p.ty.span,
                    format!(
                        "rule parameter type must be one of: {}, found \"{}\"",
                        PARAM_TYPES.join(", "),
                        p.ty
                    ),
                );
            }
        }
        for extra in params {
            self.report(
                &extra.span,
                format!("rule \"{name}\" has more than one param clause"),
            );
        }

        for extra in rule.error_clauses().skip(1) {
            self.report(
                &extra.span,
                format!("rule \"{name}\" has more than one error clause"),
            );
        }
    }

    fn check_proc(&mut self, decl: &ProcDecl, kind: &str) {
        let mut seen = [false; 3];
        for child in &decl.children {
            let (idx, block, span) = match child {
                ProcChild::Input(b) => (0, "input", &b.span),
                ProcChild::Output(b) => (1, "output", &b.span),
                ProcChild::Meta(m) => (2, "meta", &m.span),
                ProcChild::Comment(_) => continue,
            };
            if seen[idx] {
                self.report(
                    span,
                    format!("{kind} \"{}\" has more than one {block} block", decl.name),
                );
            }
            seen[idx] = true;

            match child {
                ProcChild::Input(b) | ProcChild::Output(b) => self.check_field_list(&b.children),
                ProcChild::Meta(m) => self.check_meta(m),
                ProcChild::Comment(_) => (),
            }
        }
    }

    fn check_meta(&mut self, meta: &MetaBlock) {
        let mut seen: BTreeMap<&str, &Span> = BTreeMap::new();
        for entry in meta.entries() {
            match seen.get(entry.key.name.as_str()) {
                Some(first) => {
                    let msg = format!("meta key \"{}\" is already declared at {first}", entry.key);
                    self.report(&entry.key.span, msg);
                }
                None => {
                    seen.insert(&entry.key.name, &entry.key.span);
                }
            }
        }
    }

    fn check_field_list(&mut self, children: &[FieldOrComment]) {
        let mut seen: BTreeMap<&str, &Span> = BTreeMap::new();
        for field in fields(children) {
            match seen.get(field.name.name.as_str()) {
                Some(first) => {
                    let msg = format!("field \"{}\" is already declared at {first}", field.name);
                    self.report(&field.name.span, msg);
                }
                None => {
                    seen.insert(&field.name.name, &field.name.span);
                }
            }

            match &field.ty.base {
                FieldTypeBase::Named(n) => self.check_type_ref(n),
                FieldTypeBase::Object(nested) => self.check_field_list(nested),
            }

            for rule in &field.rules {
                self.check_field_rule(field, rule);
            }
        }
    }

    fn check_field_rule(&mut self, field: &Field, rule: &FieldRule) {
        let base = match &field.ty.base {
            FieldTypeBase::Named(n) => n.name.as_str(),
            FieldTypeBase::Object(_) => "object",
        };
        let is_array = field.ty.is_array;
        let name = &rule.name;

        if let Some(builtin) = builtins::lookup(&name.name) {
            if !builtin.applies_to(base, is_array) {
                self.report(
                    &name.span,
                    format!(
                        "rule \"{name}\" cannot be applied to type \"{}\", it can only be applied to: {}",
                        field.ty,
                        builtin.targets_display()
                    ),
                );
                return;
            }
            self.check_builtin_param(builtin, rule, base, is_array);
            return;
        }

        let schema = self.schema;
        let Some(decl) = schema.rules.get(&name.name) else {
            self.report(&name.span, format!("rule \"{name}\" is not declared"));
            return;
        };
        // Missing `for` is reported on the declaration.
        let Some(target) = decl.for_clause() else {
            return;
        };

        let applies = match (is_array, target.is_array) {
            (true, true) => target.target.name == base,
            (true, false) => target.target.name == "array",
            (false, true) => false,
            (false, false) => target.target.name == base && base != "array",
        };
        if !applies {
            self.report(
                &name.span,
                format!(
                    "rule \"{name}\" cannot be applied to type \"{}\", it can only be applied to: {}",
                    field.ty,
                    target.target_display()
                ),
            );
            return;
        }

        self.check_custom_param(decl, rule);
    }

    fn check_builtin_param(
        &mut self,
        builtin: &BuiltinRule,
        rule: &FieldRule,
        base: &str,
        is_array: bool,
    ) {
        let name = &rule.name;
        let expected = match builtin.param {
            ParamKind::None => {
                if let Some(p) = &rule.param {
                    self.report(
                        p.span(),
                        format!("rule \"{name}\" does not take a parameter"),
                    );
                }
                return;
            }
            ParamKind::Int => "int",
            ParamKind::String => "string",
            ParamKind::Bound if is_array => return,
            ParamKind::Bound => match base {
                "datetime" => "string",
                other => other,
            },
            ParamKind::Values => {
                match &rule.param {
                    None => self.report(
                        &name.span,
                        format!("rule \"{name}\" requires a parameter"),
                    ),
                    Some(FieldRuleParam::Array { items, span }) if items.is_empty() => self.report(
                        span,
                        format!("rule \"{name}\" requires at least one value"),
                    ),
                    Some(FieldRuleParam::Array { items, .. })
                        if items.iter().all(|i| literal_matches(base, i)) => {}
                    Some(p) => self.report(
                        p.span(),
                        format!("rule \"{name}\" expects an array of {base} values"),
                    ),
                }
                return;
            }
        };

        match &rule.param {
            None => self.report(
                &name.span,
                format!("rule \"{name}\" requires a parameter"),
            ),
            Some(FieldRuleParam::Single(lit)) if literal_matches(expected, lit) => (),
            Some(p) => self.report(
                p.span(),
                format!(
                    "rule \"{name}\" expects {} {expected} parameter",
                    article(expected)
                ),
            ),
        }
    }

    fn check_custom_param(&mut self, decl: &RuleDecl, rule: &FieldRule) {
        let name = &rule.name;
        match (decl.param(), &rule.param) {
            (None, None) => (),
            (None, Some(p)) => self.report(
                p.span(),
                format!("rule \"{name}\" does not take a parameter"),
            ),
            (Some(_), None) => self.report(
                &name.span,
                format!("rule \"{name}\" requires a parameter"),
            ),
            (Some(param), Some(value)) => {
                let ty = param.ty.name.as_str();
                let ok = match (param.is_array, value) {
                    (false, FieldRuleParam::Single(lit)) => literal_matches(ty, lit),
                    (true, FieldRuleParam::Array { items, .. }) => {
                        items.iter().all(|i| literal_matches(ty, i))
                    }
                    _ => false,
                };
                if !ok {
                    let expected = match param.is_array {
                        true => format!("{ty}[]"),
                        false => ty.to_string(),
                    };
                    self.report(
                        value.span(),
                        format!("rule \"{name}\" expects a parameter of type {expected}"),
                    );
                }
            }
        }
    }
}

/// Run every check with the default configuration.
pub fn analyze(schema: &CombinedSchema) -> Vec<Diagnostic> {
    Analyzer::new(schema).analyze()
}
