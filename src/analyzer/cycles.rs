// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::resolver::CombinedSchema;

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Edges `A -> B` for every mandatory field of `A` whose type is the declared
/// type `B`. Optional fields, and everything nested under them, are skipped.
fn collect_edges<'a>(
    children: &'a [FieldOrComment],
    schema: &CombinedSchema,
    edges: &mut Vec<&'a str>,
) {
    for field in fields(children) {
        if field.optional {
            continue;
        }
        match &field.ty.base {
            FieldTypeBase::Named(n) if schema.types.contains_key(&n.name) => {
                if !edges.contains(&n.name.as_str()) {
                    edges.push(&n.name);
                }
            }
            FieldTypeBase::Named(_) => (),
            FieldTypeBase::Object(nested) => collect_edges(nested, schema, edges),
        }
    }
}

struct CycleFinder<'a> {
    graph: BTreeMap<&'a str, Vec<&'a str>>,
    marks: BTreeMap<&'a str, Mark>,
    stack: Vec<&'a str>,
    cycles: Vec<Vec<&'a str>>,
}

impl<'a> CycleFinder<'a> {
    fn visit(&mut self, node: &'a str) {
        match self.marks.get(node).copied().unwrap_or(Mark::Unvisited) {
            Mark::Done => return,
            Mark::Visiting => {
                if let Some(idx) = self.stack.iter().position(|n| *n == node) {
                    let mut cycle = self.stack[idx..].to_vec();
                    cycle.push(node);
                    self.cycles.push(cycle);
                }
                return;
            }
            Mark::Unvisited => (),
        }

        self.marks.insert(node, Mark::Visiting);
        self.stack.push(node);
        let next = self.graph.get(node).cloned().unwrap_or_default();
        for n in next {
            self.visit(n);
        }
        self.stack.pop();
        self.marks.insert(node, Mark::Done);
    }
}

/// Report every cycle of mandatory type references once, at the type where
/// the traversal entered it.
pub fn check(schema: &CombinedSchema) -> Vec<Diagnostic> {
    let mut graph = BTreeMap::new();
    for (name, decl) in &schema.types {
        let mut edges = vec![];
        collect_edges(&decl.children, schema, &mut edges);
        graph.insert(name.as_str(), edges);
    }

    let mut finder = CycleFinder {
        graph,
        marks: BTreeMap::new(),
        stack: vec![],
        cycles: vec![],
    };

    // Declaration order keeps the reported starting point stable.
    for decl in schema.schema.types() {
        finder.visit(&decl.name.name);
    }

    finder
        .cycles
        .into_iter()
        .filter_map(|cycle| {
            let start = schema.types.get(*cycle.first()?)?;
            Some(Diagnostic::new(
                start.name.span.clone(),
                format!("circular type dependency detected: {}", cycle.join(" -> ")),
            ))
        })
        .collect()
}
