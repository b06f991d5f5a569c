// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// What a built-in rule accepts between its parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    None,
    Int,
    String,
    /// A bound whose kind follows the field: int for `int`, int or float for
    /// `float`, string for `datetime`.
    Bound,
    /// An array whose items have the field's primitive type.
    Values,
}

#[derive(Debug)]
pub struct BuiltinRule {
    pub name: &'static str,
    /// Primitive types the rule applies to. `array` stands for any array.
    pub targets: &'static [&'static str],
    pub param: ParamKind,
}

pub const BUILTIN_RULES: &[BuiltinRule] = &[
    BuiltinRule {
        name: "minLen",
        targets: &["string", "array"],
        param: ParamKind::Int,
    },
    BuiltinRule {
        name: "maxLen",
        targets: &["string", "array"],
        param: ParamKind::Int,
    },
    BuiltinRule {
        name: "enum",
        targets: &["string", "int"],
        param: ParamKind::Values,
    },
    BuiltinRule {
        name: "email",
        targets: &["string"],
        param: ParamKind::None,
    },
    BuiltinRule {
        name: "iso8601",
        targets: &["string"],
        param: ParamKind::None,
    },
    BuiltinRule {
        name: "uuid",
        targets: &["string"],
        param: ParamKind::None,
    },
    BuiltinRule {
        name: "json",
        targets: &["string"],
        param: ParamKind::None,
    },
    BuiltinRule {
        name: "lowercase",
        targets: &["string"],
        param: ParamKind::None,
    },
    BuiltinRule {
        name: "uppercase",
        targets: &["string"],
        param: ParamKind::None,
    },
    BuiltinRule {
        name: "regex",
        targets: &["string"],
        param: ParamKind::String,
    },
    BuiltinRule {
        name: "contains",
        targets: &["string"],
        param: ParamKind::String,
    },
    BuiltinRule {
        name: "min",
        targets: &["int", "float", "datetime"],
        param: ParamKind::Bound,
    },
    BuiltinRule {
        name: "max",
        targets: &["int", "float", "datetime"],
        param: ParamKind::Bound,
    },
];

pub fn lookup(name: &str) -> Option<&'static BuiltinRule> {
    BUILTIN_RULES.iter().find(|r| r.name == name)
}

pub fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

impl BuiltinRule {
    pub fn applies_to(&self, base: &str, is_array: bool) -> bool {
        match is_array {
            true => self.targets.contains(&"array"),
            false => self.targets.contains(&base),
        }
    }

    pub fn targets_display(&self) -> String {
        self.targets.join(", ")
    }
}
