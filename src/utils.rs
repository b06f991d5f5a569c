// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize `path`: drop `.` components and fold `..` into the
/// preceding component. The file system is not consulted.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = vec![];
    for comp in path.components() {
        match comp {
            Component::CurDir => (),
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`.
                Some(Component::RootDir | Component::Prefix(_)) => (),
                _ => out.push(comp),
            },
            _ => out.push(comp),
        }
    }
    out.iter().collect()
}

/// Resolve `path` against the directory containing `relative_to`. Absolute
/// paths ignore `relative_to`.
pub fn resolve_path(relative_to: &str, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return clean_path(path);
    }
    let base = Path::new(relative_to).parent().unwrap_or(Path::new(""));
    clean_path(&base.join(path))
}

/// Absolute, normalized form of `path`, using the current directory for
/// relative paths.
pub fn absolute_path(path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        return clean_path(p);
    }
    match std::env::current_dir() {
        Ok(cwd) => clean_path(&cwd.join(p)),
        Err(_) => clean_path(p),
    }
}

pub fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `fooBar`: lowercase ASCII letter first, ASCII letters and digits after.
pub fn is_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}

/// `FooBar`: uppercase ASCII letter first, ASCII letters and digits after.
pub fn is_pascal_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric())
}
