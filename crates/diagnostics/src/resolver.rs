//! Module Path Resolution
//!
//! The analyzer names the reporting module either as a dotted import name
//! (`pkg.sub.mod`) or as a path relative to its working directory. This module
//! turns that identifier back into a source file path. It is a heuristic, not
//! an import system: the rules below are applied in order and the first one
//! that yields an existing file wins.
//!
//! 1. If the identifier does not start with the target's base name but contains
//!    it, everything before the base name is dropped (output artifacts sometimes
//!    prefix the real module name).
//! 2. Identifiers that start with `.`, equal the base name, or look like a path
//!    are joined to the target directory as-is; anything else is split on `.`.
//! 3. A directory resolves to its `__init__` module.
//! 4. `.py` then `.pyw` is appended when the bare path is not a file. When
//!    nothing exists, `.py` is assumed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::detector::{has_module_extension, PathProbe, MODULE_EXTENSIONS, PACKAGE_INIT};
use crate::models::Target;

/// Drop whatever precedes the base name inside `identifier`.
pub fn strip_extraction_prefix<'a>(identifier: &'a str, base_name: &str) -> &'a str {
    if base_name.is_empty() || identifier.starts_with(base_name) {
        return identifier;
    }
    match identifier.find(base_name) {
        Some(index) => &identifier[index..],
        None => identifier,
    }
}

fn looks_like_path(identifier: &str) -> bool {
    identifier.contains('/') || identifier.contains('\\') || has_module_extension(Path::new(identifier))
}

fn with_extension_appended(path: &Path, ext: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Resolve a module identifier reported for `target` into a source path.
pub fn resolve_module<P: PathProbe + ?Sized>(target: &Target, identifier: &str, probe: &P) -> PathBuf {
    let base_name = target.base_name();
    let module = strip_extraction_prefix(identifier.trim(), &base_name);
    let directory = target.directory();

    let mut candidate = if module.starts_with('.') || module == base_name || looks_like_path(module) {
        directory.join(module)
    } else {
        module
            .split('.')
            .filter(|part| !part.is_empty())
            .fold(directory.to_path_buf(), |acc, part| acc.join(part))
    };

    if probe.is_dir(&candidate) {
        candidate.push(PACKAGE_INIT);
    }
    if probe.is_file(&candidate) {
        return candidate;
    }

    for ext in MODULE_EXTENSIONS {
        let with_ext = with_extension_appended(&candidate, ext);
        if probe.is_file(&with_ext) {
            return with_ext;
        }
    }

    if has_module_extension(&candidate) {
        candidate
    } else {
        with_extension_appended(&candidate, MODULE_EXTENSIONS[0])
    }
}
