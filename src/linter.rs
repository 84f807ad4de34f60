//! Schema linting - static analysis of schema documents.
//!
//! Validates schema files for:
//! - JSON syntax errors
//! - Constructs outside the supported subset
//! - References that do not resolve, or point outside the document
//! - Keywords the validator accepts but never evaluates

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::loader::load_json;
use crate::resolver::def_name;
use crate::schema::{
    child_pointer, display_pointer, is_modeled_type, SchemaDocument, DEFS_KEY, IGNORED_KEYWORDS,
};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON pointer to the issue (e.g., "/$defs/rule/allOf/0")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if no file has errors.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }

    /// Whether the run succeeds; in strict mode warnings fail it too.
    pub fn passes(&self, strict: bool) -> bool {
        self.is_ok() && (!strict || self.warnings == 0)
    }
}

impl FileStatus {
    fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        if diagnostics.iter().any(|d| d.severity == Severity::Error) {
            FileStatus::Error
        } else if diagnostics.is_empty() {
            FileStatus::Ok
        } else {
            FileStatus::Warning
        }
    }

    fn fails(self, strict: bool) -> bool {
        match self {
            FileStatus::Error => true,
            FileStatus::Warning => strict,
            FileStatus::Ok => false,
        }
    }
}

/// Lint a schema file, or every `.json` file below a directory.
///
/// With `strict`, files that only carry warnings count as failed.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let results: Vec<FileResult> = schema_files(path)
        .iter()
        .map(|file| lint_file(file, path))
        .collect();

    let tally = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = tally(Severity::Error);
    let warnings = tally(Severity::Warning);
    let failed = results.iter().filter(|r| r.status.fails(strict)).count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: results.len(),
        passed: results.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

fn diagnostic(
    file: &Path,
    severity: Severity,
    code: &str,
    path: String,
    message: String,
) -> Diagnostic {
    Diagnostic {
        severity,
        code: code.to_string(),
        file: file.to_path_buf(),
        path,
        message,
    }
}

/// Lint a single schema file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let mut diagnostics = Vec::new();
    let mut report = |severity: Severity, code: &str, path: String, message: String| {
        diagnostics.push(diagnostic(file, severity, code, path, message));
    };

    let json = match load_json(file) {
        Ok(json) => Some(json),
        Err(e) => {
            report(
                Severity::Error,
                "E001",
                "/".to_string(),
                format!("syntax error: {}", e),
            );
            None
        }
    };

    if let Some(json) = &json {
        check_keywords(json, "", &mut report);

        match SchemaDocument::from_json(json) {
            Err(e) => report(Severity::Error, "E002", "/".to_string(), e.to_string()),
            Ok(document) => {
                for (pointer, token) in document.dangling_refs() {
                    // Non-local refs were already reported by the keyword walk.
                    if token.starts_with('#') {
                        report(
                            Severity::Error,
                            "E003",
                            pointer,
                            format!("reference not found: {}", token),
                        );
                    }
                }
                for (name, cycle) in reference_cycles(&document) {
                    report(
                        Severity::Warning,
                        "W003",
                        child_pointer(&format!("/{}", DEFS_KEY), &name),
                        format!("reference cycle without progress: {}", cycle.join(" -> ")),
                    );
                }
            }
        }
    }

    // Only worth asking once the subset checks are clean.
    let clean = FileStatus::from_diagnostics(&diagnostics) != FileStatus::Error;
    if let Some(json) = json.as_ref().filter(|_| clean) {
        if let Err(e) = jsonschema::validator_for(json) {
            diagnostics.push(diagnostic(
                file,
                Severity::Error,
                "E005",
                "/".to_string(),
                format!("not a valid JSON Schema: {}", e),
            ));
        }
    }

    let status = FileStatus::from_diagnostics(&diagnostics);
    FileResult {
        file: file.strip_prefix(base_path).unwrap_or(file).to_path_buf(),
        status,
        diagnostics,
    }
}

/// Walk schema positions (not data positions such as `enum` or `if`).
fn check_keywords<F>(value: &Value, pointer: &str, report: &mut F)
where
    F: FnMut(Severity, &str, String, String),
{
    let Value::Object(map) = value else {
        return;
    };

    for key in map.keys() {
        if IGNORED_KEYWORDS.contains(&key.as_str()) {
            report(
                Severity::Warning,
                "W001",
                child_pointer(pointer, key),
                format!("keyword \"{}\" is not evaluated by the validator", key),
            );
        }
    }

    if let Some(declared) = map.get("type").filter(|t| !is_modeled_type(t)) {
        report(
            Severity::Warning,
            "W001",
            child_pointer(pointer, "type"),
            format!("type {} is not evaluated by the validator", declared),
        );
    }

    if !pointer.is_empty() && map.contains_key(DEFS_KEY) {
        report(
            Severity::Warning,
            "W001",
            child_pointer(pointer, DEFS_KEY),
            "nested $defs cannot be referenced".to_string(),
        );
    }

    if map.contains_key("if") != map.contains_key("then") {
        report(
            Severity::Warning,
            "W002",
            display_pointer(pointer),
            "\"if\" and \"then\" must appear together; this one is ignored".to_string(),
        );
    }

    if let Some(Value::String(token)) = map.get("$ref") {
        if !token.starts_with('#') {
            report(
                Severity::Error,
                "E004",
                child_pointer(pointer, "$ref"),
                format!("non-local reference is not supported: {}", token),
            );
        }
    }

    if let Some(Value::Object(properties)) = map.get("properties") {
        let base = format!("{}/properties", pointer);
        for (name, prop) in properties {
            check_keywords(prop, &child_pointer(&base, name), report);
        }
    }
    if let Some(items) = map.get("items") {
        check_keywords(items, &format!("{}/items", pointer), report);
    }
    if let Some(Value::Array(branches)) = map.get("allOf") {
        for (idx, branch) in branches.iter().enumerate() {
            check_keywords(branch, &format!("{}/allOf/{}", pointer, idx), report);
        }
    }
    if let Some(then) = map.get("then") {
        check_keywords(then, &format!("{}/then", pointer), report);
    }
    if pointer.is_empty() {
        if let Some(Value::Object(defs)) = map.get(DEFS_KEY) {
            let base = format!("/{}", DEFS_KEY);
            for (name, def) in defs {
                check_keywords(def, &child_pointer(&base, name), report);
            }
        }
    }
}

/// Definitions that reach themselves through references alone, with the path taken.
fn reference_cycles(document: &SchemaDocument) -> Vec<(String, Vec<String>)> {
    document
        .defs
        .keys()
        .filter_map(|start| {
            let mut path = vec![start.clone()];
            let mut seen = HashSet::new();
            find_cycle(document, start, start, &mut path, &mut seen).then(|| (start.clone(), path))
        })
        .collect()
}

fn find_cycle(
    document: &SchemaDocument,
    current: &str,
    start: &str,
    path: &mut Vec<String>,
    seen: &mut HashSet<String>,
) -> bool {
    let Some(node) = document.defs.get(current) else {
        return false;
    };
    for token in node.transparent_refs() {
        let Some(name) = def_name(token) else {
            continue;
        };
        if name == start {
            path.push(name.into_owned());
            return true;
        }
        if !document.defs.contains_key(name.as_ref()) || !seen.insert(name.to_string()) {
            continue;
        }
        path.push(name.to_string());
        if find_cycle(document, &name, start, path, seen) {
            return true;
        }
        path.pop();
    }
    false
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// `.json` files at or below `root`, sorted.
fn schema_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return if is_json(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if is_json(&path) {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}
