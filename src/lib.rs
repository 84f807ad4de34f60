//! Ruleset Schema
//!
//! Structural validation of repository ruleset payloads against a small,
//! declarative subset of JSON Schema, plus the cross-field rules the subset
//! cannot express.
//!
//! Validation never stops at the first problem: every failing constraint
//! contributes a [`Violation`] with a dotted/bracketed path
//! (`payload.rules[1].parameters`), so callers can show everything that is
//! wrong at once.
//!
//! # Example
//!
//! ```
//! use ruleset_schema::{validate, SchemaDocument, Value};
//! use serde_json::json;
//!
//! let document = SchemaDocument::from_json(&json!({
//!     "type": "object",
//!     "required": ["name", "enforcement"],
//!     "properties": {
//!         "name": { "type": "string", "minLength": 1 },
//!         "enforcement": { "type": "string", "enum": ["disabled", "evaluate", "active"] }
//!     }
//! }))
//! .unwrap();
//!
//! let payload = Value::from_json(&json!({ "enforcement": "bogus" })).unwrap();
//! let violations = validate(&document, &payload);
//!
//! assert_eq!(violations.len(), 2);
//! assert_eq!(violations[0].to_string(), "payload.name: required field is missing");
//! ```
//!
//! # Supported Keywords
//!
//! | Keyword | Effect |
//! |---------|--------|
//! | `type` | `object`, `array`, `string`, `integer`, `boolean`; a mismatch skips the rest of the subtree; other names and unions constrain nothing |
//! | `enum` | value must equal one of the literals |
//! | `required` / `properties` | missing fields reported in declared order; unknown keys ignored |
//! | `items` | every element, path suffixed with `[index]` |
//! | `minLength` | string length floor, in characters |
//! | `allOf` | every branch at the same path |
//! | `if` / `then` | `then` applies when every `const` in `if.properties` matches |
//! | `$ref` | `#/$defs/<name>`; unresolved references impose no constraint |

mod error;
mod linter;
mod loader;
mod payload;
mod resolver;
mod rules;
mod ruleset;
mod schema;
mod types;
mod validator;

pub use error::{LoadError, ValidateError, Violation};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{is_url, load_document, load_json, load_json_auto, load_json_str, load_payload};
pub use payload::prepare_payload;
pub use resolver::{def_name, resolve};
pub use rules::{check_rules, Rule, RULES};
pub use ruleset::{
    check_payload, ruleset_schema, validate_payload, validate_ruleset_payload,
    RULESET_SCHEMA_JSON,
};
pub use schema::{
    Conditional, FieldTest, Keyword, Kind, ObjectShape, Predicate, SchemaDocument, SchemaNode,
};
pub use types::{ValidateOptions, Value, DEFAULT_ROOT_LABEL};
pub use validator::{validate, validate_at};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
