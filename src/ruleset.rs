//! The bundled ruleset document and the validation entry points.

use crate::error::{LoadError, ValidateError, Violation};
use crate::loader::load_json_str;
use crate::rules::check_rules;
use crate::schema::SchemaDocument;
use crate::types::{ValidateOptions, Value};
use crate::validator::validate_at;

/// Schema for repository ruleset create/update payloads.
pub const RULESET_SCHEMA_JSON: &str = include_str!("../schemas/ruleset.schema.json");

/// Build the bundled ruleset document.
pub fn ruleset_schema() -> Result<SchemaDocument, LoadError> {
    let json = load_json_str(RULESET_SCHEMA_JSON)?;
    SchemaDocument::from_json(&json)
}

/// Run the structural pass and, when enabled, the semantic rules.
///
/// Structural violations come first, then rule violations in rule order.
pub fn check_payload(
    document: &SchemaDocument,
    payload: &Value,
    options: &ValidateOptions,
) -> Vec<Violation> {
    let mut violations = validate_at(document, &document.root, payload, &options.root_label);
    if options.semantic_rules {
        violations.extend(check_rules(payload, &options.root_label));
    }
    violations
}

/// Decode a JSON payload and validate it against `document`.
///
/// # Errors
///
/// Returns `ValidateError::Load` if the payload cannot be decoded, or
/// `ValidateError::Invalid` carrying every violation found.
pub fn validate_payload(
    document: &SchemaDocument,
    payload: &serde_json::Value,
    options: &ValidateOptions,
) -> Result<(), ValidateError> {
    let value = Value::decode(payload, &options.root_label)?;
    let violations = check_payload(document, &value, options);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { violations })
    }
}

/// Validate a ruleset payload against the bundled schema with default options.
pub fn validate_ruleset_payload(payload: &serde_json::Value) -> Result<(), ValidateError> {
    let document = ruleset_schema()?;
    validate_payload(&document, payload, &ValidateOptions::default())
}
