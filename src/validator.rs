//! Structural validation of a payload against a schema document.
//!
//! The walk never stops at the first problem. A kind mismatch ends the walk
//! for that subtree only; every other keyword is evaluated independently and
//! all violations are returned in traversal order.

use indexmap::IndexMap;

use crate::error::Violation;
use crate::resolver::resolve;
use crate::schema::{Keyword, ObjectShape, SchemaDocument, SchemaNode};
use crate::types::{Value, DEFAULT_ROOT_LABEL};

/// Validate a payload against the document root.
///
/// Paths are rooted at `payload`.
pub fn validate(document: &SchemaDocument, payload: &Value) -> Vec<Violation> {
    validate_at(document, &document.root, payload, DEFAULT_ROOT_LABEL)
}

/// Validate `value` against any node of `document`, rooting paths at `path`.
pub fn validate_at(
    document: &SchemaDocument,
    node: &SchemaNode,
    value: &Value,
    path: &str,
) -> Vec<Violation> {
    let mut walker = Walker {
        document,
        violations: Vec::new(),
    };
    walker.visit(node, value, path, &mut Vec::new());
    walker.violations
}

struct Walker<'d> {
    document: &'d SchemaDocument,
    violations: Vec<Violation>,
}

impl<'d> Walker<'d> {
    fn report(&mut self, path: &str, message: String) {
        self.violations.push(Violation::new(path, message));
    }

    /// `refs` holds the references entered at this value since the last
    /// descent; seeing one again means the document loops without progress.
    fn visit(&mut self, node: &'d SchemaNode, value: &Value, path: &str, refs: &mut Vec<&'d str>) {
        if let Some(kind) = node.kind {
            if !kind.matches(value) {
                self.report(
                    path,
                    format!(
                        "expected type '{}', got '{}'",
                        kind.as_str(),
                        value.kind_name()
                    ),
                );
                return;
            }
        }

        for keyword in &node.keywords {
            match keyword {
                Keyword::Enum(allowed) => {
                    if !allowed.contains(value) {
                        self.report(
                            path,
                            format!("value {} is not one of {}", value, render_literals(allowed)),
                        );
                    }
                }
                Keyword::Object(shape) => {
                    if let Value::Mapping(map) = value {
                        self.visit_object(shape, map, path);
                    }
                }
                Keyword::Items(items) => {
                    if let Value::Sequence(elements) = value {
                        for (idx, element) in elements.iter().enumerate() {
                            let element_path = format!("{}[{}]", path, idx);
                            self.visit(items, element, &element_path, &mut Vec::new());
                        }
                    }
                }
                Keyword::MinLength(floor) => {
                    if let Value::String(s) = value {
                        let length = s.chars().count();
                        if length < *floor {
                            self.report(
                                path,
                                format!("length {} is below the minimum of {}", length, floor),
                            );
                        }
                    }
                }
                Keyword::AllOf(branches) => {
                    for branch in branches {
                        self.visit(branch, value, path, refs);
                    }
                }
                Keyword::Conditional(cond) => {
                    if cond.predicate.holds(value) {
                        self.visit(&cond.then, value, path, refs);
                    }
                }
                Keyword::Ref(token) => self.visit_ref(token, value, path, refs),
            }
        }
    }

    fn visit_object(&mut self, shape: &'d ObjectShape, map: &IndexMap<String, Value>, path: &str) {
        for name in &shape.required {
            if !map.contains_key(name) {
                self.report(
                    &format!("{}.{}", path, name),
                    "required field is missing".to_string(),
                );
            }
        }

        // Keys without a property schema are left alone.
        for (key, child) in map {
            if let Some(prop) = shape.properties.get(key) {
                let child_path = format!("{}.{}", path, key);
                self.visit(prop, child, &child_path, &mut Vec::new());
            }
        }
    }

    fn visit_ref(&mut self, token: &'d str, value: &Value, path: &str, refs: &mut Vec<&'d str>) {
        if refs.contains(&token) {
            tracing::warn!(reference = %token, at = %path, "cyclic reference skipped");
            return;
        }
        let Some(target) = resolve(self.document, token) else {
            tracing::debug!(reference = %token, at = %path, "unresolved reference imposes no constraint");
            return;
        };

        refs.push(token);
        self.visit(target, value, path, refs);
        refs.pop();
    }
}

fn render_literals(literals: &[Value]) -> String {
    serde_json::Value::Array(literals.iter().map(serde_json::Value::from).collect()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(schema: serde_json::Value, payload: serde_json::Value) -> Vec<Violation> {
        let document = SchemaDocument::from_json(&schema).unwrap();
        let payload = Value::from_json(&payload).unwrap();
        validate(&document, &payload)
    }

    #[test]
    fn valid_payload_has_no_violations() {
        let violations = check(
            json!({
                "type": "object",
                "required": ["name"],
                "properties": { "name": { "type": "string", "minLength": 1 } }
            }),
            json!({ "name": "main protection" }),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn kind_mismatch_stops_the_subtree() {
        let violations = check(
            json!({
                "type": "object",
                "required": ["name", "enforcement"],
                "properties": { "name": { "type": "string" } }
            }),
            json!(["not", "an", "object"]),
        );
        assert_eq!(
            violations,
            [Violation::new("payload", "expected type 'object', got 'array'")]
        );
    }

    #[test]
    fn boolean_is_not_an_integer() {
        let violations = check(
            json!({ "type": "object", "properties": { "actor_id": { "type": "integer" } } }),
            json!({ "actor_id": true }),
        );
        assert_eq!(
            violations,
            [Violation::new(
                "payload.actor_id",
                "expected type 'integer', got 'boolean'"
            )]
        );
    }

    #[test]
    fn enum_violation_names_value_and_set() {
        let violations = check(
            json!({ "type": "string", "enum": ["branch", "tag", "push"] }),
            json!("commit"),
        );
        assert_eq!(
            violations,
            [Violation::new(
                "payload",
                r#"value "commit" is not one of ["branch","tag","push"]"#
            )]
        );
    }

    #[test]
    fn enum_violation_does_not_stop_other_checks() {
        let violations = check(
            json!({ "type": "string", "enum": ["active"], "minLength": 10 }),
            json!("off"),
        );
        assert_eq!(violations.len(), 2);
        assert!(violations[0].message.contains("is not one of"));
        assert_eq!(violations[1].message, "length 3 is below the minimum of 10");
    }

    #[test]
    fn required_fields_reported_in_declared_order() {
        let violations = check(
            json!({ "type": "object", "required": ["name", "enforcement", "target"] }),
            json!({}),
        );
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            ["payload.name", "payload.enforcement", "payload.target"]
        );
        assert!(violations
            .iter()
            .all(|v| v.message == "required field is missing"));
    }

    #[test]
    fn required_is_checked_against_data_keys_only() {
        // `parameters` is required without being typed in `properties`.
        let violations = check(
            json!({ "type": "object", "required": ["parameters"], "properties": {} }),
            json!({ "parameters": 5 }),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let violations = check(
            json!({ "type": "object", "properties": { "name": { "type": "string" } } }),
            json!({ "name": "x", "node_id": 42, "_links": {} }),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn items_are_indexed_from_zero() {
        let violations = check(
            json!({ "type": "array", "items": { "type": "string" } }),
            json!(["refs/heads/main", 7, "refs/heads/dev", false]),
        );
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["payload[1]", "payload[3]"]);
    }

    #[test]
    fn min_length_counts_characters() {
        let schema = json!({ "type": "string", "minLength": 2 });
        assert!(check(schema.clone(), json!("é!")).is_empty());
        assert_eq!(
            check(schema, json!("é")),
            [Violation::new("payload", "length 1 is below the minimum of 2")]
        );
    }

    #[test]
    fn all_of_accumulates_every_branch() {
        let violations = check(
            json!({
                "allOf": [
                    { "type": "object", "required": ["name"] },
                    { "type": "object", "required": ["enforcement"] }
                ]
            }),
            json!({}),
        );
        assert_eq!(
            violations,
            [
                Violation::new("payload.name", "required field is missing"),
                Violation::new("payload.enforcement", "required field is missing"),
            ]
        );
    }

    #[test]
    fn conditional_applies_only_when_predicate_holds() {
        let schema = json!({
            "type": "object",
            "if": { "properties": { "type": { "const": "required_status_checks" } } },
            "then": { "required": ["parameters"] }
        });

        let violations = check(schema.clone(), json!({ "type": "required_status_checks" }));
        assert_eq!(
            violations,
            [Violation::new("payload.parameters", "required field is missing")]
        );

        assert!(check(schema.clone(), json!({ "type": "deletion" })).is_empty());
        assert!(check(schema, json!({})).is_empty());
    }

    #[test]
    fn reference_is_transparent_to_the_path() {
        let violations = check(
            json!({
                "type": "object",
                "properties": { "conditions": { "$ref": "#/$defs/conditions" } },
                "$defs": { "conditions": { "type": "object" } }
            }),
            json!({ "conditions": "all" }),
        );
        assert_eq!(
            violations,
            [Violation::new(
                "payload.conditions",
                "expected type 'object', got 'string'"
            )]
        );
    }

    #[test]
    fn unresolved_reference_imposes_nothing() {
        let violations = check(
            json!({
                "type": "object",
                "properties": { "conditions": { "$ref": "#/$defs/missing" } },
                "$defs": {}
            }),
            json!({ "conditions": "all" }),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn cyclic_reference_terminates() {
        let violations = check(
            json!({
                "$ref": "#/$defs/a",
                "$defs": {
                    "a": { "allOf": [{ "$ref": "#/$defs/b" }] },
                    "b": { "type": "object", "required": ["id"], "$ref": "#/$defs/a" }
                }
            }),
            json!({}),
        );
        assert_eq!(
            violations,
            [Violation::new("payload.id", "required field is missing")]
        );
    }

    #[test]
    fn recursive_reference_through_a_property_descends() {
        let violations = check(
            json!({
                "$ref": "#/$defs/node",
                "$defs": {
                    "node": {
                        "type": "object",
                        "required": ["name"],
                        "properties": { "child": { "$ref": "#/$defs/node" } }
                    }
                }
            }),
            json!({ "name": "a", "child": { "name": "b", "child": {} } }),
        );
        assert_eq!(
            violations,
            [Violation::new(
                "payload.child.child.name",
                "required field is missing"
            )]
        );
    }

    #[test]
    fn validate_at_uses_given_root() {
        let document = SchemaDocument::from_json(&json!({
            "$defs": { "flag": { "type": "boolean" } }
        }))
        .unwrap();
        let violations = validate_at(
            &document,
            &document.defs["flag"],
            &Value::String("yes".into()),
            "ruleset.rules[0].parameters.strict",
        );
        assert_eq!(violations[0].path, "ruleset.rules[0].parameters.strict");
    }
}
