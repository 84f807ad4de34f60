//! Semantic rules for ruleset payloads.
//!
//! Cross-field constraints the schema subset has no keyword for. Each rule
//! inspects the raw payload and returns its own violations; rules run in the
//! order of [`RULES`] and never fail on unexpected shapes.

use crate::error::Violation;
use crate::types::Value;

/// A semantic rule: payload and root label in, violations out.
pub type Rule = fn(&Value, &str) -> Vec<Violation>;

/// All rules, in evaluation order.
pub const RULES: &[(&str, Rule)] = &[
    ("bypass-actor-companions", bypass_actor_companions),
    ("required-status-checks-not-empty", required_status_checks_not_empty),
];

/// What a discriminator value demands of its companion field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Companion {
    NonBlank,
    Integer,
}

/// `actor_type` → companion field and its requirement.
const ACTOR_COMPANIONS: &[(&str, &str, Companion)] = &[
    ("RepositoryRole", "repository_role_name", Companion::NonBlank),
    ("Team", "actor_id", Companion::Integer),
    ("Integration", "actor_id", Companion::Integer),
];

/// Run every rule and concatenate the results.
pub fn check_rules(payload: &Value, root: &str) -> Vec<Violation> {
    RULES
        .iter()
        .flat_map(|(name, rule)| {
            let found = rule(payload, root);
            if !found.is_empty() {
                tracing::debug!(rule = name, count = found.len(), "semantic rule reported violations");
            }
            found
        })
        .collect()
}

/// Bypass actors must carry the companion field their `actor_type` needs.
pub fn bypass_actor_companions(payload: &Value, root: &str) -> Vec<Violation> {
    let Some(actors) = payload.get("bypass_actors").and_then(Value::as_sequence) else {
        return Vec::new();
    };

    let mut violations = Vec::new();
    for (idx, actor) in actors.iter().enumerate() {
        let Some(actor_type) = actor.get("actor_type").and_then(Value::as_str) else {
            continue;
        };
        for &(discriminator, field, companion) in ACTOR_COMPANIONS {
            if actor_type != discriminator {
                continue;
            }
            let value = actor.get(field);
            let satisfied = match companion {
                Companion::NonBlank => value.map_or(false, |v| !v.is_blank()),
                Companion::Integer => matches!(value, Some(Value::Integer(_))),
            };
            if !satisfied {
                let requirement = match companion {
                    Companion::NonBlank => "is required",
                    Companion::Integer => "must be an integer",
                };
                violations.push(Violation::new(
                    format!("{}.bypass_actors[{}].{}", root, idx, field),
                    format!("{} when actor_type is {}", requirement, actor_type),
                ));
            }
        }
    }
    violations
}

/// A `required_status_checks` rule must list at least one check.
pub fn required_status_checks_not_empty(payload: &Value, root: &str) -> Vec<Violation> {
    let Some(rules) = payload.get("rules").and_then(Value::as_sequence) else {
        return Vec::new();
    };

    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| {
            rule.get("type").and_then(Value::as_str) == Some("required_status_checks")
        })
        .filter(|(_, rule)| {
            rule.get("parameters")
                .and_then(|params| params.get("required_status_checks"))
                .and_then(Value::as_sequence)
                .map_or(false, <[Value]>::is_empty)
        })
        .map(|(idx, _)| {
            Violation::new(
                format!(
                    "{}.rules[{}].parameters.required_status_checks",
                    root, idx
                ),
                "must contain at least one status check",
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(json: serde_json::Value) -> Value {
        Value::from_json(&json).unwrap()
    }

    #[test]
    fn repository_role_needs_role_name() {
        let value = payload(json!({
            "bypass_actors": [
                { "actor_type": "RepositoryRole", "bypass_mode": "always" },
                { "actor_type": "RepositoryRole", "bypass_mode": "always", "repository_role_name": "" },
                { "actor_type": "RepositoryRole", "bypass_mode": "always", "repository_role_name": "maintain" }
            ]
        }));
        let violations = bypass_actor_companions(&value, "payload");
        assert_eq!(
            violations,
            [
                Violation::new(
                    "payload.bypass_actors[0].repository_role_name",
                    "is required when actor_type is RepositoryRole"
                ),
                Violation::new(
                    "payload.bypass_actors[1].repository_role_name",
                    "is required when actor_type is RepositoryRole"
                ),
            ]
        );
    }

    #[test]
    fn falsy_role_name_counts_as_missing() {
        let value = payload(json!({
            "bypass_actors": [
                { "actor_type": "RepositoryRole", "repository_role_name": false },
                { "actor_type": "RepositoryRole", "repository_role_name": 0 },
                { "actor_type": "RepositoryRole", "repository_role_name": [] }
            ]
        }));
        let paths: Vec<String> = check_rules(&value, "payload")
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(
            paths,
            [
                "payload.bypass_actors[0].repository_role_name",
                "payload.bypass_actors[1].repository_role_name",
                "payload.bypass_actors[2].repository_role_name",
            ]
        );
    }

    #[test]
    fn team_and_integration_need_integer_actor_id() {
        let value = payload(json!({
            "bypass_actors": [
                { "actor_type": "Team", "bypass_mode": "always", "actor_id": "42" },
                { "actor_type": "Integration", "bypass_mode": "pull_request" },
                { "actor_type": "Team", "bypass_mode": "always", "actor_id": 7 }
            ]
        }));
        let violations = bypass_actor_companions(&value, "payload");
        assert_eq!(
            violations,
            [
                Violation::new(
                    "payload.bypass_actors[0].actor_id",
                    "must be an integer when actor_type is Team"
                ),
                Violation::new(
                    "payload.bypass_actors[1].actor_id",
                    "must be an integer when actor_type is Integration"
                ),
            ]
        );
    }

    #[test]
    fn other_actor_types_need_nothing() {
        let value = payload(json!({
            "bypass_actors": [
                { "actor_type": "OrganizationAdmin", "bypass_mode": "always" },
                { "bypass_mode": "always" },
                "not an actor"
            ]
        }));
        assert!(bypass_actor_companions(&value, "payload").is_empty());
    }

    #[test]
    fn empty_status_check_list_is_reported() {
        let value = payload(json!({
            "rules": [
                { "type": "deletion" },
                {
                    "type": "required_status_checks",
                    "parameters": {
                        "required_status_checks": [],
                        "strict_required_status_checks_policy": true
                    }
                }
            ]
        }));
        assert_eq!(
            required_status_checks_not_empty(&value, "payload"),
            [Violation::new(
                "payload.rules[1].parameters.required_status_checks",
                "must contain at least one status check"
            )]
        );
    }

    #[test]
    fn status_check_rule_tolerates_odd_shapes() {
        let value = payload(json!({
            "rules": [
                { "type": "required_status_checks" },
                { "type": "required_status_checks", "parameters": "none" },
                { "type": "required_status_checks", "parameters": { "required_status_checks": "ci" } },
                { "type": "required_status_checks", "parameters": { "required_status_checks": [{ "context": "ci" }] } },
                42
            ]
        }));
        assert!(required_status_checks_not_empty(&value, "payload").is_empty());
    }

    #[test]
    fn non_mapping_payload_yields_nothing() {
        assert!(check_rules(&Value::Sequence(vec![]), "payload").is_empty());
        assert!(check_rules(&Value::Null, "payload").is_empty());
    }

    #[test]
    fn rules_run_in_declared_order() {
        let value = payload(json!({
            "rules": [{ "type": "required_status_checks", "parameters": { "required_status_checks": [] } }],
            "bypass_actors": [{ "actor_type": "Team", "bypass_mode": "always" }]
        }));
        let paths: Vec<String> = check_rules(&value, "ruleset")
            .into_iter()
            .map(|v| v.path)
            .collect();
        assert_eq!(
            paths,
            [
                "ruleset.bypass_actors[0].actor_id",
                "ruleset.rules[0].parameters.required_status_checks"
            ]
        );
    }
}
