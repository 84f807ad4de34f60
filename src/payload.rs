//! Turning a fetched ruleset into a create/update payload.

use serde_json::{Map, Value};

/// Target used when the source ruleset does not name one.
pub const DEFAULT_TARGET: &str = "branch";

/// Enforcement used when the source ruleset does not name one.
pub const DEFAULT_ENFORCEMENT: &str = "active";

/// Build a payload from a ruleset as returned by the management API.
///
/// Keeps the writable fields and drops server-managed ones (`id`,
/// timestamps, `_links`, ...). `conditions` and `bypass_actors` are carried
/// only when the source has them; a null value becomes an empty one.
pub fn prepare_payload(existing: &Value) -> Value {
    let field = |key: &str| existing.get(key).cloned();

    let mut payload = Map::new();
    payload.insert("name".to_string(), field("name").unwrap_or(Value::Null));
    payload.insert(
        "target".to_string(),
        field("target").unwrap_or_else(|| Value::from(DEFAULT_TARGET)),
    );
    payload.insert(
        "enforcement".to_string(),
        field("enforcement").unwrap_or_else(|| Value::from(DEFAULT_ENFORCEMENT)),
    );
    payload.insert(
        "rules".to_string(),
        field("rules").unwrap_or_else(|| Value::Array(Vec::new())),
    );

    if let Some(conditions) = field("conditions") {
        let conditions = match conditions {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        payload.insert("conditions".to_string(), conditions);
    }
    if let Some(actors) = field("bypass_actors") {
        let actors = match actors {
            Value::Null => Value::Array(Vec::new()),
            other => other,
        };
        payload.insert("bypass_actors".to_string(), actors);
    }

    Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_server_managed_fields() {
        let existing = json!({
            "id": 42,
            "name": "protect main",
            "target": "branch",
            "source_type": "Repository",
            "source": "octo/repo",
            "enforcement": "evaluate",
            "rules": [{ "type": "deletion" }],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "_links": { "self": { "href": "https://example.com" } }
        });

        assert_eq!(
            prepare_payload(&existing),
            json!({
                "name": "protect main",
                "target": "branch",
                "enforcement": "evaluate",
                "rules": [{ "type": "deletion" }]
            })
        );
    }

    #[test]
    fn fills_defaults() {
        let payload = prepare_payload(&json!({ "name": "tags" }));
        assert_eq!(payload["target"], "branch");
        assert_eq!(payload["enforcement"], "active");
        assert_eq!(payload["rules"], json!([]));
        assert!(payload.get("conditions").is_none());
        assert!(payload.get("bypass_actors").is_none());
    }

    #[test]
    fn null_collections_become_empty() {
        let payload = prepare_payload(&json!({
            "name": "x",
            "conditions": null,
            "bypass_actors": null
        }));
        assert_eq!(payload["conditions"], json!({}));
        assert_eq!(payload["bypass_actors"], json!([]));
    }

    #[test]
    fn keeps_present_conditions_and_actors() {
        let conditions = json!({ "ref_name": { "include": ["~DEFAULT_BRANCH"], "exclude": [] } });
        let actors = json!([{ "actor_id": 5, "actor_type": "Integration", "bypass_mode": "always" }]);
        let payload = prepare_payload(&json!({
            "name": "x",
            "conditions": conditions,
            "bypass_actors": actors
        }));
        assert_eq!(payload["conditions"], conditions);
        assert_eq!(payload["bypass_actors"], actors);
    }

    #[test]
    fn missing_name_is_null() {
        let payload = prepare_payload(&json!({}));
        assert_eq!(payload["name"], Value::Null);
    }
}
