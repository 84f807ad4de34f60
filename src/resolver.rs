//! Reference resolution within a single schema document.
//!
//! Only local tokens of the form `#/$defs/<name>` are understood. Anything
//! else (remote URLs, other pointers, nested paths) resolves to nothing, and
//! the validator then applies no constraint for that subtree.

use std::borrow::Cow;

use crate::schema::SchemaDocument;
use crate::schema::SchemaNode;

/// Prefix every resolvable token starts with.
pub const DEFS_PREFIX: &str = "#/$defs/";

/// Resolve a reference token to its `$defs` entry.
///
/// Returns `None` for malformed or unknown tokens.
pub fn resolve<'d>(document: &'d SchemaDocument, token: &str) -> Option<&'d SchemaNode> {
    let name = def_name(token)?;
    document.defs.get(name.as_ref())
}

/// Extract the definition name a token points at.
///
/// The single segment after the prefix is unescaped per JSON Pointer
/// (`~1` = `/`, `~0` = `~`).
pub fn def_name(token: &str) -> Option<Cow<'_, str>> {
    let segment = token.strip_prefix(DEFS_PREFIX)?;
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    if segment.contains('~') {
        Some(Cow::Owned(segment.replace("~1", "/").replace("~0", "~")))
    } else {
        Some(Cow::Borrowed(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Kind;
    use serde_json::json;

    fn document() -> SchemaDocument {
        SchemaDocument::from_json(&json!({
            "type": "object",
            "$defs": {
                "rule": { "type": "object" },
                "string_array": { "type": "array" },
                "a/b": { "type": "string" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn resolves_known_definition() {
        let doc = document();
        let node = resolve(&doc, "#/$defs/rule").unwrap();
        assert_eq!(node.kind, Some(Kind::Object));
    }

    #[test]
    fn unknown_definition_is_none() {
        assert!(resolve(&document(), "#/$defs/missing").is_none());
    }

    #[test]
    fn malformed_tokens_are_none() {
        let doc = document();
        assert!(resolve(&doc, "rule").is_none());
        assert!(resolve(&doc, "#/definitions/rule").is_none());
        assert!(resolve(&doc, "#/$defs/").is_none());
        assert!(resolve(&doc, "#/$defs/rule/properties").is_none());
        assert!(resolve(&doc, "https://example.com/schema.json#/$defs/rule").is_none());
        assert!(resolve(&doc, "#").is_none());
    }

    #[test]
    fn escaped_segment_is_unescaped() {
        let doc = document();
        let node = resolve(&doc, "#/$defs/a~1b").unwrap();
        assert_eq!(node.kind, Some(Kind::String));
        assert_eq!(def_name("#/$defs/x~0y").as_deref(), Some("x~y"));
    }
}
