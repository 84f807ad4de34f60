//! Schema model: typed nodes built from a JSON schema document.
//!
//! Only the subset the validator evaluates is modelled. A JSON schema object
//! may carry several keywords at once, so a node is an optional kind gate
//! followed by its keywords in evaluation order.

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::error::LoadError;
use crate::resolver::resolve;
use crate::types::{json_type_name, Value};

/// Key holding the named definitions of a document.
pub const DEFS_KEY: &str = "$defs";

/// JSON Schema keywords that are accepted in documents but never evaluated.
pub const IGNORED_KEYWORDS: &[&str] = &[
    "$id",
    "$anchor",
    "$dynamicRef",
    "anyOf",
    "oneOf",
    "not",
    "else",
    "const",
    "format",
    "pattern",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "maxLength",
    "minItems",
    "maxItems",
    "uniqueItems",
    "additionalProperties",
    "patternProperties",
    "dependentRequired",
];

/// Primitive kind a node can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Object,
    Array,
    String,
    Integer,
    Boolean,
}

impl Kind {
    /// Parse a `type` keyword value. Returns `None` for unsupported names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "object" => Some(Kind::Object),
            "array" => Some(Kind::Array),
            "string" => Some(Kind::String),
            "integer" => Some(Kind::Integer),
            "boolean" => Some(Kind::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Boolean => "boolean",
        }
    }

    /// Whether `value` has this kind.
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Kind::Object, Value::Mapping(_))
                | (Kind::Array, Value::Sequence(_))
                | (Kind::String, Value::String(_))
                | (Kind::Integer, Value::Integer(_))
                | (Kind::Boolean, Value::Bool(_))
        )
    }
}

/// A schema node: kind gate plus keywords.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    pub kind: Option<Kind>,
    /// Stored in evaluation order: enum, object, items, minLength, allOf, if/then, $ref.
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    Enum(Vec<Value>),
    Object(ObjectShape),
    Items(Box<SchemaNode>),
    MinLength(usize),
    AllOf(Vec<SchemaNode>),
    Conditional(Conditional),
    Ref(String),
}

/// `required` + `properties`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectShape {
    pub required: Vec<String>,
    pub properties: IndexMap<String, SchemaNode>,
}

/// `if` / `then` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub predicate: Predicate,
    pub then: Box<SchemaNode>,
}

/// Conjunction of field tests against the value's own mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub fields: Vec<FieldTest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldTest {
    pub field: String,
    /// `None` only tests presence.
    pub equals: Option<Value>,
}

impl Predicate {
    /// True when `value` is a mapping and every tested field is present
    /// (and equal to its literal, when one is declared).
    pub fn holds(&self, value: &Value) -> bool {
        let Some(map) = value.as_mapping() else {
            return false;
        };
        self.fields.iter().all(|test| match map.get(&test.field) {
            Some(actual) => test.equals.as_ref().map_or(true, |expected| actual == expected),
            None => false,
        })
    }
}

impl SchemaNode {
    /// Build a single node (without `$defs`) from JSON.
    pub fn from_json(json: &Json) -> Result<Self, LoadError> {
        parse_node(json, "")
    }

    /// Reference tokens reachable without descending into a property or item.
    pub fn transparent_refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_transparent_refs(self, &mut out);
        out
    }
}

fn collect_transparent_refs<'a>(node: &'a SchemaNode, out: &mut Vec<&'a str>) {
    for keyword in &node.keywords {
        match keyword {
            Keyword::AllOf(branches) => {
                for branch in branches {
                    collect_transparent_refs(branch, out);
                }
            }
            Keyword::Conditional(cond) => collect_transparent_refs(&cond.then, out),
            Keyword::Ref(token) => out.push(token),
            Keyword::Enum(_) | Keyword::Object(_) | Keyword::Items(_) | Keyword::MinLength(_) => {}
        }
    }
}

/// A root node plus its named definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDocument {
    pub root: SchemaNode,
    pub defs: IndexMap<String, SchemaNode>,
}

impl SchemaDocument {
    /// Build a document from JSON.
    ///
    /// References that do not resolve are logged but accepted; validation
    /// treats them as imposing no constraint.
    ///
    /// # Errors
    ///
    /// Returns a `LoadError` schema variant if a node is malformed.
    pub fn from_json(json: &Json) -> Result<Self, LoadError> {
        let root = parse_node(json, "")?;

        let defs = match json.get(DEFS_KEY) {
            None => IndexMap::new(),
            Some(Json::Object(entries)) => entries
                .iter()
                .map(|(name, def)| {
                    parse_node(def, &child_pointer(&format!("/{}", DEFS_KEY), name))
                        .map(|node| (name.clone(), node))
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(invalid_keyword(
                    "",
                    DEFS_KEY,
                    format!("expected object, got {}", json_type_name(other)),
                ))
            }
        };

        let document = Self { root, defs };
        for (pointer, token) in document.dangling_refs() {
            tracing::warn!(
                reference = %token,
                at = %pointer,
                "reference does not resolve; its subtree will not be validated"
            );
        }
        Ok(document)
    }

    /// Every `$ref` in the document with the pointer of the node holding it.
    pub fn references(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        collect_refs(&self.root, String::new(), &mut out);
        for (name, def) in &self.defs {
            collect_refs(
                def,
                child_pointer(&format!("/{}", DEFS_KEY), name),
                &mut out,
            );
        }
        out
    }

    /// References whose token does not name a `$defs` entry.
    pub fn dangling_refs(&self) -> Vec<(String, &str)> {
        self.references()
            .into_iter()
            .filter(|(_, token)| resolve(self, token).is_none())
            .collect()
    }
}

fn collect_refs<'a>(node: &'a SchemaNode, pointer: String, out: &mut Vec<(String, &'a str)>) {
    for keyword in &node.keywords {
        match keyword {
            Keyword::Object(shape) => {
                let base = format!("{}/properties", pointer);
                for (name, prop) in &shape.properties {
                    collect_refs(prop, child_pointer(&base, name), out);
                }
            }
            Keyword::Items(items) => collect_refs(items, format!("{}/items", pointer), out),
            Keyword::AllOf(branches) => {
                for (idx, branch) in branches.iter().enumerate() {
                    collect_refs(branch, format!("{}/allOf/{}", pointer, idx), out);
                }
            }
            Keyword::Conditional(cond) => {
                collect_refs(&cond.then, format!("{}/then", pointer), out)
            }
            Keyword::Ref(token) => out.push((display_pointer(&pointer), token)),
            Keyword::Enum(_) | Keyword::MinLength(_) => {}
        }
    }
}

/// Append an escaped segment to a JSON pointer.
pub(crate) fn child_pointer(pointer: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        pointer,
        segment.replace('~', "~0").replace('/', "~1")
    )
}

pub(crate) fn display_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

fn invalid_keyword(pointer: &str, keyword: &str, message: String) -> LoadError {
    LoadError::InvalidKeyword {
        path: display_pointer(pointer),
        keyword: keyword.to_string(),
        message,
    }
}

fn as_schema_object<'a>(json: &'a Json, pointer: &str) -> Result<&'a Map<String, Json>, LoadError> {
    json.as_object().ok_or_else(|| LoadError::NotASchema {
        path: display_pointer(pointer),
        actual: json_type_name(json).to_string(),
    })
}

fn parse_node(json: &Json, pointer: &str) -> Result<SchemaNode, LoadError> {
    let map = as_schema_object(json, pointer)?;

    let kind = match map.get("type") {
        Some(declared) => parse_kind(declared, pointer)?,
        None => None,
    };

    let mut keywords = Vec::new();

    if let Some(literals) = map.get("enum") {
        keywords.push(Keyword::Enum(parse_enum(literals, pointer)?));
    }

    let required = map
        .get("required")
        .map(|r| parse_required(r, pointer))
        .transpose()?;
    let properties = map
        .get("properties")
        .map(|p| parse_properties(p, pointer))
        .transpose()?;
    if required.is_some() || properties.is_some() {
        keywords.push(Keyword::Object(ObjectShape {
            required: required.unwrap_or_default(),
            properties: properties.unwrap_or_default(),
        }));
    }

    if let Some(items) = map.get("items") {
        let node = parse_node(items, &format!("{}/items", pointer))?;
        keywords.push(Keyword::Items(Box::new(node)));
    }

    if let Some(min) = map.get("minLength") {
        let floor = min
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                invalid_keyword(
                    pointer,
                    "minLength",
                    format!("expected non-negative integer, got {}", min),
                )
            })?;
        keywords.push(Keyword::MinLength(floor));
    }

    if let Some(all_of) = map.get("allOf") {
        let Json::Array(branches) = all_of else {
            return Err(invalid_keyword(
                pointer,
                "allOf",
                format!("expected array, got {}", json_type_name(all_of)),
            ));
        };
        let branches = branches
            .iter()
            .enumerate()
            .map(|(idx, branch)| parse_node(branch, &format!("{}/allOf/{}", pointer, idx)))
            .collect::<Result<_, _>>()?;
        keywords.push(Keyword::AllOf(branches));
    }

    match (map.get("if"), map.get("then")) {
        (Some(condition), Some(then)) => {
            let predicate = parse_predicate(condition, &format!("{}/if", pointer))?;
            let then = parse_node(then, &format!("{}/then", pointer))?;
            keywords.push(Keyword::Conditional(Conditional {
                predicate,
                then: Box::new(then),
            }));
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::debug!(at = %display_pointer(pointer), "unpaired if/then is ignored");
        }
        (None, None) => {}
    }

    if let Some(reference) = map.get("$ref") {
        let Json::String(token) = reference else {
            return Err(invalid_keyword(
                pointer,
                "$ref",
                format!("expected string, got {}", json_type_name(reference)),
            ));
        };
        keywords.push(Keyword::Ref(token.clone()));
    }

    for key in map.keys().filter(|k| IGNORED_KEYWORDS.contains(&k.as_str())) {
        tracing::debug!(keyword = %key, at = %display_pointer(pointer), "keyword is not evaluated");
    }

    Ok(SchemaNode { kind, keywords })
}

/// A `type` outside the modeled kinds (`number`, `null`, unions) constrains nothing.
fn parse_kind(declared: &Json, pointer: &str) -> Result<Option<Kind>, LoadError> {
    let unmodeled = match declared {
        Json::String(name) => match Kind::parse(name) {
            Some(kind) => return Ok(Some(kind)),
            None => declared,
        },
        Json::Array(names) if names.iter().all(Json::is_string) => declared,
        other => {
            return Err(invalid_keyword(
                pointer,
                "type",
                format!(
                    "expected string or list of strings, got {}",
                    json_type_name(other)
                ),
            ))
        }
    };
    tracing::debug!(declared = %unmodeled, at = %display_pointer(pointer), "type is not evaluated");
    Ok(None)
}

/// Whether a `type` value names one of the modeled kinds.
pub(crate) fn is_modeled_type(declared: &Json) -> bool {
    declared.as_str().and_then(Kind::parse).is_some()
}

fn parse_enum(json: &Json, pointer: &str) -> Result<Vec<Value>, LoadError> {
    let Json::Array(literals) = json else {
        return Err(invalid_keyword(
            pointer,
            "enum",
            format!("expected array, got {}", json_type_name(json)),
        ));
    };
    literals
        .iter()
        .map(|literal| {
            Value::decode(literal, "enum")
                .map_err(|e| invalid_keyword(pointer, "enum", e.to_string()))
        })
        .collect()
}

fn parse_required(json: &Json, pointer: &str) -> Result<Vec<String>, LoadError> {
    let Json::Array(names) = json else {
        return Err(invalid_keyword(
            pointer,
            "required",
            format!("expected array, got {}", json_type_name(json)),
        ));
    };
    names
        .iter()
        .map(|name| match name {
            Json::String(s) => Ok(s.clone()),
            other => Err(invalid_keyword(
                pointer,
                "required",
                format!("expected field names, got {}", json_type_name(other)),
            )),
        })
        .collect()
}

fn parse_properties(
    json: &Json,
    pointer: &str,
) -> Result<IndexMap<String, SchemaNode>, LoadError> {
    let Json::Object(entries) = json else {
        return Err(invalid_keyword(
            pointer,
            "properties",
            format!("expected object, got {}", json_type_name(json)),
        ));
    };
    let base = format!("{}/properties", pointer);
    entries
        .iter()
        .map(|(name, prop)| {
            parse_node(prop, &child_pointer(&base, name)).map(|node| (name.clone(), node))
        })
        .collect()
}

fn parse_predicate(json: &Json, pointer: &str) -> Result<Predicate, LoadError> {
    let map = as_schema_object(json, pointer)?;
    let Some(properties) = map.get("properties") else {
        return Ok(Predicate::default());
    };
    let Json::Object(entries) = properties else {
        return Err(invalid_keyword(
            pointer,
            "properties",
            format!("expected object, got {}", json_type_name(properties)),
        ));
    };

    let base = format!("{}/properties", pointer);
    let fields = entries
        .iter()
        .map(|(field, test)| -> Result<FieldTest, LoadError> {
            let test_pointer = child_pointer(&base, field);
            let test = as_schema_object(test, &test_pointer)?;
            let equals = test
                .get("const")
                .map(|literal| {
                    Value::decode(literal, "const")
                        .map_err(|e| invalid_keyword(&test_pointer, "const", e.to_string()))
                })
                .transpose()?;
            Ok(FieldTest {
                field: field.clone(),
                equals,
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(Predicate { fields })
}
