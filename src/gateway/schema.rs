//! Call signature synthesis.
//!
//! Each agent-declared tool schema is turned into the public call shape:
//! the injected `node` parameter first, then the declared parameters in
//! their original order with required flags and defaults preserved. The
//! transform is pure; the incoming descriptor is never modified.

use std::collections::HashSet;

use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};

/// Name of the injected routing parameter.
pub const NODE_PARAM: &str = "node";

/// Description attached to the injected routing parameter.
pub const NODE_PARAM_DESCRIPTION: &str = "The name of the Kubernetes node to target.";

/// Value shape of a public parameter, from the declared JSON Schema tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Integer,
    Float,
    Bool,
    List,
    Map,
    /// Unrecognized tag. Coerced rather than rejected so an exotic agent
    /// schema never blocks registration; renders with no type constraint.
    Any,
}

impl ParamKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "string" => Self::Text,
            "integer" => Self::Integer,
            "number" => Self::Float,
            "boolean" => Self::Bool,
            "array" => Self::List,
            "object" => Self::Map,
            _ => Self::Any,
        }
    }

    fn type_tag(self) -> Option<&'static str> {
        match self {
            Self::Text => Some("string"),
            Self::Integer => Some("integer"),
            Self::Float => Some("number"),
            Self::Bool => Some("boolean"),
            Self::List => Some("array"),
            Self::Map => Some("object"),
            Self::Any => None,
        }
    }
}

/// One public parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: Option<String>,
    pub required: bool,
    /// Declared default for an optional parameter. Documentation only: the
    /// gateway never fills it in, the agent applies its own default when
    /// the argument is omitted.
    pub default: Option<Value>,
}

/// Ordered public call shape of one registered tool: `node` first, then
/// the agent's declared parameters. Built once at registration, read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct CallSignature {
    params: Vec<ParamSpec>,
}

impl CallSignature {
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Render the public JSON Schema for this signature.
    pub fn to_input_schema(&self) -> JsonObject {
        let mut properties = JsonObject::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut property = JsonObject::new();
            if let Some(tag) = param.kind.type_tag() {
                property.insert("type".to_string(), json!(tag));
            }
            if let Some(description) = &param.description {
                property.insert("description".to_string(), json!(description));
            }
            if let Some(default) = &param.default {
                property.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(property));
            if param.required {
                required.push(json!(param.name));
            }
        }

        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), Value::Array(required));
        schema
    }
}

/// Build the public call signature for an agent-declared tool.
pub fn synthesize(descriptor: &Tool) -> CallSignature {
    let schema = descriptor.input_schema.as_ref();
    let empty = JsonObject::new();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let required: HashSet<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut params = Vec::with_capacity(properties.len() + 1);
    params.push(ParamSpec {
        name: NODE_PARAM.to_string(),
        kind: ParamKind::Text,
        description: Some(NODE_PARAM_DESCRIPTION.to_string()),
        required: true,
        default: None,
    });

    for (name, property) in properties {
        let property = property.as_object();
        // A property with no tag is a string; a tag that is not a known
        // string is the Any fallback.
        let kind = match property.and_then(|p| p.get("type")) {
            None => ParamKind::Text,
            Some(Value::String(tag)) => ParamKind::from_tag(tag),
            Some(_) => ParamKind::Any,
        };
        let description = property
            .and_then(|p| p.get("description"))
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_owned);
        let is_required = required.contains(name.as_str());
        let default = if is_required {
            None
        } else {
            property.and_then(|p| p.get("default")).cloned()
        };

        params.push(ParamSpec {
            name: name.clone(),
            kind,
            description,
            required: is_required,
            default,
        });
    }

    CallSignature { params }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn descriptor(input_schema: Value) -> Tool {
        let Value::Object(schema) = input_schema else {
            panic!("input schema must be an object");
        };
        Tool {
            name: "probe".into(),
            title: None,
            description: Some("test descriptor".into()),
            input_schema: Arc::new(schema),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }

    #[test]
    fn test_node_is_first_and_required() {
        let signature = synthesize(&descriptor(json!({
            "type": "object",
            "properties": {}
        })));

        assert_eq!(signature.params().len(), 1);
        let node = &signature.params()[0];
        assert_eq!(node.name, NODE_PARAM);
        assert_eq!(node.kind, ParamKind::Text);
        assert!(node.required);
        assert!(node.default.is_none());
        assert_eq!(node.description.as_deref(), Some(NODE_PARAM_DESCRIPTION));
    }

    #[test]
    fn test_declared_params_follow_in_original_order() {
        let signature = synthesize(&descriptor(json!({
            "type": "object",
            "properties": {
                "zeta": {"type": "string"},
                "alpha": {"type": "integer"},
                "mid": {"type": "boolean"}
            },
            "required": ["zeta"]
        })));

        let names: Vec<&str> = signature.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["node", "zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_required_param_without_default() {
        let signature = synthesize(&descriptor(json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "File path to read"}
            },
            "required": ["path"]
        })));

        let path = &signature.params()[1];
        assert_eq!(path.kind, ParamKind::Text);
        assert!(path.required);
        assert!(path.default.is_none());
        assert_eq!(path.description.as_deref(), Some("File path to read"));
    }

    #[test]
    fn test_optional_param_keeps_declared_default() {
        let signature = synthesize(&descriptor(json!({
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "default": 10}
            }
        })));

        let limit = &signature.params()[1];
        assert_eq!(limit.kind, ParamKind::Integer);
        assert!(!limit.required);
        assert_eq!(limit.default, Some(json!(10)));
    }

    #[test]
    fn test_unrecognized_tag_coerces_to_any() {
        let signature = synthesize(&descriptor(json!({
            "type": "object",
            "properties": {
                "blob": {"type": "binary"},
                "multi": {"type": ["string", "null"]}
            }
        })));

        assert_eq!(signature.params()[1].kind, ParamKind::Any);
        assert_eq!(signature.params()[2].kind, ParamKind::Any);

        // Any renders with no type constraint.
        let schema = signature.to_input_schema();
        let blob = &schema["properties"]["blob"];
        assert!(blob.get("type").is_none());
    }

    #[test]
    fn test_missing_tag_defaults_to_string() {
        let signature = synthesize(&descriptor(json!({
            "type": "object",
            "properties": {
                "raw": {"description": "untyped"}
            }
        })));

        assert_eq!(signature.params()[1].kind, ParamKind::Text);
    }

    #[test]
    fn test_rendered_schema_round_trip() {
        let signature = synthesize(&descriptor(json!({
            "type": "object",
            "properties": {
                "path": {"type": "string"},
                "limit": {"type": "integer", "default": 10}
            },
            "required": ["path"]
        })));

        let schema = signature.to_input_schema();
        assert_eq!(schema["type"], json!("object"));
        assert_eq!(schema["required"], json!(["node", "path"]));

        let properties = schema["properties"].as_object().expect("object");
        let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["node", "path", "limit"]);
        assert_eq!(properties["node"]["type"], json!("string"));
        assert_eq!(properties["limit"]["default"], json!(10));
    }

    #[test]
    fn test_schema_without_properties_or_required() {
        let signature = synthesize(&descriptor(json!({"type": "object"})));
        assert_eq!(signature.params().len(), 1);
        assert_eq!(signature.params()[0].name, NODE_PARAM);
    }
}
