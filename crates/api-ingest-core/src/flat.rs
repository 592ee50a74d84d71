//! Structural parser for flat YAML/JSON API configuration files.
//!
//! The format is picked from the source's extension. A flat config is a
//! mapping with at least a non-blank `name`; `version`, `description` and
//! `endpoints` are optional. Any other top-level keys are carried through
//! untouched in [`ApiConfig::extra`].

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::{IngestError, Result};
use crate::models::{default_method, ApiConfig, Endpoint, Parameter};

/// Provenance tag stored on configs produced here.
pub const FILE_SOURCE: &str = "file";

/// Extensions a folder ingestion picks up.
pub const CONFIG_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

const KNOWN_KEYS: [&str; 4] = ["name", "version", "description", "endpoints"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(IngestError::parse(format!(
                "Unsupported file format: .{}",
                other
            ))),
        }
    }
}

/// Parse raw file content into a canonical config.
pub fn parse_config(content: &str, path: &Path) -> Result<ApiConfig> {
    let document: Value = match ConfigFormat::from_path(path)? {
        ConfigFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| IngestError::parse(format!("Invalid YAML: {}", e)))?,
        ConfigFormat::Json => serde_json::from_str(content)
            .map_err(|e| IngestError::parse(format!("Invalid JSON: {}", e)))?,
    };

    let Value::Object(mut fields) = document else {
        return Err(IngestError::parse(
            "Configuration content must be a mapping/object",
        ));
    };

    let name = match fields.get("name") {
        None | Some(Value::Null) => {
            return Err(IngestError::parse("Missing required fields: name"))
        }
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(_) => return Err(IngestError::parse("API name cannot be empty")),
    };

    let version = match fields.get("version") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            return Err(IngestError::parse(format!(
                "Invalid version value: {}",
                other
            )))
        }
    };

    let description = match fields.get("description") {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };

    let endpoints = match fields.get("endpoints") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| endpoint_from_value(i, item))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(IngestError::parse("'endpoints' must be a list")),
    };

    for key in KNOWN_KEYS {
        fields.remove(key);
    }
    // Canonical slots that must not be shadowed by flattened extras.
    for key in ["source", "collection_id"] {
        fields.remove(key);
    }

    Ok(ApiConfig {
        name,
        version,
        description,
        endpoints,
        source: FILE_SOURCE.to_string(),
        collection_id: None,
        extra: fields,
    })
}

/// Build one endpoint field by field. Scalars of any type are rendered as
/// text; values that cannot be coerced fall back to their defaults.
fn endpoint_from_value(index: usize, value: &Value) -> Result<Endpoint> {
    let Value::Object(fields) = value else {
        return Err(IngestError::parse(format!(
            "Invalid endpoint #{}: expected a mapping",
            index + 1
        )));
    };
    let text = |key: &str| fields.get(key).and_then(scalar_text).unwrap_or_default();

    let method = match text("method").trim() {
        "" => default_method(),
        m => m.to_ascii_uppercase(),
    };
    let path = text("path");
    let path = if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    };

    let headers = match fields.get("headers") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| scalar_text(v).map(|v| (k.clone(), v)))
            .collect(),
        _ => BTreeMap::new(),
    };

    let parameters = match fields.get("parameters") {
        Some(Value::Array(items)) => items.iter().filter_map(parameter_from_value).collect(),
        _ => Vec::new(),
    };

    Ok(Endpoint {
        name: text("name"),
        path,
        method,
        description: text("description"),
        headers,
        parameters,
        request_schema: fields
            .get("request_schema")
            .filter(|v| !v.is_null())
            .cloned(),
    })
}

fn parameter_from_value(value: &Value) -> Option<Parameter> {
    let fields = value.as_object()?;
    let text = |key: &str| fields.get(key).and_then(scalar_text);
    Some(Parameter {
        name: text("name").unwrap_or_default(),
        param_type: text("type")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "string".to_string()),
        description: text("description").unwrap_or_default(),
        required: match fields.get("required") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        },
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn parses_yaml_with_endpoints_and_extras() {
        let yaml = r#"
name: Pet Store
version: 1.2
description: Pets and owners
base_url: https://pets.example.com
endpoints:
  - name: list
    path: pets
    method: get
    parameters:
      - name: limit
        type: integer
        required: false
  - name: create
    path: /pets
    method: POST
    headers:
      Content-Type: application/json
"#;
        let config = parse_config(yaml, &path("pets.yaml")).unwrap();
        assert_eq!(config.name, "Pet Store");
        assert_eq!(config.version.as_deref(), Some("1.2"));
        assert_eq!(config.source, "file");
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].path, "/pets");
        assert_eq!(config.endpoints[0].method, "GET");
        assert_eq!(config.endpoints[0].parameters[0].param_type, "integer");
        assert_eq!(
            config.endpoints[1].headers["Content-Type"],
            "application/json"
        );
        assert_eq!(config.extra["base_url"], "https://pets.example.com");
        assert!(!config.extra.contains_key("name"));
    }

    #[test]
    fn parses_json_without_version() {
        let config = parse_config(r#"{"name": "Orders"}"#, &path("orders.JSON")).unwrap();
        assert_eq!(config.name, "Orders");
        assert!(config.version.is_none());
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn rejects_missing_or_blank_name() {
        let err = parse_config("description: nothing", &path("a.yml")).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: name");

        let err = parse_config("name: '  '", &path("a.yml")).unwrap_err();
        assert_eq!(err.to_string(), "API name cannot be empty");
    }

    #[test]
    fn rejects_non_mapping_documents() {
        let err = parse_config("- a\n- b\n", &path("list.yaml")).unwrap_err();
        assert!(err.to_string().contains("mapping/object"));
        let err = parse_config("[1, 2]", &path("list.json")).unwrap_err();
        assert!(err.to_string().contains("mapping/object"));
    }

    #[test]
    fn reports_syntax_errors_by_format() {
        let err = parse_config("{\"name\": ", &path("a.json")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON"));
        let err = parse_config("name: [unclosed", &path("a.yaml")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid YAML"));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let err = parse_config("name: x", &path("api.toml")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file format: .toml");
    }

    #[test]
    fn non_mapping_endpoint_names_its_position() {
        let err = parse_config(
            "name: x\nendpoints:\n  - path: /ok\n  - just-a-string\n",
            &path("x.yaml"),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid endpoint #2"));
    }

    #[test]
    fn numeric_header_values_are_rendered_as_text() {
        let yaml = "name: Pets\nendpoints:\n  - path: /pets\n    headers:\n      X-Api-Version: 2\n      X-Debug: true\n      X-Ratio: 0.5\n      X-Nested: [1]\n";
        let config = parse_config(yaml, &path("p.yaml")).unwrap();
        let headers = &config.endpoints[0].headers;
        assert_eq!(headers["X-Api-Version"], "2");
        assert_eq!(headers["X-Debug"], "true");
        assert_eq!(headers["X-Ratio"], "0.5");
        assert!(!headers.contains_key("X-Nested"));
    }

    #[test]
    fn non_string_scalars_are_coerced_or_defaulted() {
        let yaml = r#"
name: Pets
endpoints:
  - name: 7
    description: 42
    path: [1]
    method: ~
    parameters:
      - name: id
        type: 3
        required: "true"
      - not-a-mapping
      - name: page
        required: 1
"#;
        let config = parse_config(yaml, &path("p.yaml")).unwrap();
        let ep = &config.endpoints[0];
        assert_eq!(ep.name, "7");
        assert_eq!(ep.description, "42");
        assert_eq!(ep.path, "/");
        assert_eq!(ep.method, "GET");
        assert_eq!(ep.parameters.len(), 2);
        assert_eq!(ep.parameters[0].param_type, "3");
        assert!(ep.parameters[0].required);
        assert_eq!(ep.parameters[1].param_type, "string");
        assert!(!ep.parameters[1].required);
    }

    #[test]
    fn declared_request_schema_is_kept() {
        let json = r#"{"name": "A", "endpoints": [{"path": "/a", "request_schema": {"type": "object"}}]}"#;
        let config = parse_config(json, &path("a.json")).unwrap();
        assert_eq!(
            config.endpoints[0].request_schema,
            Some(serde_json::json!({"type": "object"}))
        );
    }
}
