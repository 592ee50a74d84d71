//! Postman collection transformer.
//!
//! Flattens the nested request tree of a Postman (v2.x) collection export
//! into an ordered list of canonical [`Endpoint`]s.
//!
//! # Algorithm
//!
//! 1. Classify every item into a [`CollectionNode`]: an object with `item`
//!    is a folder, otherwise an object with `request` is a request, anything
//!    else is ignored.
//! 2. Walk depth-first, pre-order. Folders extend the path prefix with
//!    `/<folder name>` and emit nothing themselves.
//! 3. Every request emits exactly one endpoint, in visit order. The request
//!    path is the folder prefix joined to the URL path with a single slash.
//!
//! Malformed requests degrade field by field (missing method → `GET`,
//! undecodable raw body → string schema, ...). Only a top level without an
//! `item` array, or with a non-object `info`, is a parse error.
//!
//! ```rust
//! use api_ingest_core::collection::parse_collection;
//! use serde_json::json;
//!
//! let collection = json!({
//!     "info": { "name": "Users API" },
//!     "item": [{
//!         "name": "Users",
//!         "item": [{ "name": "Get user", "request": { "method": "get", "url": "/1" } }]
//!     }]
//! });
//! let config = parse_collection(&collection).unwrap();
//! assert_eq!(config.endpoints[0].path, "/Users/1");
//! assert_eq!(config.endpoints[0].method, "GET");
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{IngestError, Result};
use crate::models::{ApiConfig, Endpoint, Parameter};
use crate::schema::infer_from_example;

/// Provenance tag stored on configs produced here.
pub const POSTMAN_SOURCE: &str = "postman";

/// One node of the collection tree.
#[derive(Debug, Clone, Copy)]
pub enum CollectionNode<'a> {
    Folder {
        name: &'a str,
        children: &'a [Value],
    },
    Request {
        item: &'a Map<String, Value>,
        request: &'a Value,
    },
    Unknown,
}

impl<'a> CollectionNode<'a> {
    pub fn classify(value: &'a Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::Unknown;
        };

        if let Some(children) = obj.get("item") {
            return Self::Folder {
                name: obj.get("name").and_then(Value::as_str).unwrap_or(""),
                children: children.as_array().map(Vec::as_slice).unwrap_or(&[]),
            };
        }

        match obj.get("request") {
            Some(request) => Self::Request { item: obj, request },
            None => Self::Unknown,
        }
    }
}

/// Transform a whole collection export into a canonical config.
pub fn parse_collection(collection: &Value) -> Result<ApiConfig> {
    let root = collection
        .as_object()
        .ok_or_else(|| invalid("top level must be a JSON object"))?;

    let empty = Map::new();
    let info = match root.get("info") {
        None => &empty,
        Some(Value::Object(info)) => info,
        Some(_) => return Err(invalid("'info' must be an object")),
    };

    let items = root
        .get("item")
        .ok_or_else(|| invalid("missing 'item' array"))?
        .as_array()
        .ok_or_else(|| invalid("'item' must be an array"))?;

    let mut endpoints = Vec::new();
    for item in items {
        collect_endpoints(item, "", &mut endpoints);
    }

    let name = info
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Unnamed API")
        .to_string();

    let version = match info.get("version") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "1.0.0".to_string(),
    };

    tracing::debug!(api = %name, endpoints = endpoints.len(), "parsed postman collection");

    Ok(ApiConfig {
        name,
        version: Some(version),
        description: info.get("description").map(text_of).unwrap_or_default(),
        endpoints,
        source: POSTMAN_SOURCE.to_string(),
        collection_id: info
            .get("_postman_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        extra: Map::new(),
    })
}

fn invalid(reason: &str) -> IngestError {
    IngestError::parse(format!("Invalid collection: {}", reason))
}

/// Depth-first, pre-order walk appending one endpoint per request.
pub fn collect_endpoints(node: &Value, prefix: &str, out: &mut Vec<Endpoint>) {
    match CollectionNode::classify(node) {
        CollectionNode::Folder { name, children } => {
            let nested = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            };
            for child in children {
                collect_endpoints(child, &nested, out);
            }
        }
        CollectionNode::Request { item, request } => out.push(request_endpoint(item, request, prefix)),
        CollectionNode::Unknown => {}
    }
}

fn request_endpoint(item: &Map<String, Value>, request: &Value, prefix: &str) -> Endpoint {
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let method = request
        .get("method")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(|m| m.trim().to_ascii_uppercase())
        .unwrap_or_else(crate::models::default_method);

    let url = request.get("url");
    let raw_path = match url {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(u)) => {
            path_from_url(u.get("raw").and_then(Value::as_str).unwrap_or(""))
        }
        _ => String::new(),
    };

    let description = item
        .get("description")
        .map(text_of)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| name.clone());

    let request_schema = request
        .get("body")
        .filter(|body| body.get("mode").and_then(Value::as_str) == Some("raw"))
        .map(|body| infer_from_example(body.get("raw").and_then(Value::as_str).unwrap_or("")));

    Endpoint {
        path: join_path(prefix, &raw_path),
        method,
        description,
        headers: headers_of(request),
        parameters: url.map(parameters_of).unwrap_or_default(),
        request_schema,
        name,
    }
}

/// Strip scheme, host and query string from a raw URL.
///
/// ```rust
/// use api_ingest_core::collection::path_from_url;
///
/// assert_eq!(path_from_url("https://x.com/a/b?x=1"), "/a/b");
/// assert_eq!(path_from_url("https://x.com"), "/");
/// assert_eq!(path_from_url("{{base}}/pets"), "/pets");
/// ```
pub fn path_from_url(raw: &str) -> String {
    let without_scheme = match raw.split_once("://") {
        Some((_, rest)) => rest,
        None => raw,
    };
    let path = match without_scheme.split_once('/') {
        Some((_, rest)) => format!("/{}", rest),
        None => "/".to_string(),
    };
    match path.split_once('?') {
        Some((before, _)) => before.to_string(),
        None => path,
    }
}

/// Join a folder prefix and a request path with exactly one leading slash
/// and no doubled slash at the seam.
pub fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, _) => format!("/{}", path),
        (false, true) => format!("/{}", prefix),
        (false, false) => format!("/{}/{}", prefix, path),
    }
}

/// Text of a Postman description: either a plain string or `{ "content": ... }`.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        _ => String::new(),
    }
}

fn is_disabled(value: &Value) -> bool {
    value.get("disabled").and_then(Value::as_bool).unwrap_or(false)
}

fn headers_of(request: &Value) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    let declared = request
        .get("header")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for header in declared {
        if is_disabled(header) {
            continue;
        }
        let key = header.get("key").and_then(Value::as_str).unwrap_or("");
        if key.is_empty() {
            continue;
        }
        let value = header.get("value").and_then(Value::as_str).unwrap_or("");
        headers.insert(key.to_string(), value.to_string());
    }
    headers
}

fn parameters_of(url: &Value) -> Vec<Parameter> {
    let Some(variables) = url.get("variable").and_then(Value::as_array) else {
        return Vec::new();
    };

    variables
        .iter()
        .map(|var| Parameter {
            name: var.get("key").and_then(Value::as_str).unwrap_or("").to_string(),
            param_type: "string".to_string(),
            description: var.get("description").map(text_of).unwrap_or_default(),
            required: !is_disabled(var),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(items: Value) -> Value {
        json!({ "info": { "name": "Test API", "_postman_id": "abc-123" }, "item": items })
    }

    #[test]
    fn folder_prefixes_request_path() {
        let config = parse_collection(&collection(json!([
            { "name": "Users", "item": [
                { "name": "Get user", "request": { "method": "GET", "url": "/1" } }
            ]}
        ])))
        .unwrap();
        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.endpoints[0].path, "/Users/1");
        assert_eq!(config.collection_id.as_deref(), Some("abc-123"));
        assert_eq!(config.source, "postman");
    }

    #[test]
    fn nested_folders_accumulate_prefix() {
        let config = parse_collection(&collection(json!([
            { "name": "v1", "item": [
                { "name": "Pets", "item": [
                    { "name": "List", "request": { "url": "pets" } }
                ]}
            ]}
        ])))
        .unwrap();
        assert_eq!(config.endpoints[0].path, "/v1/Pets/pets");
    }

    #[test]
    fn structured_url_strips_host_and_query() {
        let config = parse_collection(&collection(json!([
            { "name": "Search", "request": {
                "method": "post",
                "url": { "raw": "https://x.com/a/b?x=1" }
            }}
        ])))
        .unwrap();
        let ep = &config.endpoints[0];
        assert_eq!(ep.path, "/a/b");
        assert_eq!(ep.method, "POST");
    }

    #[test]
    fn host_only_url_becomes_root() {
        assert_eq!(path_from_url("https://api.example.com"), "/");
        assert_eq!(path_from_url(""), "/");
        assert_eq!(path_from_url("https://x.com/?q=1"), "/");
    }

    #[test]
    fn join_never_doubles_or_drops_slashes() {
        assert_eq!(join_path("", "/a"), "/a");
        assert_eq!(join_path("", "a"), "/a");
        assert_eq!(join_path("Users", "/1"), "/Users/1");
        assert_eq!(join_path("Users", "1"), "/Users/1");
        assert_eq!(join_path("Users", "/"), "/Users");
        assert_eq!(join_path("", ""), "/");
    }

    #[test]
    fn disabled_and_duplicate_headers() {
        let config = parse_collection(&collection(json!([
            { "name": "Create", "request": {
                "method": "POST",
                "url": "/pets",
                "header": [
                    { "key": "Accept", "value": "text/plain" },
                    { "key": "X-Debug", "value": "1", "disabled": true },
                    { "key": "Accept", "value": "application/json" },
                    { "key": "", "value": "ignored" }
                ]
            }}
        ])))
        .unwrap();
        let headers = &config.endpoints[0].headers;
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["Accept"], "application/json");
        assert!(!headers.contains_key("X-Debug"));
    }

    #[test]
    fn url_variables_become_parameters() {
        let config = parse_collection(&collection(json!([
            { "name": "Get pet", "request": {
                "url": {
                    "raw": "{{base}}/pets/:id",
                    "variable": [
                        { "key": "id", "description": "Pet id" },
                        { "key": "expand", "disabled": true }
                    ]
                }
            }}
        ])))
        .unwrap();
        let params = &config.endpoints[0].parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "id");
        assert_eq!(params[0].param_type, "string");
        assert_eq!(params[0].description, "Pet id");
        assert!(params[0].required);
        assert!(!params[1].required);
    }

    #[test]
    fn raw_body_schema_and_fallback() {
        let config = parse_collection(&collection(json!([
            { "name": "Good", "request": { "url": "/a", "body": { "mode": "raw", "raw": "{\"n\": 1}" } } },
            { "name": "Bad", "request": { "url": "/b", "body": { "mode": "raw", "raw": "{oops" } } },
            { "name": "Form", "request": { "url": "/c", "body": { "mode": "formdata" } } }
        ])))
        .unwrap();
        let eps = &config.endpoints;
        assert_eq!(eps[0].request_schema.as_ref().unwrap()["properties"]["n"]["type"], "integer");
        assert_eq!(eps[1].request_schema, Some(json!({ "type": "string" })));
        assert!(eps[2].request_schema.is_none());
    }

    #[test]
    fn description_prefers_content_then_name() {
        let config = parse_collection(&collection(json!([
            { "name": "A", "description": { "content": "From content" }, "request": { "url": "/a" } },
            { "name": "B", "description": "Plain", "request": { "url": "/b" } },
            { "name": "C", "request": { "url": "/c" } }
        ])))
        .unwrap();
        let descs: Vec<&str> = config.endpoints.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descs, vec!["From content", "Plain", "C"]);
    }

    #[test]
    fn endpoints_keep_preorder_visit_order() {
        let config = parse_collection(&collection(json!([
            { "name": "z-first", "request": { "url": "/z" } },
            { "name": "F", "item": [
                { "name": "b", "request": { "url": "/b" } },
                { "name": "G", "item": [ { "name": "a", "request": { "url": "/a" } } ] }
            ]},
            { "name": "stray" },
            { "name": "m-last", "request": { "url": "/m" } }
        ])))
        .unwrap();
        let paths: Vec<&str> = config.endpoints.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/z", "/F/b", "/F/G/a", "/m"]);
    }

    #[test]
    fn malformed_leaf_degrades_instead_of_failing() {
        let config = parse_collection(&collection(json!([
            { "name": "Weird", "request": { "method": 42, "url": 17, "header": "nope" } }
        ])))
        .unwrap();
        let ep = &config.endpoints[0];
        assert_eq!(ep.method, "GET");
        assert_eq!(ep.path, "/");
        assert!(ep.headers.is_empty());
    }

    #[test]
    fn info_defaults_and_numeric_version() {
        let config = parse_collection(&json!({ "item": [] })).unwrap();
        assert_eq!(config.name, "Unnamed API");
        assert_eq!(config.version.as_deref(), Some("1.0.0"));
        assert!(config.endpoints.is_empty());

        let config = parse_collection(&json!({ "info": { "version": 2 }, "item": [] })).unwrap();
        assert_eq!(config.version.as_deref(), Some("2"));
    }

    #[test]
    fn top_level_without_items_is_a_parse_error() {
        for bad in [json!([]), json!({ "info": {} }), json!({ "item": {} }), json!({ "info": "x", "item": [] })] {
            let err = parse_collection(&bad).unwrap_err();
            assert!(matches!(err, IngestError::Parse(_)));
            assert!(err.to_string().starts_with("Invalid collection"));
        }
    }
}
