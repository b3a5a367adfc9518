//! OpenAPI document loading and operation discovery.
//!
//! The gateway only needs one thing from the document: which HTTP methods are
//! declared on which path templates. [`declared_operations`] flattens the
//! parsed document into exactly that mapping, which the route table is then
//! built from.

use std::collections::BTreeMap;
use std::path::Path;

use openapiv3::{OpenAPI, PathItem, ReferenceOr};
use tracing::info;

use crate::error::{OpenApiError, RouteTableError};
use crate::routes::HttpMethod;

/// Parse an OpenAPI document from JSON or YAML text.
///
/// Text whose first non-whitespace character is `{` is parsed as JSON,
/// everything else as YAML.
pub fn parse_document(text: &str) -> Result<OpenAPI, OpenApiError> {
    let doc: OpenAPI = if text.trim_start().starts_with('{') {
        serde_json::from_str(text).map_err(|e| OpenApiError::Parse(e.to_string()))?
    } else {
        serde_yaml::from_str(text).map_err(|e| OpenApiError::Parse(e.to_string()))?
    };
    Ok(doc)
}

/// Reject documents the route table cannot be derived from.
pub fn validate_document(doc: &OpenAPI) -> Result<(), OpenApiError> {
    if !doc.openapi.starts_with("3.") {
        return Err(OpenApiError::Invalid(format!(
            "unsupported OpenAPI version '{}', expected 3.x",
            doc.openapi
        )));
    }
    if let Some(path) = doc.paths.paths.keys().find(|p| !p.starts_with('/')) {
        return Err(OpenApiError::Invalid(format!(
            "path '{path}' must start with '/'"
        )));
    }
    Ok(())
}

/// Read, parse and validate a document from disk.
pub fn load_document(path: impl AsRef<Path>) -> Result<OpenAPI, OpenApiError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| OpenApiError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = parse_document(&text)?;
    validate_document(&doc)?;

    info!(
        path = %path.display(),
        paths = doc.paths.paths.len(),
        "OpenAPI spec loaded successfully from file"
    );
    Ok(doc)
}

/// Map every path template to the methods it declares an operation for.
///
/// Methods without an operation on a path are absent from its list; a path
/// item with no operations maps to an empty list.
pub fn declared_operations(
    doc: &OpenAPI,
) -> Result<BTreeMap<String, Vec<HttpMethod>>, RouteTableError> {
    let mut operations = BTreeMap::new();
    for (path, item) in &doc.paths.paths {
        let item = match item {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { reference } => {
                return Err(RouteTableError::PathReference {
                    path: path.clone(),
                    reference: reference.clone(),
                });
            }
        };
        operations.insert(path.clone(), declared_methods(item));
    }
    Ok(operations)
}

fn declared_methods(item: &PathItem) -> Vec<HttpMethod> {
    [
        (HttpMethod::Get, item.get.is_some()),
        (HttpMethod::Post, item.post.is_some()),
        (HttpMethod::Put, item.put.is_some()),
        (HttpMethod::Patch, item.patch.is_some()),
        (HttpMethod::Delete, item.delete.is_some()),
        (HttpMethod::Options, item.options.is_some()),
        (HttpMethod::Head, item.head.is_some()),
        (HttpMethod::Trace, item.trace.is_some()),
    ]
    .into_iter()
    .filter_map(|(method, declared)| declared.then_some(method))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS_YAML: &str = r#"
openapi: 3.0.3
info:
  title: Orders
  version: "1.0"
paths:
  /orders:
    get:
      responses:
        "200":
          description: list
    post:
      responses:
        "201":
          description: created
  /orders/{id}:
    get:
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: string
      responses:
        "200":
          description: one
  /health: {}
"#;

    #[test]
    fn test_parse_yaml_document() {
        let doc = parse_document(ORDERS_YAML).unwrap();
        assert_eq!(doc.openapi, "3.0.3");
        assert_eq!(doc.paths.paths.len(), 3);
    }

    #[test]
    fn test_parse_json_document() {
        let json = r#"{
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {"/ping": {"head": {"responses": {"204": {"description": "ok"}}}}}
        }"#;
        let doc = parse_document(json).unwrap();
        let ops = declared_operations(&doc).unwrap();
        assert_eq!(ops["/ping"], vec![HttpMethod::Head]);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(
            parse_document("{not json"),
            Err(OpenApiError::Parse(_))
        ));
        assert!(matches!(
            parse_document("- just\n- a list\n"),
            Err(OpenApiError::Parse(_))
        ));
    }

    #[test]
    fn test_declared_operations_skips_undeclared_methods() {
        let doc = parse_document(ORDERS_YAML).unwrap();
        let ops = declared_operations(&doc).unwrap();

        assert_eq!(ops["/orders"], vec![HttpMethod::Get, HttpMethod::Post]);
        assert_eq!(ops["/orders/{id}"], vec![HttpMethod::Get]);
        assert!(ops["/health"].is_empty());
    }

    #[test]
    fn test_validate_rejects_swagger_two() {
        let mut doc = parse_document(ORDERS_YAML).unwrap();
        doc.openapi = "2.0".to_string();
        assert!(matches!(
            validate_document(&doc),
            Err(OpenApiError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_rejects_relative_path() {
        let mut doc = parse_document(ORDERS_YAML).unwrap();
        doc.paths
            .paths
            .insert("health".to_string(), ReferenceOr::Item(PathItem::default()));
        let err = validate_document(&doc).unwrap_err();
        assert!(err.to_string().contains("health"));
    }

    #[test]
    fn test_path_reference_is_an_error() {
        let yaml = r##"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /shared:
    $ref: "other.yaml#/paths/~1shared"
"##;
        let doc = parse_document(yaml).unwrap();
        let err = declared_operations(&doc).unwrap_err();
        assert!(matches!(err, RouteTableError::PathReference { .. }));
    }

    #[test]
    fn test_load_document_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.yaml");
        std::fs::write(&path, ORDERS_YAML).unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.info.title, "Orders");

        let missing = load_document(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(OpenApiError::Io { .. })));
    }
}
