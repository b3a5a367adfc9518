//! Route table derivation from complete OpenAPI documents.

use specgate_core::{
    CoreError, HttpMethod, OpenApiError, RouteTable, RouteTableError, parse_document,
    validate_document,
};

const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: 1.0.0
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: A paged array of pets
    post:
      operationId: createPets
      responses:
        "201":
          description: Null response
  /pets/{petId}:
    get:
      operationId: showPetById
      responses:
        "200":
          description: Expected response to a valid request
    put:
      operationId: updatePet
      responses:
        "200":
          description: Updated
    delete:
      operationId: deletePet
      responses:
        "204":
          description: Deleted
  /pets/{petId}/photos/{photoId}:
    head:
      responses:
        "200":
          description: Exists
    options:
      responses:
        "204":
          description: Allowed methods
    trace:
      responses:
        "200":
          description: Echo
    patch:
      responses:
        "200":
          description: Patched
"#;

#[test]
fn every_declared_operation_yields_one_route() {
    let doc = parse_document(PETSTORE).unwrap();
    validate_document(&doc).unwrap();
    let table = RouteTable::build(&doc).unwrap();

    assert_eq!(table.len(), 9);
    assert_eq!(
        table.methods_for("/pets"),
        vec![HttpMethod::Get, HttpMethod::Post]
    );
    assert_eq!(
        table.methods_for("/pets/{petId}"),
        vec![HttpMethod::Get, HttpMethod::Put, HttpMethod::Delete]
    );
    assert_eq!(
        table.methods_for("/pets/{petId}/photos/{photoId}"),
        vec![
            HttpMethod::Patch,
            HttpMethod::Options,
            HttpMethod::Head,
            HttpMethod::Trace
        ]
    );
}

#[test]
fn routing_patterns_use_single_segment_captures() {
    let doc = parse_document(PETSTORE).unwrap();
    let table = RouteTable::build(&doc).unwrap();

    let patterns: Vec<_> = table
        .iter()
        .filter(|r| r.method() == HttpMethod::Head)
        .map(|r| r.routing_pattern().to_string())
        .collect();
    assert_eq!(
        patterns,
        vec!["/pets/{petId:[^/]+}/photos/{photoId:[^/]+}".to_string()]
    );
}

#[test]
fn undeclared_methods_have_no_route() {
    let doc = parse_document(PETSTORE).unwrap();
    let table = RouteTable::build(&doc).unwrap();

    assert!(
        table
            .iter()
            .filter(|r| r.raw_path() == "/pets")
            .all(|r| matches!(r.method(), HttpMethod::Get | HttpMethod::Post))
    );
}

#[test]
fn bad_parameter_segment_fails_the_build() {
    let yaml = r#"
openapi: 3.0.0
info: {title: t, version: "1"}
paths:
  /things/{}:
    get:
      responses:
        "200": {description: ok}
"#;
    let doc = parse_document(yaml).unwrap();
    let err = RouteTable::build(&doc).unwrap_err();
    assert!(matches!(err, RouteTableError::InvalidParameter { .. }));
}

#[test]
fn document_without_paths_builds_empty_table() {
    let yaml = "openapi: 3.0.0\ninfo: {title: t, version: '1'}\npaths: {}\n";
    let doc = parse_document(yaml).unwrap();
    assert!(RouteTable::build(&doc).unwrap().is_empty());
}

#[test]
fn route_table_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("petstore.yaml");
    std::fs::write(&path, PETSTORE).unwrap();

    let table = RouteTable::from_file(&path).unwrap();
    assert_eq!(table.len(), 9);
}

#[test]
fn route_table_from_file_reports_each_failure_stage() {
    let dir = tempfile::tempdir().unwrap();

    let err = RouteTable::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, CoreError::OpenApi(OpenApiError::Io { .. })), "{err}");

    let bad = dir.path().join("bad.yaml");
    std::fs::write(
        &bad,
        "openapi: 3.0.0\ninfo: {title: t, version: '1'}\npaths:\n  /things/{}:\n    get:\n      responses:\n        '200': {description: ok}\n",
    )
    .unwrap();
    let err = RouteTable::from_file(&bad).unwrap_err();
    assert!(
        matches!(err, CoreError::RouteTable(RouteTableError::InvalidParameter { .. })),
        "{err}"
    );
}
