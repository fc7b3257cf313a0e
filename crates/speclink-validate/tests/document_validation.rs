use serde_json::{json, Value};
use speclink_resolve::{Loaded, Loader, ResolverConfig};
use speclink_source::MemoryFetcher;
use speclink_validate::{validate, validate_with, ValidateConfig, ValidationErrors};
use url::Url;

fn api() -> Url {
    Url::parse("https://specs.example.com/api/openapi.json").unwrap()
}

fn load(raw: &Value) -> Loaded {
    load_with(raw, MemoryFetcher::new(), ResolverConfig::default())
}

fn load_with(raw: &Value, fetcher: MemoryFetcher, config: ResolverConfig) -> Loaded {
    let bytes = serde_json::to_vec(raw).unwrap();
    Loader::with_fetcher(config, fetcher)
        .load_bytes(&bytes, &api())
        .unwrap()
}

fn issues(errors: &ValidationErrors) -> Vec<(String, String)> {
    errors
        .iter()
        .map(|issue| (issue.location.clone(), issue.message.clone()))
        .collect()
}

fn users() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {"title": "Users", "version": "1.0.0"},
        "servers": [{"url": "https://api.example.com/v1"}],
        "paths": {
            "/users": {
                "post": {
                    "operationId": "createUser",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/User"},
                                "example": {"name": "a"}
                            }
                        }
                    },
                    "responses": {"201": {"description": "created"}}
                }
            }
        },
        "components": {
            "schemas": {
                "User": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {"name": {"type": "string"}}
                }
            }
        }
    })
}

#[test]
fn valid_document_has_no_issues() {
    let loaded = load(&users());
    validate(&loaded.document).unwrap();
}

#[test]
fn short_password_example_cites_field_and_keyword() {
    let mut raw = users();
    raw["components"]["schemas"]["User"]["properties"]["password"] =
        json!({"type": "string", "minLength": 7});
    raw["paths"]["/users"]["post"]["requestBody"]["content"]["application/json"]["example"] =
        json!({"name": "a", "password": "short"});
    let loaded = load(&raw);

    let errors = validate(&loaded.document).unwrap_err();
    let found = issues(&errors);
    assert_eq!(found.len(), 1, "{errors}");
    let (location, message) = &found[0];
    assert_eq!(
        location,
        "paths./users.post.requestBody.content.application/json.example"
    );
    assert!(message.contains("/password"), "{message}");
    assert!(message.contains("minLength"), "{message}");
}

#[test]
fn missing_required_property_in_example_is_named() {
    let mut raw = users();
    raw["paths"]["/users"]["post"]["requestBody"]["content"]["application/json"]["example"] =
        json!({"nickname": "a"});
    let loaded = load(&raw);

    let errors = validate(&loaded.document).unwrap_err();
    assert!(errors.mentions("missing required property \"name\""), "{errors}");
}

#[test]
fn undeclared_server_variable_is_reported() {
    let mut raw = users();
    raw["servers"] = json!([{
        "url": "http://{x}.{y}.example.com",
        "variables": {"x": {"default": "eu"}}
    }]);
    let loaded = load(&raw);

    let errors = validate(&loaded.document).unwrap_err();
    assert_eq!(
        issues(&errors),
        [(
            "servers.0".to_string(),
            "undeclared variable \"y\" in server URL".to_string()
        )]
    );
}

#[test]
fn server_variable_defaults_and_enums() {
    let mut raw = users();
    raw["servers"] = json!([{
        "url": "https://{region}.example.com",
        "variables": {
            "region": {"default": "ap", "enum": ["eu", "us"]},
            "unused": {"default": ""}
        }
    }]);
    let loaded = load(&raw);

    let errors = validate(&loaded.document).unwrap_err();
    let found = issues(&errors);
    assert!(found.contains(&(
        "servers.0.variables.region".to_string(),
        "default \"ap\" of variable \"region\" is not one of its enum values".to_string()
    )));
    assert!(found
        .iter()
        .any(|(location, message)| location == "servers.0.variables.unused"
            && message.contains("not used")));
    assert!(found
        .iter()
        .any(|(location, message)| location == "servers.0.variables.unused"
            && message.contains("empty default")));
}

fn items(path_level: Value, operation_level: Value) -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {"title": "Items", "version": "1"},
        "paths": {
            "/items/{itemId}": {
                "parameters": path_level,
                "get": {
                    "parameters": operation_level,
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }
    })
}

fn path_param(name: &str) -> Value {
    json!({"name": name, "in": "path", "required": true, "schema": {"type": "string"}})
}

#[test]
fn path_parameter_declared_at_either_level() {
    let loaded = load(&items(json!([path_param("itemId")]), json!([])));
    validate(&loaded.document).unwrap();

    let loaded = load(&items(json!([]), json!([path_param("itemId")])));
    validate(&loaded.document).unwrap();
}

#[test]
fn path_parameter_mismatches() {
    let loaded = load(&items(json!([]), json!([path_param("id")])));
    let errors = validate(&loaded.document).unwrap_err();
    assert_eq!(
        issues(&errors),
        [
            (
                "paths./items/{itemId}.get".to_string(),
                "path parameter \"itemId\" in \"/items/{itemId}\" is not declared".to_string()
            ),
            (
                "paths./items/{itemId}.get.parameters".to_string(),
                "declared path parameter \"id\" does not appear in \"/items/{itemId}\"".to_string()
            ),
        ]
    );

    let config = ValidateConfig {
        path_parameters: false,
        ..ValidateConfig::default()
    };
    validate_with(&loaded.document, &config).unwrap();
}

#[test]
fn path_parameter_through_reference_must_be_required() {
    let mut raw = items(json!([{"$ref": "#/components/parameters/ItemId"}]), json!([]));
    raw["components"] = json!({"parameters": {
        "ItemId": {"name": "itemId", "in": "path", "schema": {"type": "string"}}
    }});
    let loaded = load(&raw);

    let errors = validate(&loaded.document).unwrap_err();
    assert_eq!(
        issues(&errors),
        [(
            "components.parameters.ItemId.required".to_string(),
            "path parameter \"itemId\" must be required".to_string()
        )]
    );
}

#[test]
fn referenced_path_item_is_checked_once_and_per_template() {
    let raw = json!({
        "openapi": "3.1.0",
        "info": {"title": "Items", "version": "1"},
        "paths": {"/items/{itemId}": {"$ref": "#/components/pathItems/Item"}},
        "components": {"pathItems": {"Item": {
            "get": {"parameters": [path_param("id")], "responses": {}}
        }}}
    });
    let loaded = load(&raw);
    let errors = validate(&loaded.document).unwrap_err();
    assert_eq!(
        issues(&errors),
        [
            (
                "paths./items/{itemId}.get".to_string(),
                "path parameter \"itemId\" in \"/items/{itemId}\" is not declared".to_string()
            ),
            (
                "paths./items/{itemId}.get.parameters".to_string(),
                "declared path parameter \"id\" does not appear in \"/items/{itemId}\"".to_string()
            ),
            (
                "components.pathItems.Item.get.responses".to_string(),
                "operation has no responses".to_string()
            ),
        ]
    );
}

#[test]
fn structural_problems_are_all_collected() {
    let raw = json!({
        "openapi": "2.0",
        "info": {"title": "", "version": "1"},
        "paths": {
            "items": {"get": {"operationId": "list", "responses": {}}},
            "/a/{x}": {"get": {"operationId": "list", "parameters": [path_param("x")], "responses": {"200": {}}}},
            "/a/{y}": {"get": {"parameters": [path_param("y")], "responses": {"200": {"description": "ok"}}}}
        },
        "tags": [{"name": "pets"}, {"name": "pets"}],
        "externalDocs": {"url": ""}
    });
    let loaded = load(&raw);
    let errors = validate(&loaded.document).unwrap_err();
    let found = issues(&errors);

    let expect = [
        ("openapi", "unsupported openapi version"),
        ("info.title", "title is empty"),
        ("paths.items", "must begin with"),
        ("paths.items.get.responses", "operation has no responses"),
        ("paths./a/{x}.get.operationId", "already used at paths.items.get"),
        ("paths./a/{x}.get.responses.200.description", "no description"),
        ("paths./a/{y}", "collides with \"/a/{x}\""),
        ("tags.1.name", "duplicate tag"),
        ("externalDocs.url", "url is empty"),
    ];
    for (location, needle) in expect {
        assert!(
            found
                .iter()
                .any(|(at, message)| at == location && message.contains(needle)),
            "missing {location}: {needle} in {errors}"
        );
    }
    assert_eq!(found.len(), expect.len(), "{errors}");
}

#[test]
fn component_entities_are_checked() {
    let raw = json!({
        "openapi": "3.1.0",
        "info": {"title": "c", "version": "1"},
        "paths": {},
        "security": [{"missing": []}],
        "components": {
            "schemas": {
                "Bad Name": {"type": "string"},
                "List": {"type": "array"},
                "Code": {"type": "string", "pattern": "("}
            },
            "examples": {
                "Empty": {"summary": "nothing"},
                "Both": {"value": 1, "externalValue": "https://example.com/one.json"}
            },
            "links": {"Orphan": {"description": "no target"}},
            "securitySchemes": {
                "key": {"type": "apiKey", "in": "body"},
                "basic": {"type": "http"},
                "oauth": {"type": "oauth2", "flows": {"password": {"scopes": {}}}}
            }
        }
    });
    let loaded = load(&raw);
    let errors = validate(&loaded.document).unwrap_err();
    let found = issues(&errors);

    let expect = [
        ("security.0", "\"missing\" is not declared"),
        ("components.schemas.Bad Name", "may only contain"),
        ("components.schemas.List", "array schema has no items"),
        ("components.schemas.Code.pattern", "invalid pattern"),
        ("components.examples.Empty", "neither value nor externalValue"),
        ("components.examples.Both", "both value and externalValue"),
        ("components.links.Orphan", "neither operationId nor operationRef"),
        ("components.securitySchemes.key.name", "needs a name"),
        ("components.securitySchemes.key.in", "invalid location"),
        ("components.securitySchemes.basic.scheme", "needs a scheme"),
        ("components.securitySchemes.oauth.flows.password", "needs tokenUrl"),
    ];
    for (location, needle) in expect {
        assert!(
            found
                .iter()
                .any(|(at, message)| at == location && message.contains(needle)),
            "missing {location}: {needle} in {errors}"
        );
    }
    assert_eq!(found.len(), expect.len(), "{errors}");
}

#[test]
fn missing_info_and_paths() {
    let loaded = load(&json!({"openapi": "3.0.0"}));
    let errors = validate(&loaded.document).unwrap_err();
    assert_eq!(
        issues(&errors),
        [
            ("info".to_string(), "info is required".to_string()),
            ("paths".to_string(), "paths is required".to_string()),
        ]
    );
}

#[test]
fn external_schema_is_checked_at_referencing_location() {
    let shared = Url::parse("https://specs.example.com/api/shared.json").unwrap();
    let fetcher = MemoryFetcher::new().with(
        &shared,
        serde_json::to_vec(&json!({
            "Name": {"type": "string", "maxLength": 3, "example": "too long"}
        }))
        .unwrap(),
    );
    let raw = json!({
        "openapi": "3.0.3",
        "info": {"title": "x", "version": "1"},
        "paths": {},
        "components": {"schemas": {
            "Person": {"properties": {"name": {"$ref": "shared.json#/Name"}}}
        }}
    });
    let loaded = load_with(&raw, fetcher, ResolverConfig::default().external_refs(true));

    let errors = validate(&loaded.document).unwrap_err();
    assert_eq!(errors.len(), 1, "{errors}");
    let issue = errors.iter().next().unwrap();
    assert_eq!(
        issue.location,
        "components.schemas.Person.properties.name.example"
    );
    assert!(issue.message.contains("maxLength"));
}

#[test]
fn recursive_schemas_are_checked_once() {
    let raw = json!({
        "openapi": "3.0.3",
        "info": {"title": "tree", "version": "1"},
        "paths": {},
        "components": {"schemas": {
            "Node": {
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}},
                    "label": {"type": "string", "example": 5}
                }
            }
        }}
    });
    let loaded = load(&raw);
    let errors = validate(&loaded.document).unwrap_err();
    assert_eq!(
        issues(&errors)
            .into_iter()
            .map(|(location, _)| location)
            .collect::<Vec<_>>(),
        ["components.schemas.Node.properties.label.example"]
    );
}
