use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::Ref;
use crate::media::{Example, Header, Link, Parameter, RequestBody, Response};
use crate::node::{self, Children, Walk};
use crate::path::{Callback, PathItem};
use crate::schema::Schema;
use crate::security::SecurityScheme;

/// Named scopes required by each security scheme.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// A decoded API specification document.
///
/// Dropping a document unbinds every reference cell reachable from it, so
/// resolved cycles do not keep their allocations alive.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub openapi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<IndexMap<String, Ref<PathItem>>>,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Document {
    /// Decode from an untyped tree.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Whether every reference cell in the document is bound.
    pub fn is_resolved(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        let mut stack: Vec<crate::node::Node> = Vec::new();
        for child in self.children() {
            match child.cell.node() {
                Some(node) => {
                    if seen.insert(node.addr()) {
                        stack.push(node);
                    }
                }
                None => return false,
            }
        }
        while let Some(node) = stack.pop() {
            for child in node.children() {
                match child.cell.node() {
                    Some(next) => {
                        if seen.insert(next.addr()) {
                            stack.push(next);
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }

    /// The path item for `template`, once bound.
    pub fn path(&self, template: &str) -> Option<std::sync::Arc<PathItem>> {
        self.paths
            .as_ref()
            .and_then(|paths| paths.get(template))
            .and_then(Ref::get)
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        node::unlink(self);
    }
}

impl Children for Document {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        self.components.walk(walk);
        if let Some(paths) = &self.paths {
            for (template, item) in paths {
                walk.cell(&["paths", template.as_str()], item);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(default)]
    pub version: String,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// A server URL template with `{name}` variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default)]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Server {
    /// Variable names used in the URL template, in order of appearance.
    pub fn template_variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.url.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            names.push(&after[..close]);
            rest = &after[close + 1..];
        }
        names
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Reusable named entities, addressable as `#/components/<section>/<name>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Ref<Schema>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Ref<Response>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Ref<Parameter>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Ref<Example>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, Ref<RequestBody>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Ref<Header>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, Ref<SecurityScheme>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, Ref<Link>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, Ref<Callback>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub path_items: IndexMap<String, Ref<PathItem>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.responses.is_empty()
            && self.parameters.is_empty()
            && self.examples.is_empty()
            && self.request_bodies.is_empty()
            && self.headers.is_empty()
            && self.security_schemes.is_empty()
            && self.links.is_empty()
            && self.callbacks.is_empty()
            && self.path_items.is_empty()
            && self.extensions.is_empty()
    }
}

fn section<'a, T>(walk: &mut Walk<'a>, name: &str, entries: &'a IndexMap<String, Ref<T>>)
where
    &'a Ref<T>: Into<node::Cell<'a>>,
{
    for (key, cell) in entries {
        walk.cell(&["components", name, key.as_str()], cell);
    }
}

impl Children for Components {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        section(walk, "schemas", &self.schemas);
        section(walk, "responses", &self.responses);
        section(walk, "parameters", &self.parameters);
        section(walk, "examples", &self.examples);
        section(walk, "requestBodies", &self.request_bodies);
        section(walk, "headers", &self.headers);
        section(walk, "securitySchemes", &self.security_schemes);
        section(walk, "links", &self.links);
        section(walk, "callbacks", &self.callbacks);
        section(walk, "pathItems", &self.path_items);
    }
}
