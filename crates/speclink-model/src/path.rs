use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::Ref;
use crate::document::{ExternalDocs, SecurityRequirement, Server};
use crate::media::{Parameter, RequestBody, Response};
use crate::node::{Children, Walk};

/// HTTP methods a path item can carry, in document order.
pub const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// The operations available on one path template.
///
/// Under `paths` and inside callbacks a path item may be written as a
/// `$ref`, so those positions hold `Ref<PathItem>` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Ref<Parameter>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl PathItem {
    /// Present operations with their method names.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.options,
            &self.head,
            &self.patch,
            &self.trace,
        ]
        .into_iter()
        .zip(METHODS)
        .filter_map(|(operation, method)| operation.as_ref().map(|op| (method, op)))
    }
}

impl Children for PathItem {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        for (index, parameter) in self.parameters.iter().enumerate() {
            walk.cell(&["parameters", index.to_string().as_str()], parameter);
        }
        for (method, operation) in self.operations() {
            walk.nested(&[method], |walk| operation.walk(walk));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Ref<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Ref<RequestBody>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<IndexMap<String, Ref<Response>>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, Ref<Callback>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Children for Operation {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        for (index, parameter) in self.parameters.iter().enumerate() {
            walk.cell(&["parameters", index.to_string().as_str()], parameter);
        }
        if let Some(body) = &self.request_body {
            walk.cell(&["requestBody"], body);
        }
        for (code, response) in self.responses.iter().flatten() {
            walk.cell(&["responses", code.as_str()], response);
        }
        for (name, callback) in &self.callbacks {
            walk.cell(&["callbacks", name.as_str()], callback);
        }
    }
}

/// Runtime expressions mapped to the path items the API calls back into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Callback(pub IndexMap<String, Ref<PathItem>>);

impl Children for Callback {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        for (expression, item) in &self.0 {
            walk.cell(&[expression.as_str()], item);
        }
    }
}
