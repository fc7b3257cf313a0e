use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::Ref;
use crate::document::Server;
use crate::node::{Children, Walk};
use crate::schema::Schema;

/// A single operation input, identified by `name` and `in`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "in", default)]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Ref<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Ref<Example>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Parameter {
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

/// A response or encoding header: a parameter without `name` and `in`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Ref<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Ref<Example>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

// Parameter and Header share the schema/examples/content layout.
fn walk_described<'a>(
    walk: &mut Walk<'a>,
    schema: &'a Option<Ref<Schema>>,
    examples: &'a IndexMap<String, Ref<Example>>,
    content: &'a IndexMap<String, MediaType>,
) {
    if let Some(schema) = schema {
        walk.cell(&["schema"], schema);
    }
    for (name, example) in examples {
        walk.cell(&["examples", name.as_str()], example);
    }
    walk_content(walk, content);
}

fn walk_content<'a>(walk: &mut Walk<'a>, content: &'a IndexMap<String, MediaType>) {
    for (media_type, media) in content {
        walk.nested(&["content", media_type.as_str()], |walk| media.walk(walk));
    }
}

impl Children for Parameter {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        walk_described(walk, &self.schema, &self.examples, &self.content);
    }
}

impl Children for Header {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        walk_described(walk, &self.schema, &self.examples, &self.content);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Children for RequestBody {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        walk_content(walk, &self.content);
    }
}

/// A schema and examples for one media type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Ref<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Ref<Example>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub encoding: IndexMap<String, Encoding>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Children for MediaType {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        if let Some(schema) = &self.schema {
            walk.cell(&["schema"], schema);
        }
        for (name, example) in &self.examples {
            walk.cell(&["examples", name.as_str()], example);
        }
        for (property, encoding) in &self.encoding {
            walk.nested(&["encoding", property.as_str()], |walk| encoding.walk(walk));
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Ref<Header>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Children for Encoding {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        for (name, header) in &self.headers {
            walk.cell(&["headers", name.as_str()], header);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Ref<Header>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, Ref<Link>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Children for Response {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        for (name, header) in &self.headers {
            walk.cell(&["headers", name.as_str()], header);
        }
        walk_content(walk, &self.content);
        for (name, link) in &self.links {
            walk.cell(&["links", name.as_str()], link);
        }
    }
}

/// A sample value, given inline or by external location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Children for Example {
    fn walk<'a>(&'a self, _walk: &mut Walk<'a>) {}
}

/// A design-time relation from a response to another operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Children for Link {
    fn walk<'a>(&'a self, _walk: &mut Walk<'a>) {}
}
