use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::Ref;
use crate::document::ExternalDocs;
use crate::node::{Children, Walk};

/// A `type` keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

impl SchemaType {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Null => "null",
        }
    }
}

/// The declared type set: a single type or a list of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TypesRepr", into = "TypesRepr")]
pub struct Types(Vec<SchemaType>);

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TypesRepr {
    One(SchemaType),
    Many(Vec<SchemaType>),
}

impl From<TypesRepr> for Types {
    fn from(repr: TypesRepr) -> Self {
        match repr {
            TypesRepr::One(single) => Types(vec![single]),
            TypesRepr::Many(many) => Types(many),
        }
    }
}

impl From<Types> for TypesRepr {
    fn from(types: Types) -> Self {
        match types.0.as_slice() {
            [single] => TypesRepr::One(*single),
            _ => TypesRepr::Many(types.0),
        }
    }
}

impl Types {
    pub fn single(schema_type: SchemaType) -> Self {
        Types(vec![schema_type])
    }

    pub fn as_slice(&self) -> &[SchemaType] {
        &self.0
    }

    pub fn contains(&self, schema_type: SchemaType) -> bool {
        self.0.contains(&schema_type)
    }

    pub fn is(&self, schema_type: SchemaType) -> bool {
        self.0 == [schema_type]
    }
}

impl From<SchemaType> for Types {
    fn from(schema_type: SchemaType) -> Self {
        Types::single(schema_type)
    }
}

/// `additionalProperties`: a boolean switch or a schema for the extra values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Ref<Schema>),
}

/// Names the property that selects a composed branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    #[serde(default)]
    pub property_name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// The recursive constraint entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<Types>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    // Numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,

    // Strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    // Arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Ref<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    // Objects
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    // Composition
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Ref<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Ref<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Ref<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Schema {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(Types::single(schema_type)),
            ..Self::default()
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
    }

    /// Schema-valued `additionalProperties`, if any.
    pub fn additional_schema(&self) -> Option<&Ref<Schema>> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => Some(schema),
            _ => None,
        }
    }
}

impl Children for Schema {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>) {
        if let Some(items) = &self.items {
            walk.cell(&["items"], items);
        }
        for (name, property) in &self.properties {
            walk.cell(&["properties", name.as_str()], property);
        }
        if let Some(additional) = self.additional_schema() {
            walk.cell(&["additionalProperties"], additional);
        }
        for (keyword, list) in [
            ("allOf", &self.all_of),
            ("anyOf", &self.any_of),
            ("oneOf", &self.one_of),
        ] {
            for (index, schema) in list.iter().enumerate() {
                walk.cell(&[keyword, index.to_string().as_str()], schema);
            }
        }
        if let Some(not) = &self.not {
            walk.cell(&["not"], not);
        }
    }
}
