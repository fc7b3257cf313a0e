//! Typed model of an API specification document.
//!
//! Every field that may hold a `$ref` is a [`Ref`] cell. After decoding,
//! reference cells are unbound; a resolver binds each one to the shared
//! [`std::sync::Arc`] of its target, so two references to the same target
//! observe one instance and recursive schemas form genuine cycles.
//!
//! [`Reference`] and [`Pointer`] parse `$ref` strings and JSON pointers.
//! [`Kind`] and [`Children`] let callers walk every cell with its location.

pub mod cell;
pub mod document;
pub mod error;
pub mod media;
pub mod node;
pub mod path;
pub mod pointer;
pub mod reference;
pub mod schema;
pub mod security;

pub use cell::Ref;
pub use document::{
    Components, Contact, Document, ExternalDocs, Info, License, SecurityRequirement, Server,
    ServerVariable, Tag,
};
pub use error::{ReferenceError, Result};
pub use media::{Encoding, Example, Header, Link, MediaType, Parameter, RequestBody, Response};
pub use node::{Cell, Child, Children, Component, Kind, Node, Site, Walk};
pub use path::{Callback, Operation, PathItem, METHODS};
pub use pointer::{escape, Pointer};
pub use reference::Reference;
pub use schema::{AdditionalProperties, Discriminator, Schema, SchemaType, Types};
pub use security::{OAuthFlow, OAuthFlows, SecurityScheme};
pub use serde_json::Value;
