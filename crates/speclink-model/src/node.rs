use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cell::Ref;
use crate::media::{Example, Header, Link, Parameter, RequestBody, Response};
use crate::path::{Callback, PathItem, METHODS};
use crate::schema::Schema;
use crate::security::SecurityScheme;

/// The entity kinds a `$ref` may stand in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Schema,
    Parameter,
    Header,
    RequestBody,
    Response,
    Example,
    Link,
    SecurityScheme,
    Callback,
    PathItem,
}

impl Kind {
    pub const ALL: [Kind; 10] = [
        Kind::Schema,
        Kind::Parameter,
        Kind::Header,
        Kind::RequestBody,
        Kind::Response,
        Kind::Example,
        Kind::Link,
        Kind::SecurityScheme,
        Kind::Callback,
        Kind::PathItem,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Kind::Schema => "schema",
            Kind::Parameter => "parameter",
            Kind::Header => "header",
            Kind::RequestBody => "request body",
            Kind::Response => "response",
            Kind::Example => "example",
            Kind::Link => "link",
            Kind::SecurityScheme => "security scheme",
            Kind::Callback => "callback",
            Kind::PathItem => "path item",
        }
    }

    /// The `components` section holding entities of this kind.
    pub fn section(self) -> &'static str {
        match self {
            Kind::Schema => "schemas",
            Kind::Parameter => "parameters",
            Kind::Header => "headers",
            Kind::RequestBody => "requestBodies",
            Kind::Response => "responses",
            Kind::Example => "examples",
            Kind::Link => "links",
            Kind::SecurityScheme => "securitySchemes",
            Kind::Callback => "callbacks",
            Kind::PathItem => "pathItems",
        }
    }

    pub fn from_section(section: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|kind| kind.section() == section)
    }

    /// The kind that lives at `tokens` inside a specification document, when
    /// the location is one the document format assigns a kind to.
    pub fn at_pointer<S: AsRef<str>>(tokens: &[S]) -> Option<Kind> {
        match Site::of(tokens) {
            Site::Entity(kind) => Some(kind),
            _ => None,
        }
    }
}

/// What a JSON pointer addresses inside a specification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// An entity a `$ref` may stand in for.
    Entity(Kind),
    /// A location the document format defines that is not an entity, such
    /// as `/info`, an operation or a `properties` map.
    Structure(&'static str),
    /// A location the format says nothing about: extensions, example
    /// payloads, or anything inside a fragment file.
    Free,
}

impl Site {
    pub fn of<S: AsRef<str>>(tokens: &[S]) -> Site {
        let mut at = Place::Root;
        for token in tokens {
            at = at.step(token.as_ref());
            if at == Place::Unknown {
                return Site::Free;
            }
        }
        at.site()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Place {
    Root,
    Field(&'static str),
    Components,
    Section(Kind),
    Paths,
    Operation,
    Parameters,
    Responses,
    Callbacks,
    SchemaMap,
    SchemaList,
    Media,
    MediaMap,
    Encoding,
    EncodingMap,
    Map(Kind),
    Value(Kind),
    Unknown,
}

impl Place {
    fn site(self) -> Site {
        match self {
            Place::Value(kind) => Site::Entity(kind),
            Place::Unknown => Site::Free,
            Place::Root => Site::Structure("document root"),
            Place::Field(name) => Site::Structure(name),
            Place::Components => Site::Structure("components object"),
            Place::Section(_) => Site::Structure("components section"),
            Place::Paths => Site::Structure("paths object"),
            Place::Operation => Site::Structure("operation"),
            Place::Parameters => Site::Structure("parameter list"),
            Place::Responses => Site::Structure("responses object"),
            Place::Callbacks => Site::Structure("callbacks map"),
            Place::SchemaMap => Site::Structure("properties map"),
            Place::SchemaList => Site::Structure("schema list"),
            Place::Media => Site::Structure("media type"),
            Place::MediaMap => Site::Structure("content map"),
            Place::Encoding => Site::Structure("encoding"),
            Place::EncodingMap => Site::Structure("encoding map"),
            Place::Map(_) => Site::Structure("named map"),
        }
    }

    fn step(self, token: &str) -> Place {
        match self {
            Place::Root => match token {
                "components" => Place::Components,
                "paths" => Place::Paths,
                "openapi" => Place::Field("openapi"),
                "info" => Place::Field("info"),
                "servers" => Place::Field("servers"),
                "security" => Place::Field("security"),
                "tags" => Place::Field("tags"),
                "externalDocs" => Place::Field("externalDocs"),
                _ => Place::Unknown,
            },
            Place::Field(_) => Place::Unknown,
            Place::Components => Kind::from_section(token).map_or(Place::Unknown, Place::Section),
            Place::Section(kind) | Place::Map(kind) => Place::Value(kind),
            Place::Paths => Place::Value(Kind::PathItem),
            Place::Operation => match token {
                "parameters" => Place::Parameters,
                "requestBody" => Place::Value(Kind::RequestBody),
                "responses" => Place::Responses,
                "callbacks" => Place::Callbacks,
                _ => Place::Unknown,
            },
            Place::Parameters => Place::Value(Kind::Parameter),
            Place::Responses => Place::Value(Kind::Response),
            Place::Callbacks => Place::Value(Kind::Callback),
            Place::SchemaMap | Place::SchemaList => Place::Value(Kind::Schema),
            Place::MediaMap => Place::Media,
            Place::Media => match token {
                "schema" => Place::Value(Kind::Schema),
                "examples" => Place::Map(Kind::Example),
                "encoding" => Place::EncodingMap,
                _ => Place::Unknown,
            },
            Place::EncodingMap => Place::Encoding,
            Place::Encoding => match token {
                "headers" => Place::Map(Kind::Header),
                _ => Place::Unknown,
            },
            Place::Value(kind) => match (kind, token) {
                (Kind::Schema, "items" | "not" | "additionalProperties") => {
                    Place::Value(Kind::Schema)
                }
                (Kind::Schema, "properties") => Place::SchemaMap,
                (Kind::Schema, "allOf" | "anyOf" | "oneOf") => Place::SchemaList,
                (Kind::Parameter | Kind::Header, "schema") => Place::Value(Kind::Schema),
                (Kind::Parameter | Kind::Header, "examples") => Place::Map(Kind::Example),
                (Kind::Parameter | Kind::Header | Kind::RequestBody | Kind::Response, "content") => {
                    Place::MediaMap
                }
                (Kind::Response, "headers") => Place::Map(Kind::Header),
                (Kind::Response, "links") => Place::Map(Kind::Link),
                (Kind::PathItem, "parameters") => Place::Parameters,
                (Kind::PathItem, method) if METHODS.contains(&method) => Place::Operation,
                (Kind::Callback, _) => Place::Value(Kind::PathItem),
                _ => Place::Unknown,
            },
            Place::Unknown => Place::Unknown,
        }
    }
}

/// A kind-tagged shared handle to a resolved entity.
#[derive(Debug, Clone)]
pub enum Node {
    Schema(Arc<Schema>),
    Parameter(Arc<Parameter>),
    Header(Arc<Header>),
    RequestBody(Arc<RequestBody>),
    Response(Arc<Response>),
    Example(Arc<Example>),
    Link(Arc<Link>),
    SecurityScheme(Arc<SecurityScheme>),
    Callback(Arc<Callback>),
    PathItem(Arc<PathItem>),
}

impl Node {
    pub fn kind(&self) -> Kind {
        match self {
            Node::Schema(_) => Kind::Schema,
            Node::Parameter(_) => Kind::Parameter,
            Node::Header(_) => Kind::Header,
            Node::RequestBody(_) => Kind::RequestBody,
            Node::Response(_) => Kind::Response,
            Node::Example(_) => Kind::Example,
            Node::Link(_) => Kind::Link,
            Node::SecurityScheme(_) => Kind::SecurityScheme,
            Node::Callback(_) => Kind::Callback,
            Node::PathItem(_) => Kind::PathItem,
        }
    }

    /// Identity of the underlying allocation.
    pub fn addr(&self) -> usize {
        match self {
            Node::Schema(v) => Arc::as_ptr(v) as *const () as usize,
            Node::Parameter(v) => Arc::as_ptr(v) as *const () as usize,
            Node::Header(v) => Arc::as_ptr(v) as *const () as usize,
            Node::RequestBody(v) => Arc::as_ptr(v) as *const () as usize,
            Node::Response(v) => Arc::as_ptr(v) as *const () as usize,
            Node::Example(v) => Arc::as_ptr(v) as *const () as usize,
            Node::Link(v) => Arc::as_ptr(v) as *const () as usize,
            Node::SecurityScheme(v) => Arc::as_ptr(v) as *const () as usize,
            Node::Callback(v) => Arc::as_ptr(v) as *const () as usize,
            Node::PathItem(v) => Arc::as_ptr(v) as *const () as usize,
        }
    }

    pub fn children(&self) -> Vec<Child<'_>> {
        match self {
            Node::Schema(v) => v.children(),
            Node::Parameter(v) => v.children(),
            Node::Header(v) => v.children(),
            Node::RequestBody(v) => v.children(),
            Node::Response(v) => v.children(),
            Node::Example(v) => v.children(),
            Node::Link(v) => v.children(),
            Node::SecurityScheme(v) => v.children(),
            Node::Callback(v) => v.children(),
            Node::PathItem(v) => v.children(),
        }
    }
}

/// An entity that can sit behind a Ref cell.
pub trait Component:
    Children + DeserializeOwned + Serialize + PartialEq + Send + Sync + 'static
{
    const KIND: Kind;

    fn into_node(value: Arc<Self>) -> Node;

    fn from_node(node: &Node) -> Option<Arc<Self>>;
}

macro_rules! component {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Component for $ty {
                const KIND: Kind = Kind::$ty;

                fn into_node(value: Arc<Self>) -> Node {
                    Node::$ty(value)
                }

                fn from_node(node: &Node) -> Option<Arc<Self>> {
                    match node {
                        Node::$ty(value) => Some(Arc::clone(value)),
                        _ => None,
                    }
                }
            }

            impl<'a> From<&'a Ref<$ty>> for Cell<'a> {
                fn from(cell: &'a Ref<$ty>) -> Self {
                    Cell::$ty(cell)
                }
            }
        )*
    };
}

/// A borrowed Ref cell of any kind.
#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    Schema(&'a Ref<Schema>),
    Parameter(&'a Ref<Parameter>),
    Header(&'a Ref<Header>),
    RequestBody(&'a Ref<RequestBody>),
    Response(&'a Ref<Response>),
    Example(&'a Ref<Example>),
    Link(&'a Ref<Link>),
    SecurityScheme(&'a Ref<SecurityScheme>),
    Callback(&'a Ref<Callback>),
    PathItem(&'a Ref<PathItem>),
}

component!(
    Schema,
    Parameter,
    Header,
    RequestBody,
    Response,
    Example,
    Link,
    SecurityScheme,
    Callback,
    PathItem,
);

macro_rules! each_cell {
    ($cell:expr, $inner:ident => $body:expr) => {
        match $cell {
            Cell::Schema($inner) => $body,
            Cell::Parameter($inner) => $body,
            Cell::Header($inner) => $body,
            Cell::RequestBody($inner) => $body,
            Cell::Response($inner) => $body,
            Cell::Example($inner) => $body,
            Cell::Link($inner) => $body,
            Cell::SecurityScheme($inner) => $body,
            Cell::Callback($inner) => $body,
            Cell::PathItem($inner) => $body,
        }
    };
}

impl<'a> Cell<'a> {
    pub fn kind(&self) -> Kind {
        match self {
            Cell::Schema(_) => Kind::Schema,
            Cell::Parameter(_) => Kind::Parameter,
            Cell::Header(_) => Kind::Header,
            Cell::RequestBody(_) => Kind::RequestBody,
            Cell::Response(_) => Kind::Response,
            Cell::Example(_) => Kind::Example,
            Cell::Link(_) => Kind::Link,
            Cell::SecurityScheme(_) => Kind::SecurityScheme,
            Cell::Callback(_) => Kind::Callback,
            Cell::PathItem(_) => Kind::PathItem,
        }
    }

    pub fn reference(&self) -> Option<&'a str> {
        each_cell!(*self, cell => cell.reference())
    }

    pub fn is_resolved(&self) -> bool {
        each_cell!(*self, cell => cell.is_resolved())
    }

    /// The bound value as a node.
    pub fn node(&self) -> Option<Node> {
        each_cell!(*self, cell => node_of(cell))
    }

    /// Bind to `node`; a node of another kind is refused.
    pub fn bind(&self, node: &Node) -> bool {
        each_cell!(*self, cell => bind_node(cell, node))
    }

    /// Share `node` as the inline value when it equals the current one.
    pub fn adopt(&self, node: &Node) -> bool {
        each_cell!(*self, cell => adopt_node(cell, node))
    }

    pub(crate) fn unbind(&self) -> Option<Node> {
        each_cell!(*self, cell => cell.unbind().map(node_from))
    }
}

fn node_from<T: Component>(value: Arc<T>) -> Node {
    T::into_node(value)
}

fn node_of<T: Component>(cell: &Ref<T>) -> Option<Node> {
    cell.get().map(T::into_node)
}

fn adopt_node<T: Component>(cell: &Ref<T>, node: &Node) -> bool {
    match T::from_node(node) {
        Some(target) => cell.adopt(target),
        None => false,
    }
}

fn bind_node<T: Component>(cell: &Ref<T>, node: &Node) -> bool {
    match T::from_node(node) {
        Some(target) => cell.bind(target),
        None => false,
    }
}

/// A Ref cell owned by an entity, with its pointer tokens relative to that entity.
#[derive(Debug, Clone)]
pub struct Child<'a> {
    pub path: Vec<String>,
    pub cell: Cell<'a>,
}

/// Collects the Ref cells beneath an entity.
#[derive(Debug, Default)]
pub struct Walk<'a> {
    prefix: Vec<String>,
    cells: Vec<Child<'a>>,
}

impl<'a> Walk<'a> {
    pub fn cell(&mut self, tokens: &[&str], cell: impl Into<Cell<'a>>) {
        let mut path = self.prefix.clone();
        path.extend(tokens.iter().map(|token| token.to_string()));
        self.cells.push(Child {
            path,
            cell: cell.into(),
        });
    }

    /// Descend into a container that is not itself a Ref cell.
    pub fn nested(&mut self, tokens: &[&str], f: impl FnOnce(&mut Walk<'a>)) {
        let depth = self.prefix.len();
        self.prefix
            .extend(tokens.iter().map(|token| token.to_string()));
        f(self);
        self.prefix.truncate(depth);
    }

    pub fn into_cells(self) -> Vec<Child<'a>> {
        self.cells
    }
}

/// Entities (and plain containers) that own Ref cells.
pub trait Children {
    fn walk<'a>(&'a self, walk: &mut Walk<'a>);

    fn children(&self) -> Vec<Child<'_>> {
        let mut walk = Walk::default();
        self.walk(&mut walk);
        walk.into_cells()
    }
}

/// Unbind every reference cell reachable from `root`, breaking reference
/// cycles so their allocations can be freed.
pub(crate) fn unlink(root: &dyn Children) {
    let mut seen = HashSet::new();
    let mut stack: Vec<Node> = Vec::new();

    let mut visit = |cell: Cell<'_>, stack: &mut Vec<Node>| {
        let node = if cell.reference().is_some() {
            cell.unbind()
        } else {
            cell.node()
        };
        if let Some(node) = node {
            if seen.insert(node.addr()) {
                stack.push(node);
            }
        }
    };

    for child in root.children() {
        visit(child.cell, &mut stack);
    }
    while let Some(node) = stack.pop() {
        for child in node.children() {
            visit(child.cell, &mut stack);
        }
    }
}
