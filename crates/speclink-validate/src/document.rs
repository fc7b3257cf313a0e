use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use speclink_model::{
    Callback, Component, Components, Document, Encoding, Example, ExternalDocs, Header, Info,
    Link, MediaType, Node, OAuthFlows, Operation, Parameter, PathItem, Ref, RequestBody,
    Response, Schema, SchemaType, SecurityRequirement, SecurityScheme, Server, Tag,
};
use speclink_schema::SchemaValidator;
use tracing::debug;

use crate::config::ValidateConfig;
use crate::error::{Issue, Result, ValidationErrors};
use crate::location::Location;

/// One validation pass over a document.
///
/// Inline entities are checked where they are written. Referenced targets are
/// queued and checked once, after the document itself, at the first location
/// that referenced them; targets already checked inline are skipped.
pub(crate) struct Checker<'c> {
    pub(crate) config: &'c ValidateConfig,
    pub(crate) schemas: SchemaValidator,
    issues: Vec<Issue>,
    seen: HashSet<usize>,
    deferred: VecDeque<(Location, Node)>,
    operation_ids: HashMap<String, String>,
    security_schemes: HashSet<String>,
}

impl<'c> Checker<'c> {
    pub(crate) fn new(config: &'c ValidateConfig) -> Self {
        Self {
            config,
            schemas: SchemaValidator::new(config.schema),
            issues: Vec::new(),
            seen: HashSet::new(),
            deferred: VecDeque::new(),
            operation_ids: HashMap::new(),
            security_schemes: HashSet::new(),
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        debug!(issues = self.issues.len(), "document validation finished");
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                issues: self.issues,
            })
        }
    }

    pub(crate) fn issue(&mut self, at: &Location, message: impl Into<String>) {
        self.issues.push(Issue {
            location: at.to_string(),
            message: message.into(),
        });
    }

    pub(crate) fn document(&mut self, document: &Document) {
        let root = Location::root();
        self.security_schemes = document
            .components
            .security_schemes
            .keys()
            .cloned()
            .collect();

        self.version(&root.at("openapi"), &document.openapi);
        match &document.info {
            Some(info) => self.info(&root.at("info"), info),
            None => self.issue(&root.at("info"), "info is required"),
        }
        self.servers(&root.at("servers"), &document.servers);
        match &document.paths {
            Some(paths) => self.paths(&root.at("paths"), paths),
            None => self.issue(&root.at("paths"), "paths is required"),
        }
        self.components(&root.at("components"), &document.components);
        if let Some(requirements) = &document.security {
            self.requirements(&root.at("security"), requirements);
        }
        self.tags(&root.at("tags"), &document.tags);
        if let Some(docs) = &document.external_docs {
            self.external_docs(&root.at("externalDocs"), docs);
        }

        while let Some((at, node)) = self.deferred.pop_front() {
            self.visit(&at, node);
        }
    }

    /// Check the target of a cell: now when inline, later when referenced.
    pub(crate) fn cell<T: Component>(&mut self, at: &Location, cell: &Ref<T>) {
        let Some(target) = cell.get() else {
            let reference = cell.reference().unwrap_or_default().to_string();
            self.issue(at, format!("unresolved reference {reference:?}"));
            return;
        };
        let node = T::into_node(target);
        if cell.is_reference() {
            self.deferred.push_back((at.clone(), node));
        } else {
            self.visit(at, node);
        }
    }

    fn visit(&mut self, at: &Location, node: Node) {
        if !self.seen.insert(node.addr()) {
            return;
        }
        match &node {
            Node::Schema(schema) => self.schema(at, schema),
            Node::Parameter(parameter) => self.parameter(at, parameter),
            Node::Header(header) => self.header(at, header),
            Node::RequestBody(body) => self.request_body(at, body),
            Node::Response(response) => self.response(at, response),
            Node::Example(example) => self.example(at, example),
            Node::Link(link) => self.link(at, link),
            Node::SecurityScheme(scheme) => self.security_scheme(at, scheme),
            Node::Callback(callback) => self.callback(at, callback),
            Node::PathItem(item) => self.path_item(at, item),
        }
    }

    fn version(&mut self, at: &Location, version: &str) {
        if version.is_empty() {
            self.issue(at, "openapi version is empty");
        } else if !version.starts_with("3.") {
            self.issue(
                at,
                format!("unsupported openapi version {version:?}, expected 3.x"),
            );
        }
    }

    fn info(&mut self, at: &Location, info: &Info) {
        if info.title.is_empty() {
            self.issue(&at.at("title"), "title is empty");
        }
        if info.version.is_empty() {
            self.issue(&at.at("version"), "version is empty");
        }
        if let Some(license) = &info.license {
            if license.name.is_empty() {
                self.issue(&at.at("license").at("name"), "license name is empty");
            }
        }
    }

    fn servers(&mut self, at: &Location, servers: &[Server]) {
        for (index, server) in servers.iter().enumerate() {
            self.server(&at.at(index), server);
        }
    }

    fn server(&mut self, at: &Location, server: &Server) {
        if server.url.is_empty() {
            self.issue(&at.at("url"), "server URL is empty");
        }
        let used = server.template_variables();
        for name in &used {
            if !server.variables.contains_key(*name) {
                self.issue(at, format!("undeclared variable {name:?} in server URL"));
            }
        }
        for (name, variable) in &server.variables {
            let at = at.at("variables").at(name);
            if !used.contains(&name.as_str()) {
                self.issue(
                    &at,
                    format!("variable {name:?} is not used in the server URL"),
                );
            }
            if variable.default.is_empty() {
                self.issue(&at, format!("variable {name:?} has an empty default"));
            } else if !variable.enum_values.is_empty()
                && !variable.enum_values.contains(&variable.default)
            {
                self.issue(
                    &at,
                    format!(
                        "default {:?} of variable {name:?} is not one of its enum values",
                        variable.default
                    ),
                );
            }
        }
    }

    fn paths(&mut self, at: &Location, paths: &IndexMap<String, Ref<PathItem>>) {
        let mut shapes: HashMap<String, &str> = HashMap::new();
        for (template, item) in paths {
            let item_at = at.at(template);
            if !template.starts_with('/') {
                self.issue(&item_at, format!("path {template:?} must begin with \"/\""));
            }
            if let Some(first) = shapes.insert(shape(template), template) {
                self.issue(
                    &item_at,
                    format!("path {template:?} collides with {first:?}"),
                );
            }
            self.cell(&item_at, item);
            if self.config.path_parameters {
                if let Some(item) = item.get() {
                    self.path_parameters(&item_at, template, &item);
                }
            }
        }
    }

    fn path_item(&mut self, at: &Location, item: &PathItem) {
        self.servers(&at.at("servers"), &item.servers);
        for (index, parameter) in item.parameters.iter().enumerate() {
            self.cell(&at.at("parameters").at(index), parameter);
        }
        for (method, operation) in item.operations() {
            self.operation(&at.at(method), operation);
        }
    }

    /// Placeholders in the template against parameters declared `in: path`.
    fn path_parameters(&mut self, at: &Location, template: &str, item: &PathItem) {
        let placeholders = placeholders(template);
        let shared = path_parameter_names(&item.parameters);
        for name in &shared {
            if !placeholders.contains(&name.as_str()) {
                self.issue(
                    &at.at("parameters"),
                    format!("declared path parameter {name:?} does not appear in {template:?}"),
                );
            }
        }

        let mut operations = item.operations().peekable();
        if operations.peek().is_none() {
            for placeholder in &placeholders {
                if !shared.iter().any(|name| name == placeholder) {
                    self.issue(
                        at,
                        format!("path parameter {placeholder:?} in {template:?} is not declared"),
                    );
                }
            }
        }
        for (method, operation) in operations {
            let own = path_parameter_names(&operation.parameters);
            for placeholder in &placeholders {
                let declared = shared
                    .iter()
                    .chain(&own)
                    .any(|name| name == placeholder);
                if !declared {
                    self.issue(
                        &at.at(method),
                        format!("path parameter {placeholder:?} in {template:?} is not declared"),
                    );
                }
            }
            for name in &own {
                if !placeholders.contains(&name.as_str()) {
                    self.issue(
                        &at.at(method).at("parameters"),
                        format!(
                            "declared path parameter {name:?} does not appear in {template:?}"
                        ),
                    );
                }
            }
        }
    }

    fn operation(&mut self, at: &Location, operation: &Operation) {
        if let Some(id) = &operation.operation_id {
            match self.operation_ids.get(id) {
                Some(first) => {
                    let message = format!("operationId {id:?} is already used at {first}");
                    self.issue(&at.at("operationId"), message);
                }
                None => {
                    self.operation_ids.insert(id.clone(), at.to_string());
                }
            }
        }
        for (index, parameter) in operation.parameters.iter().enumerate() {
            self.cell(&at.at("parameters").at(index), parameter);
        }
        if let Some(body) = &operation.request_body {
            self.cell(&at.at("requestBody"), body);
        }
        match &operation.responses {
            Some(responses) if !responses.is_empty() => {
                for (status, response) in responses {
                    self.cell(&at.at("responses").at(status), response);
                }
            }
            _ => self.issue(&at.at("responses"), "operation has no responses"),
        }
        for (name, callback) in &operation.callbacks {
            self.cell(&at.at("callbacks").at(name), callback);
        }
        self.servers(&at.at("servers"), &operation.servers);
        if let Some(requirements) = &operation.security {
            self.requirements(&at.at("security"), requirements);
        }
        if let Some(docs) = &operation.external_docs {
            self.external_docs(&at.at("externalDocs"), docs);
        }
    }

    fn callback(&mut self, at: &Location, callback: &Callback) {
        for (expression, item) in &callback.0 {
            self.cell(&at.at(expression), item);
        }
    }

    fn parameter(&mut self, at: &Location, parameter: &Parameter) {
        let name = &parameter.name;
        if name.is_empty() {
            self.issue(&at.at("name"), "parameter name is empty");
        }
        match parameter.location.as_str() {
            "path" => {
                if !parameter.is_required() {
                    self.issue(
                        &at.at("required"),
                        format!("path parameter {name:?} must be required"),
                    );
                }
            }
            "query" | "header" | "cookie" => {}
            other => self.issue(
                &at.at("in"),
                format!("parameter {name:?} has invalid location {other:?}"),
            ),
        }
        self.schema_or_content(at, parameter.schema.is_some(), &parameter.content);
        if let Some(schema) = &parameter.schema {
            self.cell(&at.at("schema"), schema);
        }
        self.content(&at.at("content"), &parameter.content);
        self.examples(
            at,
            parameter.schema.as_ref(),
            parameter.example.as_ref(),
            &parameter.examples,
        );
    }

    fn header(&mut self, at: &Location, header: &Header) {
        self.schema_or_content(at, header.schema.is_some(), &header.content);
        if let Some(schema) = &header.schema {
            self.cell(&at.at("schema"), schema);
        }
        self.content(&at.at("content"), &header.content);
        self.examples(
            at,
            header.schema.as_ref(),
            header.example.as_ref(),
            &header.examples,
        );
    }

    fn schema_or_content(
        &mut self,
        at: &Location,
        has_schema: bool,
        content: &IndexMap<String, MediaType>,
    ) {
        match (has_schema, !content.is_empty()) {
            (true, true) => self.issue(at, "declares both schema and content"),
            (false, false) => self.issue(at, "declares neither schema nor content"),
            _ => {}
        }
    }

    fn request_body(&mut self, at: &Location, body: &RequestBody) {
        if body.content.is_empty() {
            self.issue(&at.at("content"), "request body has no content");
        }
        self.content(&at.at("content"), &body.content);
    }

    fn response(&mut self, at: &Location, response: &Response) {
        if response.description.is_none() {
            self.issue(&at.at("description"), "response has no description");
        }
        for (name, header) in &response.headers {
            self.cell(&at.at("headers").at(name), header);
        }
        self.content(&at.at("content"), &response.content);
        for (name, link) in &response.links {
            self.cell(&at.at("links").at(name), link);
        }
    }

    fn content(&mut self, at: &Location, content: &IndexMap<String, MediaType>) {
        for (media_type, media) in content {
            self.media_type(&at.at(media_type), media);
        }
    }

    fn media_type(&mut self, at: &Location, media: &MediaType) {
        if let Some(schema) = &media.schema {
            self.cell(&at.at("schema"), schema);
        }
        for (property, encoding) in &media.encoding {
            self.encoding(&at.at("encoding").at(property), encoding);
        }
        self.examples(
            at,
            media.schema.as_ref(),
            media.example.as_ref(),
            &media.examples,
        );
    }

    fn encoding(&mut self, at: &Location, encoding: &Encoding) {
        for (name, header) in &encoding.headers {
            self.cell(&at.at("headers").at(name), header);
        }
    }

    fn example(&mut self, at: &Location, example: &Example) {
        match (example.value.is_some(), example.external_value.is_some()) {
            (true, true) => self.issue(at, "example declares both value and externalValue"),
            (false, false) => self.issue(at, "example declares neither value nor externalValue"),
            _ => {}
        }
    }

    fn link(&mut self, at: &Location, link: &Link) {
        match (link.operation_id.is_some(), link.operation_ref.is_some()) {
            (true, true) => self.issue(at, "link declares both operationId and operationRef"),
            (false, false) => {
                self.issue(at, "link declares neither operationId nor operationRef")
            }
            _ => {}
        }
        if let Some(server) = &link.server {
            self.server(&at.at("server"), server);
        }
    }

    fn security_scheme(&mut self, at: &Location, scheme: &SecurityScheme) {
        match scheme.scheme_type.as_str() {
            "apiKey" => {
                if scheme.name.as_deref().unwrap_or_default().is_empty() {
                    self.issue(&at.at("name"), "apiKey security scheme needs a name");
                }
                match scheme.location.as_deref() {
                    Some("query" | "header" | "cookie") => {}
                    Some(other) => self.issue(
                        &at.at("in"),
                        format!("apiKey security scheme has invalid location {other:?}"),
                    ),
                    None => self.issue(&at.at("in"), "apiKey security scheme needs a location"),
                }
            }
            "http" => {
                if scheme.scheme.as_deref().unwrap_or_default().is_empty() {
                    self.issue(&at.at("scheme"), "http security scheme needs a scheme");
                }
            }
            "oauth2" => match &scheme.flows {
                Some(flows) => self.flows(&at.at("flows"), flows),
                None => self.issue(&at.at("flows"), "oauth2 security scheme needs flows"),
            },
            "openIdConnect" => {
                if scheme
                    .open_id_connect_url
                    .as_deref()
                    .unwrap_or_default()
                    .is_empty()
                {
                    self.issue(
                        &at.at("openIdConnectUrl"),
                        "openIdConnect security scheme needs openIdConnectUrl",
                    );
                }
            }
            other => self.issue(
                &at.at("type"),
                format!("unknown security scheme type {other:?}"),
            ),
        }
    }

    fn flows(&mut self, at: &Location, flows: &OAuthFlows) {
        for (name, flow) in flows.flows() {
            let at = at.at(name);
            let needs_authorization = matches!(name, "implicit" | "authorizationCode");
            let needs_token = name != "implicit";
            if needs_authorization && flow.authorization_url.is_none() {
                self.issue(&at, format!("{name} flow needs authorizationUrl"));
            }
            if needs_token && flow.token_url.is_none() {
                self.issue(&at, format!("{name} flow needs tokenUrl"));
            }
        }
    }

    fn requirements(&mut self, at: &Location, requirements: &[SecurityRequirement]) {
        for (index, requirement) in requirements.iter().enumerate() {
            for name in requirement.keys() {
                if !self.security_schemes.contains(name) {
                    self.issue(
                        &at.at(index),
                        format!("security scheme {name:?} is not declared in components"),
                    );
                }
            }
        }
    }

    fn tags(&mut self, at: &Location, tags: &[Tag]) {
        let mut names = HashSet::new();
        for (index, tag) in tags.iter().enumerate() {
            let at = at.at(index);
            if tag.name.is_empty() {
                self.issue(&at.at("name"), "tag name is empty");
            } else if !names.insert(tag.name.as_str()) {
                self.issue(&at.at("name"), format!("duplicate tag {:?}", tag.name));
            }
            if let Some(docs) = &tag.external_docs {
                self.external_docs(&at.at("externalDocs"), docs);
            }
        }
    }

    fn external_docs(&mut self, at: &Location, docs: &ExternalDocs) {
        if docs.url.is_empty() {
            self.issue(&at.at("url"), "externalDocs url is empty");
        }
    }

    fn components(&mut self, at: &Location, components: &Components) {
        self.named(&at.at("schemas"), &components.schemas);
        self.named(&at.at("responses"), &components.responses);
        self.named(&at.at("parameters"), &components.parameters);
        self.named(&at.at("examples"), &components.examples);
        self.named(&at.at("requestBodies"), &components.request_bodies);
        self.named(&at.at("headers"), &components.headers);
        self.named(&at.at("securitySchemes"), &components.security_schemes);
        self.named(&at.at("links"), &components.links);
        self.named(&at.at("callbacks"), &components.callbacks);
        self.named(&at.at("pathItems"), &components.path_items);
    }

    fn named<T: Component>(&mut self, at: &Location, entries: &IndexMap<String, Ref<T>>) {
        for (name, cell) in entries {
            let at = at.at(name);
            if !is_component_name(name) {
                self.issue(
                    &at,
                    format!("component name {name:?} may only contain letters, digits, '.', '-' and '_'"),
                );
            }
            self.cell(&at, cell);
        }
    }

    fn schema(&mut self, at: &Location, schema: &Arc<Schema>) {
        let is_array = schema
            .schema_type
            .as_ref()
            .is_some_and(|types| types.is(SchemaType::Array));
        if is_array && schema.items.is_none() {
            self.issue(at, "array schema has no items");
        }
        if let Some(pattern) = &schema.pattern {
            if let Err(err) = self.schemas.check_pattern(pattern) {
                self.issue(&at.at("pattern"), err.to_string());
            }
        }
        if let Some(discriminator) = &schema.discriminator {
            if discriminator.property_name.is_empty() {
                self.issue(
                    &at.at("discriminator").at("propertyName"),
                    "discriminator propertyName is empty",
                );
            }
        }

        if let Some(items) = &schema.items {
            self.cell(&at.at("items"), items);
        }
        for (name, property) in &schema.properties {
            self.cell(&at.at("properties").at(name), property);
        }
        if let Some(additional) = schema.additional_schema() {
            self.cell(&at.at("additionalProperties"), additional);
        }
        for (keyword, list) in [
            ("allOf", &schema.all_of),
            ("anyOf", &schema.any_of),
            ("oneOf", &schema.one_of),
        ] {
            for (index, member) in list.iter().enumerate() {
                self.cell(&at.at(keyword).at(index), member);
            }
        }
        if let Some(not) = &schema.not {
            self.cell(&at.at("not"), not);
        }

        self.schema_values(at, schema);
    }
}

/// A template with its placeholder names erased, for collision checks.
fn shape(template: &str) -> String {
    let mut shape = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        shape.push_str(&rest[..open]);
        shape.push_str("{}");
        rest = &rest[open + close + 1..];
    }
    shape.push_str(rest);
    shape
}

/// `{name}` placeholders in a path template, in order.
fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
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

/// Names of the bound parameters declared `in: path`.
fn path_parameter_names(parameters: &[Ref<Parameter>]) -> Vec<String> {
    parameters
        .iter()
        .filter_map(Ref::get)
        .filter(|parameter| parameter.location == "path")
        .map(|parameter| parameter.name.clone())
        .collect()
}

fn is_component_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
