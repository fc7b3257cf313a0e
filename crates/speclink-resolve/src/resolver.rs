use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde_json::Value;
use speclink_model::{Cell, Children, Document, Kind, Node, Pointer, Reference, Site};
use speclink_source::{decode, location, Fetcher, Format};
use tracing::{debug, info};
use url::Url;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::index::{self, Index};

const ROOT: usize = 0;

/// Counters from one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Reference cells encountered.
    pub references: usize,
    /// Reference cells bound by this pass.
    pub bound: usize,
    /// External documents fetched, in load order.
    pub external_documents: Vec<Url>,
}

/// Binds every reference cell of a document to its target.
///
/// Each call to [`Resolver::resolve`] is one pass with its own document
/// cache, so an external location is fetched at most once per pass.
#[derive(Debug)]
pub struct Resolver<F> {
    config: ResolverConfig,
    fetcher: F,
}

impl<F: Fetcher> Resolver<F> {
    pub fn new(config: ResolverConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `document`, whose untyped form is `raw`.
    ///
    /// On error some cells may already be bound; the document should be
    /// discarded. Resolving a fully resolved document binds nothing and
    /// fetches nothing.
    pub fn resolve(&self, document: &Document, raw: &Value) -> Result<ResolveReport> {
        let mut pass = Pass::new(&self.config, &self.fetcher, document, raw);
        for child in document.children() {
            let at = Pointer::from_tokens(child.path);
            pass.visit(ROOT, &at, child.cell)?;
        }
        info!(
            references = pass.report.references,
            bound = pass.report.bound,
            external = pass.report.external_documents.len(),
            "resolved document"
        );
        Ok(pass.report)
    }
}

struct Source<'a> {
    location: Option<Url>,
    raw: Cow<'a, Value>,
    index: Index,
    /// Whether pointers follow the specification document layout. The root
    /// always does; an external document does when it declares `openapi`.
    specification: bool,
}

impl Source<'_> {
    fn name(&self) -> String {
        match &self.location {
            Some(location) => location.to_string(),
            None => "<root document>".to_string(),
        }
    }
}

enum Step {
    Alias(String),
    Value(Value),
}

struct Pass<'a, F> {
    config: &'a ResolverConfig,
    fetcher: &'a F,
    sources: Vec<Source<'a>>,
    by_location: HashMap<Url, usize>,
    visited: HashSet<usize>,
    report: ResolveReport,
}

impl<'a, F: Fetcher> Pass<'a, F> {
    fn new(config: &'a ResolverConfig, fetcher: &'a F, document: &Document, raw: &'a Value) -> Self {
        let mut index = Index::default();
        index.add_children(&Pointer::root(), document);

        let location = config.root.clone().map(without_fragment);
        let mut by_location = HashMap::new();
        if let Some(location) = &location {
            by_location.insert(location.clone(), ROOT);
        }

        Self {
            config,
            fetcher,
            sources: vec![Source {
                location,
                raw: Cow::Borrowed(raw),
                index,
                specification: true,
            }],
            by_location,
            visited: HashSet::new(),
            report: ResolveReport::default(),
        }
    }

    fn checkpoint(&self) -> Result<()> {
        if self
            .config
            .cancel
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Err(ResolveError::Cancelled);
        }
        if self
            .config
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(ResolveError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Visit one cell found at `at` in document `doc`.
    fn visit(&mut self, doc: usize, at: &Pointer, cell: Cell<'_>) -> Result<()> {
        self.checkpoint()?;

        let Some(reference) = cell.reference() else {
            return match cell.node() {
                Some(node) => self.descend(doc, at, &node),
                None => Ok(()),
            };
        };
        self.report.references += 1;

        let parsed = Reference::parse(reference).map_err(|source| ResolveError::Malformed {
            reference: reference.to_string(),
            source,
        })?;

        if let Some(node) = cell.node() {
            // Bound by an earlier pass: walk on without fetching.
            return match self.loaded_origin(doc, reference, &parsed) {
                Some(origin) => self.descend(origin, parsed.pointer(), &node),
                None => Ok(()),
            };
        }

        let (target, pointer, node) = self.target(doc, reference, &parsed, cell.kind())?;
        if cell.bind(&node) {
            self.report.bound += 1;
            debug!(reference, at = %at, kind = %cell.kind(), "bound reference");
        }

        if target == doc {
            return self.descend(target, &pointer, &node);
        }
        self.descend(target, &pointer, &node)
            .map_err(|source| ResolveError::Via {
                reference: reference.to_string(),
                location: self.sources[target].name(),
                source: Box::new(source),
            })
    }

    /// Traverse the cells beneath `node`, once per node.
    fn descend(&mut self, doc: usize, at: &Pointer, node: &Node) -> Result<()> {
        if !self.visited.insert(node.addr()) {
            return Ok(());
        }
        for child in node.children() {
            self.visit(doc, &at.join(&child.path), child.cell)?;
        }
        Ok(())
    }

    /// Locate, and decode if needed, the entity `parsed` addresses,
    /// following `$ref` aliases.
    fn target(
        &mut self,
        doc: usize,
        reference: &str,
        parsed: &Reference,
        expected: Kind,
    ) -> Result<(usize, Pointer, Node)> {
        let mut doc = if parsed.is_local() {
            doc
        } else {
            self.external(doc, reference, parsed.locator())?
        };
        let mut pointer = parsed.pointer().clone();
        let mut chain = vec![reference.to_string()];
        let mut seen = HashSet::new();

        loop {
            if !seen.insert((doc, pointer.clone())) {
                return Err(ResolveError::ReferenceCycle { chain });
            }

            let step = {
                let source = &self.sources[doc];
                if let Some(node) = source.index.get(&pointer) {
                    check_kind(reference, &pointer, expected, node.kind())?;
                    return Ok((doc, pointer, node.clone()));
                }
                let value = pointer
                    .lookup(&source.raw)
                    .ok_or_else(|| ResolveError::NotFound {
                        reference: reference.to_string(),
                        pointer: pointer.to_string(),
                        document: source.name(),
                    })?;
                if source.specification {
                    match Site::of(pointer.tokens()) {
                        Site::Entity(found) => check_kind(reference, &pointer, expected, found)?,
                        Site::Structure(found) => {
                            return Err(ResolveError::NotAnEntity {
                                reference: reference.to_string(),
                                pointer: pointer.to_string(),
                                expected,
                                found,
                            })
                        }
                        Site::Free => {}
                    }
                }
                match value.get("$ref") {
                    Some(Value::String(next)) => Step::Alias(next.clone()),
                    _ => Step::Value(value.clone()),
                }
            };

            match step {
                Step::Alias(next) => {
                    let hop = Reference::parse(&next).map_err(|source| ResolveError::Malformed {
                        reference: next.clone(),
                        source,
                    })?;
                    if !hop.is_local() {
                        doc = self.external(doc, &next, hop.locator())?;
                    }
                    pointer = hop.pointer().clone();
                    chain.push(next);
                }
                Step::Value(value) => {
                    let node = index::decode(expected, value).map_err(|source| {
                        ResolveError::InvalidTarget {
                            reference: reference.to_string(),
                            pointer: pointer.to_string(),
                            expected,
                            source,
                        }
                    })?;
                    debug!(pointer = %pointer, kind = %expected, "decoded reference target");
                    self.sources[doc].index.add(pointer.clone(), node.clone());
                    return Ok((doc, pointer, node));
                }
            }
        }
    }

    /// The source for an external locator, fetched and decoded on first use.
    fn external(&mut self, doc: usize, reference: &str, locator: &str) -> Result<usize> {
        if !self.config.external_refs {
            return Err(ResolveError::ExternalDisabled {
                reference: reference.to_string(),
            });
        }
        let location = self.locate(doc, reference, locator)?;
        if let Some(&id) = self.by_location.get(&location) {
            return Ok(id);
        }

        self.checkpoint()?;
        info!(location = %location, "fetching external document");
        let bytes = self
            .fetcher
            .fetch(&location)
            .map_err(|source| ResolveError::Fetch {
                reference: reference.to_string(),
                location: location.clone(),
                source,
            })?;
        let format = Format::detect(Some(&location), &bytes);
        let raw = decode(&bytes, format).map_err(|source| ResolveError::Decode {
            reference: reference.to_string(),
            location: location.clone(),
            source,
        })?;

        let id = self.sources.len();
        let specification = raw.get("openapi").is_some_and(Value::is_string);
        self.sources.push(Source {
            location: Some(location.clone()),
            raw: Cow::Owned(raw),
            index: Index::default(),
            specification,
        });
        self.by_location.insert(location.clone(), id);
        self.report.external_documents.push(location);
        Ok(id)
    }

    /// Absolute location of `locator`, relative to the document it appears in.
    fn locate(&self, doc: usize, reference: &str, locator: &str) -> Result<Url> {
        let invalid = |message: String| ResolveError::InvalidLocation {
            reference: reference.to_string(),
            message,
        };
        let base = match &self.sources[doc].location {
            Some(base) => base.clone(),
            None => location::cwd_base().map_err(|err| invalid(err.to_string()))?,
        };
        let location = base.join(locator).map_err(|err| invalid(err.to_string()))?;
        Ok(without_fragment(location))
    }

    /// The source an already bound reference points into, when it is loaded.
    fn loaded_origin(&self, doc: usize, reference: &str, parsed: &Reference) -> Option<usize> {
        if parsed.is_local() {
            return Some(doc);
        }
        let location = self.locate(doc, reference, parsed.locator()).ok()?;
        self.by_location.get(&location).copied()
    }
}

fn check_kind(reference: &str, pointer: &Pointer, expected: Kind, found: Kind) -> Result<()> {
    if expected == found {
        return Ok(());
    }
    Err(ResolveError::WrongKind {
        reference: reference.to_string(),
        pointer: pointer.to_string(),
        expected,
        found,
    })
}

fn without_fragment(mut location: Url) -> Url {
    location.set_fragment(None);
    location
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use speclink_model::Schema;
    use speclink_source::MemoryFetcher;

    use super::*;

    fn resolve(raw: Value) -> Result<(Document, ResolveReport)> {
        let document = Document::from_value(raw.clone()).unwrap();
        let report = Resolver::new(ResolverConfig::default(), MemoryFetcher::new())
            .resolve(&document, &raw)?;
        Ok((document, report))
    }

    fn schema(doc: &Document, name: &str) -> Arc<Schema> {
        doc.components.schemas[name].get().unwrap()
    }

    #[test]
    fn self_reference_binds_to_itself() {
        let (doc, report) = resolve(json!({
            "components": {
                "schemas": {
                    "A": {"type": "array", "items": {"$ref": "#/components/schemas/A"}}
                }
            }
        }))
        .unwrap();

        let a = schema(&doc, "A");
        let items = a.items.as_ref().unwrap().get().unwrap();
        assert!(Arc::ptr_eq(&a, &items));
        assert_eq!(report.references, 1);
        assert_eq!(report.bound, 1);
    }

    #[test]
    fn aliased_component_follows_chain() {
        let (doc, _) = resolve(json!({
            "components": {
                "schemas": {
                    "Alias": {"$ref": "#/components/schemas/Real"},
                    "Real": {"type": "string"},
                    "User": {"properties": {"name": {"$ref": "#/components/schemas/Alias"}}}
                }
            }
        }))
        .unwrap();

        let real = schema(&doc, "Real");
        assert!(doc.components.schemas["Alias"].points_to(&real));
        assert!(schema(&doc, "User").properties["name"].points_to(&real));
    }

    #[test]
    fn alias_loop_is_a_reference_cycle() {
        let err = resolve(json!({
            "components": {
                "schemas": {
                    "A": {"$ref": "#/components/schemas/B"},
                    "B": {"$ref": "#/components/schemas/A"}
                }
            }
        }))
        .unwrap_err();
        assert!(matches!(err, ResolveError::ReferenceCycle { ref chain } if chain.len() == 2));
    }

    #[test]
    fn nested_inline_target_shares_identity() {
        let (doc, _) = resolve(json!({
            "components": {
                "schemas": {
                    "Pet": {"properties": {"tag": {"type": "string"}}},
                    "Owner": {"properties": {"petTag": {"$ref": "#/components/schemas/Pet/properties/tag"}}}
                }
            }
        }))
        .unwrap();

        let tag = schema(&doc, "Pet").properties["tag"].get().unwrap();
        assert!(schema(&doc, "Owner").properties["petTag"].points_to(&tag));
    }

    #[test]
    fn missing_target_is_not_found() {
        let err = resolve(json!({
            "components": {"schemas": {"A": {"items": {"$ref": "#/components/schemas/Missing"}}}}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound { ref pointer, .. } if pointer == "/components/schemas/Missing"
        ));
    }

    #[test]
    fn malformed_reference_is_reported() {
        let err = resolve(json!({
            "components": {"schemas": {"A": {"items": {"$ref": "#components/schemas/B"}}}}
        }))
        .unwrap_err();
        assert!(matches!(err, ResolveError::Malformed { .. }));
    }

    #[test]
    fn structure_is_not_a_reference_target() {
        for target in ["#/info", "#/paths/~1a/get", "#/components/schemas"] {
            let err = resolve(json!({
                "info": {"title": "t", "version": "1"},
                "paths": {
                    "/a": {"get": {"responses": {"200": {"$ref": target}}}}
                },
                "components": {"schemas": {"A": {"type": "string"}}}
            }))
            .unwrap_err();
            assert!(
                matches!(err, ResolveError::NotAnEntity { expected: Kind::Response, .. }),
                "{target}: {err}"
            );
        }
    }

    #[test]
    fn path_item_as_response_is_wrong_kind() {
        let err = resolve(json!({
            "paths": {
                "/a": {"get": {"responses": {"200": {"$ref": "#/paths/~1a"}}}}
            }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::WrongKind { expected: Kind::Response, found: Kind::PathItem, .. }
        ));
    }

    #[test]
    fn local_path_item_reference_binds() {
        let (doc, report) = resolve(json!({
            "paths": {
                "/pets": {"$ref": "#/components/pathItems/Pets"}
            },
            "components": {
                "pathItems": {"Pets": {"get": {"responses": {"200": {"description": "ok"}}}}}
            }
        }))
        .unwrap();

        let shared = doc.components.path_items["Pets"].get().unwrap();
        assert!(doc.paths.as_ref().unwrap()["/pets"].points_to(&shared));
        assert_eq!(report.bound, 1);
        assert!(doc.is_resolved());
    }

    #[test]
    fn undecodable_target_is_invalid() {
        let err = resolve(json!({
            "paths": {
                "/a": {"get": {"responses": {"200": {"$ref": "#/x-responses/ok"}}}}
            },
            "x-responses": {"ok": {"description": 5}}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidTarget { expected: Kind::Response, .. }
        ));
    }
}
