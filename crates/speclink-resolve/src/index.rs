use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use speclink_model::{
    Callback, Child, Children, Component, Example, Header, Kind, Link, Node, Parameter, PathItem,
    Pointer, RequestBody, Response, Schema, SecurityScheme,
};

/// Inline entities of one document, by JSON pointer.
///
/// Reference cells are not recorded: the tree holds `{"$ref": ...}` at
/// their position and is followed from there.
#[derive(Debug, Default)]
pub(crate) struct Index {
    nodes: HashMap<Pointer, Node>,
}

impl Index {
    pub(crate) fn get(&self, pointer: &Pointer) -> Option<&Node> {
        self.nodes.get(pointer)
    }

    /// Record every inline cell beneath `root`.
    pub(crate) fn add_children(&mut self, at: &Pointer, root: &dyn Children) {
        let pending = inline_children(at, root.children());
        self.drain(pending);
    }

    /// Record `node` at `pointer` along with its inline cells.
    ///
    /// Descendants recorded earlier, because a reference reached them before
    /// their enclosing entity, are shared into `node` so one location keeps
    /// one identity.
    pub(crate) fn add(&mut self, pointer: Pointer, node: Node) {
        self.share_recorded(&pointer, &node);
        self.drain(vec![(pointer, node)]);
    }

    fn share_recorded(&self, at: &Pointer, node: &Node) {
        let mut stack = vec![(at.clone(), node.clone())];
        while let Some((at, node)) = stack.pop() {
            for child in node.children() {
                if child.cell.reference().is_some() {
                    continue;
                }
                let pointer = at.join(&child.path);
                match self.nodes.get(&pointer) {
                    Some(recorded) => {
                        child.cell.adopt(recorded);
                    }
                    None => {
                        if let Some(next) = child.cell.node() {
                            stack.push((pointer, next));
                        }
                    }
                }
            }
        }
    }

    fn drain(&mut self, mut pending: Vec<(Pointer, Node)>) {
        while let Some((pointer, node)) = pending.pop() {
            if self.nodes.contains_key(&pointer) {
                continue;
            }
            pending.extend(inline_children(&pointer, node.children()));
            self.nodes.insert(pointer, node);
        }
    }
}

fn inline_children(at: &Pointer, children: Vec<Child<'_>>) -> Vec<(Pointer, Node)> {
    children
        .into_iter()
        .filter(|child| child.cell.reference().is_none())
        .filter_map(|child| child.cell.node().map(|node| (at.join(&child.path), node)))
        .collect()
}

/// Decode an untyped value as an entity of `kind`.
pub(crate) fn decode(kind: Kind, value: Value) -> Result<Node, serde_json::Error> {
    match kind {
        Kind::Schema => decode_as::<Schema>(value),
        Kind::Parameter => decode_as::<Parameter>(value),
        Kind::Header => decode_as::<Header>(value),
        Kind::RequestBody => decode_as::<RequestBody>(value),
        Kind::Response => decode_as::<Response>(value),
        Kind::Example => decode_as::<Example>(value),
        Kind::Link => decode_as::<Link>(value),
        Kind::SecurityScheme => decode_as::<SecurityScheme>(value),
        Kind::Callback => decode_as::<Callback>(value),
        Kind::PathItem => decode_as::<PathItem>(value),
    }
}

fn decode_as<T: Component>(value: Value) -> Result<Node, serde_json::Error> {
    serde_json::from_value::<T>(value).map(|entity| T::into_node(Arc::new(entity)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use speclink_model::Document;

    use super::*;

    #[test]
    fn indexes_nested_inline_entities() {
        let doc = Document::from_value(json!({
            "paths": {
                "/pets": {
                    "get": {
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": {"application/json": {"schema": {"type": "array", "items": {"type": "string"}}}}
                            }
                        }
                    }
                }
            },
            "components": {"schemas": {"Ref": {"$ref": "#/components/schemas/Other"}}}
        }))
        .unwrap();

        let mut index = Index::default();
        index.add_children(&Pointer::root(), &doc);

        let response = Pointer::parse("/paths/~1pets/get/responses/200").unwrap();
        assert_eq!(index.get(&response).map(Node::kind), Some(Kind::Response));
        let items = Pointer::parse(
            "/paths/~1pets/get/responses/200/content/application~1json/schema/items",
        )
        .unwrap();
        assert_eq!(index.get(&items).map(Node::kind), Some(Kind::Schema));
        assert!(index
            .get(&Pointer::parse("/components/schemas/Ref").unwrap())
            .is_none());
    }

    #[test]
    fn enclosing_entity_shares_recorded_descendants() {
        let mut index = Index::default();
        let tag_at = Pointer::parse("/Pet/properties/tag").unwrap();
        let tag = decode(Kind::Schema, json!({"type": "string"})).unwrap();
        index.add(tag_at.clone(), tag.clone());

        let pet = decode(
            Kind::Schema,
            json!({"properties": {"tag": {"type": "string"}, "name": {"type": "string"}}}),
        )
        .unwrap();
        index.add(Pointer::parse("/Pet").unwrap(), pet.clone());

        let Node::Schema(pet) = pet else {
            panic!("decoded a {}", pet.kind());
        };
        let shared = pet.properties["tag"].get().unwrap();
        assert_eq!(Node::Schema(shared).addr(), tag.addr());
        assert_eq!(index.get(&tag_at).map(Node::addr), Some(tag.addr()));
        let name = Pointer::parse("/Pet/properties/name").unwrap();
        assert_eq!(index.get(&name).map(Node::kind), Some(Kind::Schema));
    }

    #[test]
    fn decodes_by_kind() {
        let node = decode(Kind::Response, json!({"description": "gone"})).unwrap();
        assert_eq!(node.kind(), Kind::Response);
        assert!(decode(Kind::Schema, json!({"type": "date"})).is_err());
        let node = decode(Kind::PathItem, json!({"get": {"responses": {}}})).unwrap();
        assert_eq!(node.kind(), Kind::PathItem);
    }
}
