use std::collections::BTreeMap;

use libxml::tree::{Node as LibxmlNode, NodeType};

/// A node borrowed from a [`crate::Document`]'s tree.
#[derive(Clone)]
pub struct Node(LibxmlNode);

impl Node {
    pub(crate) fn new(inner: LibxmlNode) -> Self {
        Node(inner)
    }

    pub(crate) fn inner(&self) -> &LibxmlNode {
        &self.0
    }

    pub fn tag_name(&self) -> String {
        self.0.get_name()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_property(name)
    }

    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.0.get_properties().into_iter().collect()
    }

    pub fn text_content(&self) -> String {
        self.0.get_content()
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.get_child_nodes().into_iter().map(Node::new).collect()
    }

    pub fn is_element(&self) -> bool {
        self.0.get_type() == Some(NodeType::ElementNode)
    }
}
