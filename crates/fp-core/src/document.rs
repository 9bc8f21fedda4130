//! SVG element tree.
//!
//! The loaded floorplan is kept as a tree of XML nodes on a petgraph
//! `StableDiGraph` (edges point parent → child). Child order is stored
//! explicitly because stable graphs reuse vacated indices, so index order
//! stops meaning document order after the first removal.

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;

pub type Attributes = SmallVec<[(String, String); 6]>;

/// An element: tag plus decoded attribute values in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Attributes,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: SmallVec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class") {
            Some(c) if !c.trim().is_empty() => format!("{} {class}", c.trim()),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    pub fn remove_class(&mut self, class: &str) {
        let Some(current) = self.attr("class") else {
            return;
        };
        let rest = current
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if rest.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", rest);
        }
    }

    /// Numeric attribute, ignoring a trailing unit such as `px`.
    pub fn number_attr(&self, name: &str) -> Option<f32> {
        let raw = self.attr(name)?.trim();
        let end = raw
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .unwrap_or(raw.len());
        raw[..end].parse().ok()
    }
}

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    /// Decoded character data.
    Text(String),
    Comment(String),
    /// Raw CDATA section content.
    CData(String),
}

/// Root coordinate system of the loaded drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl ViewBox {
    /// Read from the root element: `viewBox` first, then `width`/`height`,
    /// then the 1200×800 default. Zero or missing parts fall back per field.
    pub fn from_root(root: &Element) -> Self {
        let fallback = Self::default();
        if let Some(vb) = root.attr("viewBox") {
            let parts: Vec<f32> = vb
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(|s| s.parse().unwrap_or(0.0))
                .collect();
            let part = |i: usize, default: f32| match parts.get(i) {
                Some(v) if *v != 0.0 => *v,
                _ => default,
            };
            return Self {
                x: part(0, 0.0),
                y: part(1, 0.0),
                width: part(2, fallback.width),
                height: part(3, fallback.height),
            };
        }
        Self {
            x: 0.0,
            y: 0.0,
            width: root
                .number_attr("width")
                .filter(|w| *w > 0.0)
                .unwrap_or(fallback.width),
            height: root
                .number_attr("height")
                .filter(|h| *h > 0.0)
                .unwrap_or(fallback.height),
        }
    }

    /// Grow by `padding` on every side.
    pub fn padded(&self, padding: f32) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }
}

/// A parsed SVG document.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    /// The underlying tree.
    pub graph: StableDiGraph<XmlNode, ()>,

    /// The root `<svg>` element.
    pub root: NodeIndex,

    /// Everything before the root element (XML declaration, doctype,
    /// leading comments), emitted verbatim.
    pub prolog: String,

    /// Root coordinate system as read at load time.
    pub view_box: ViewBox,

    children: HashMap<NodeIndex, Vec<NodeIndex>>,
    id_index: HashMap<String, NodeIndex>,
}

impl SvgDocument {
    /// A document consisting of a bare `<svg>` root.
    pub fn new(root: Element) -> Self {
        let view_box = ViewBox::from_root(&root);
        let mut graph = StableDiGraph::new();
        let root_idx = graph.add_node(XmlNode::Element(root));
        let mut doc = Self {
            graph,
            root: root_idx,
            prolog: String::new(),
            view_box,
            children: HashMap::new(),
            id_index: HashMap::new(),
        };
        doc.index_ids(root_idx);
        doc
    }

    /// An empty drawing of the given size.
    pub fn empty(width: f32, height: f32) -> Self {
        Self::new(
            Element::new("svg")
                .with_attr("xmlns", "http://www.w3.org/2000/svg")
                .with_attr("viewBox", format!("0 0 {width} {height}")),
        )
    }

    /// Append `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeIndex, node: XmlNode) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.children.entry(parent).or_default().push(idx);
        self.index_ids(idx);
        idx
    }

    /// Append a new element and return its index.
    pub fn append_element(&mut self, parent: NodeIndex, element: Element) -> NodeIndex {
        self.append(parent, XmlNode::Element(element))
    }

    /// Remove a node and its whole subtree. Removing the root is refused.
    pub fn remove(&mut self, idx: NodeIndex) -> bool {
        if idx == self.root || !self.graph.contains_node(idx) {
            return false;
        }
        if let Some(parent) = self.parent(idx)
            && let Some(siblings) = self.children.get_mut(&parent)
        {
            siblings.retain(|&c| c != idx);
        }
        for node in self.descendants(idx) {
            self.children.remove(&node);
            if let Some(XmlNode::Element(el)) = self.graph.remove_node(node)
                && let Some(id) = el.attr("id")
                && self.id_index.get(id) == Some(&node)
            {
                self.id_index.remove(id);
            }
        }
        true
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.graph.contains_node(idx)
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in document order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.children.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Element children only.
    pub fn child_elements(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.children(idx)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// `idx` and everything below it, pre-order.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Move a node to the end of its parent's children (painted last).
    pub fn bring_to_front(&mut self, idx: NodeIndex) {
        if let Some(parent) = self.parent(idx)
            && let Some(siblings) = self.children.get_mut(&parent)
        {
            siblings.retain(|&c| c != idx);
            siblings.push(idx);
        }
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&XmlNode> {
        self.graph.node_weight(idx)
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        match self.graph.node_weight(idx)? {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable element access. Use [`Self::set_attr`] for `id` so the
    /// id index stays in sync.
    pub fn element_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        match self.graph.node_weight_mut(idx)? {
            XmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn attr(&self, idx: NodeIndex, name: &str) -> Option<&str> {
        self.element(idx)?.attr(name)
    }

    /// Set an attribute, keeping the id index current.
    pub fn set_attr(&mut self, idx: NodeIndex, name: &str, value: impl Into<String>) {
        let value = value.into();
        let Some(el) = self.element_mut(idx) else {
            return;
        };
        let old_id = (name == "id").then(|| el.attr("id").map(str::to_string)).flatten();
        el.set_attr(name, value.clone());
        if name == "id" {
            if let Some(old) = old_id
                && self.id_index.get(&old) == Some(&idx)
            {
                self.id_index.remove(&old);
            }
            self.id_index.insert(value, idx);
        }
    }

    /// Look up an element by its `id` attribute.
    pub fn find_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.id_index.get(id).copied()
    }

    /// First element child of `idx` with the given tag.
    pub fn find_child(&self, idx: NodeIndex, tag: &str) -> Option<NodeIndex> {
        self.child_elements(idx)
            .find(|&c| self.element(c).is_some_and(|el| el.tag == tag))
    }

    /// Concatenated text below `idx`.
    pub fn text_content(&self, idx: NodeIndex) -> String {
        let mut out = String::new();
        for node in self.descendants(idx) {
            match self.node(node) {
                Some(XmlNode::Text(t)) | Some(XmlNode::CData(t)) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Replace all children of `idx` with a single text node.
    pub fn set_text_content(&mut self, idx: NodeIndex, text: &str) {
        for child in self.children(idx).to_vec() {
            self.remove(child);
        }
        self.append(idx, XmlNode::Text(text.to_string()));
    }

    /// Every element whose `id` satisfies `pred`, in document order.
    pub fn elements_with_id(&self, pred: impl Fn(&str) -> bool) -> Vec<NodeIndex> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&idx| self.attr(idx, "id").is_some_and(&pred))
            .collect()
    }

    fn index_ids(&mut self, idx: NodeIndex) {
        if let Some(id) = self.attr(idx, "id") {
            let id = id.to_string();
            // First occurrence wins, as with `getElementById`.
            self.id_index.entry(id).or_insert(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_remove_keep_order_and_ids() {
        let mut doc = SvgDocument::empty(100.0, 100.0);
        let root = doc.root;
        let a = doc.append_element(root, Element::new("g").with_attr("id", "a"));
        let b = doc.append_element(root, Element::new("g").with_attr("id", "b"));
        let inner = doc.append_element(a, Element::new("rect").with_attr("id", "a_rect"));

        assert_eq!(doc.children(root), &[a, b]);
        assert_eq!(doc.find_by_id("a_rect"), Some(inner));

        assert!(doc.remove(a));
        assert_eq!(doc.children(root), &[b]);
        assert_eq!(doc.find_by_id("a"), None);
        assert_eq!(doc.find_by_id("a_rect"), None);

        // Reused slot lands at the end, not at its old index position.
        let c = doc.append_element(root, Element::new("g").with_attr("id", "c"));
        assert_eq!(doc.children(root), &[b, c]);
    }

    #[test]
    fn set_attr_reindexes_id() {
        let mut doc = SvgDocument::empty(10.0, 10.0);
        let root = doc.root;
        let g = doc.append_element(root, Element::new("g").with_attr("id", "device_1"));
        doc.set_attr(g, "id", "device_2");
        assert_eq!(doc.find_by_id("device_1"), None);
        assert_eq!(doc.find_by_id("device_2"), Some(g));
    }

    #[test]
    fn classes() {
        let mut el = Element::new("g").with_attr("class", "device");
        el.add_class("selected");
        assert!(el.has_class("selected"));
        assert_eq!(el.attr("class"), Some("device selected"));
        el.remove_class("device");
        el.remove_class("selected");
        assert_eq!(el.attr("class"), None);
    }

    #[test]
    fn view_box_fallbacks() {
        let vb = ViewBox::from_root(&Element::new("svg").with_attr("viewBox", "10 20 300 400"));
        assert_eq!((vb.x, vb.y, vb.width, vb.height), (10.0, 20.0, 300.0, 400.0));

        let vb = ViewBox::from_root(
            &Element::new("svg")
                .with_attr("width", "640px")
                .with_attr("height", "480"),
        );
        assert_eq!((vb.width, vb.height), (640.0, 480.0));

        assert_eq!(ViewBox::from_root(&Element::new("svg")), ViewBox::default());
    }

    #[test]
    fn text_content_replacement() {
        let mut doc = SvgDocument::empty(10.0, 10.0);
        let root = doc.root;
        let title = doc.append_element(root, Element::new("title"));
        doc.set_text_content(title, "Pump A");
        assert_eq!(doc.text_content(title), "Pump A");
        doc.set_text_content(title, "Pump B");
        assert_eq!(doc.text_content(title), "Pump B");
        assert_eq!(doc.children(title).len(), 1);
    }
}
