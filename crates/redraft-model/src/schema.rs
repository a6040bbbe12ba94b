//! Schemas: the set of node and mark types a document may use.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::content::ContentMatch;
use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;

/// Attribute map of a node or mark, in declaration order.
pub type Attrs = Map<String, Value>;

/// Declaration of one attribute. Without a default the attribute is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrSpec {
    pub default: Option<Value>,
}

impl AttrSpec {
    pub fn required() -> Self {
        Self { default: None }
    }

    pub fn with_default(value: Value) -> Self {
        Self {
            default: Some(value),
        }
    }
}

/// Declaration of a node type.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    /// Content expression; empty for leaf nodes.
    pub content: String,
    /// Space separated group names.
    pub group: String,
    pub inline: bool,
    pub atom: bool,
    pub attrs: IndexMap<String, AttrSpec>,
    /// Allowed marks: `"_"` for all, `""` for none, or space separated
    /// mark names. `None` allows all marks in inline content and none
    /// elsewhere.
    pub marks: Option<String>,
}

impl NodeSpec {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            ..Self::default()
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn attr(mut self, name: &str, default: Value) -> Self {
        self.attrs.insert(name.to_string(), AttrSpec::with_default(default));
        self
    }

    pub fn required_attr(mut self, name: &str) -> Self {
        self.attrs.insert(name.to_string(), AttrSpec::required());
        self
    }

    pub fn marks(mut self, marks: &str) -> Self {
        self.marks = Some(marks.to_string());
        self
    }
}

/// Declaration of a mark type.
#[derive(Debug, Clone, Default)]
pub struct MarkSpec {
    pub attrs: IndexMap<String, AttrSpec>,
    /// Space separated mark names this mark excludes, `"_"` for all.
    /// Defaults to the mark itself.
    pub excludes: Option<String>,
    /// Whether the mark extends to text typed at its end. Defaults to true.
    pub inclusive: Option<bool>,
}

impl MarkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: &str, default: Value) -> Self {
        self.attrs.insert(name.to_string(), AttrSpec::with_default(default));
        self
    }

    pub fn required_attr(mut self, name: &str) -> Self {
        self.attrs.insert(name.to_string(), AttrSpec::required());
        self
    }

    pub fn excludes(mut self, excludes: &str) -> Self {
        self.excludes = Some(excludes.to_string());
        self
    }

    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = Some(inclusive);
        self
    }
}

/// Ordered node and mark declarations. Mark order defines mark rank.
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    pub nodes: IndexMap<String, NodeSpec>,
    pub marks: IndexMap<String, MarkSpec>,
    pub top_node: Option<String>,
}

impl SchemaSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, name: &str, spec: NodeSpec) -> Self {
        self.nodes.insert(name.to_string(), spec);
        self
    }

    pub fn mark(mut self, name: &str, spec: MarkSpec) -> Self {
        self.marks.insert(name.to_string(), spec);
        self
    }

    pub fn top_node(mut self, name: &str) -> Self {
        self.top_node = Some(name.to_string());
        self
    }
}

#[derive(Debug)]
pub(crate) struct NodeTypeData {
    name: String,
    groups: Vec<String>,
    inline: bool,
    atom: bool,
    is_text: bool,
    attrs: IndexMap<String, AttrSpec>,
    content: ContentMatch,
    inline_content: bool,
    /// `None` allows every mark.
    mark_set: Option<Vec<usize>>,
}

#[derive(Debug)]
pub(crate) struct MarkTypeData {
    name: String,
    attrs: IndexMap<String, AttrSpec>,
    excluded: Vec<usize>,
    inclusive: bool,
}

struct SchemaInner {
    nodes: Vec<NodeTypeData>,
    marks: Vec<MarkTypeData>,
    top: usize,
    text: usize,
}

/// A compiled schema. Cloning is cheap; clones share the type tables.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("nodes", &self.inner.nodes.iter().map(|n| &n.name).collect::<Vec<_>>())
            .field("marks", &self.inner.marks.iter().map(|m| &m.name).collect::<Vec<_>>())
            .finish()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Schema {}

impl Schema {
    pub fn new(spec: SchemaSpec) -> ModelResult<Self> {
        let node_names: Vec<&String> = spec.nodes.keys().collect();
        let mark_names: Vec<&String> = spec.marks.keys().collect();
        let node_index = |name: &str| node_names.iter().position(|n| n.as_str() == name);
        let mark_index = |name: &str| mark_names.iter().position(|n| n.as_str() == name);

        let text = node_index("text")
            .ok_or_else(|| ModelError::InvalidSchema("every schema needs a 'text' type".into()))?;
        let top_name = spec
            .top_node
            .clone()
            .or_else(|| node_names.first().map(|n| n.to_string()))
            .unwrap_or_default();
        let top = node_index(&top_name).ok_or_else(|| {
            ModelError::InvalidSchema(format!("schema is missing its top node type ('{top_name}')"))
        })?;
        if top == text {
            return Err(ModelError::InvalidSchema("the top node cannot be 'text'".into()));
        }

        let resolve = |name: &str| -> Option<Vec<usize>> {
            if let Some(i) = node_index(name) {
                return Some(vec![i]);
            }
            let members: Vec<usize> = spec
                .nodes
                .values()
                .enumerate()
                .filter(|(_, s)| s.group.split_whitespace().any(|g| g == name))
                .map(|(i, _)| i)
                .collect();
            (!members.is_empty()).then_some(members)
        };

        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for (i, (name, node)) in spec.nodes.iter().enumerate() {
            let is_text = i == text;
            if is_text && !node.content.trim().is_empty() {
                return Err(ModelError::InvalidSchema("the text type cannot have content".into()));
            }
            let content = ContentMatch::parse(&node.content, &resolve)?;
            let inline_content = content
                .referenced()
                .iter()
                .any(|&t| spec.nodes[t].inline || t == text);
            let mark_set = match node.marks.as_deref() {
                Some("_") => None,
                Some(list) => Some(
                    list.split_whitespace()
                        .map(|m| mark_index(m).ok_or_else(|| ModelError::UnknownMarkType(m.to_string())))
                        .collect::<ModelResult<Vec<_>>>()?,
                ),
                None if inline_content => None,
                None => Some(Vec::new()),
            };
            nodes.push(NodeTypeData {
                name: name.clone(),
                groups: node.group.split_whitespace().map(str::to_string).collect(),
                inline: node.inline || is_text,
                atom: node.atom,
                is_text,
                attrs: node.attrs.clone(),
                content,
                inline_content,
                mark_set,
            });
        }

        let mut marks = Vec::with_capacity(spec.marks.len());
        for (i, (name, mark)) in spec.marks.iter().enumerate() {
            let excluded = match mark.excludes.as_deref() {
                None => vec![i],
                Some("_") => (0..spec.marks.len()).collect(),
                Some(list) => list
                    .split_whitespace()
                    .map(|m| mark_index(m).ok_or_else(|| ModelError::UnknownMarkType(m.to_string())))
                    .collect::<ModelResult<Vec<_>>>()?,
            };
            marks.push(MarkTypeData {
                name: name.clone(),
                attrs: mark.attrs.clone(),
                excluded,
                inclusive: mark.inclusive.unwrap_or(true),
            });
        }

        Ok(Self {
            inner: Arc::new(SchemaInner {
                nodes,
                marks,
                top,
                text,
            }),
        })
    }

    /// A small general purpose schema: paragraphs, headings, blockquotes,
    /// code blocks, rules, images and hard breaks, with emphasis, strong,
    /// code and link marks.
    pub fn basic() -> Self {
        let spec = SchemaSpec::new()
            .node("doc", NodeSpec::new("block+"))
            .node("paragraph", NodeSpec::new("inline*").group("block"))
            .node("blockquote", NodeSpec::new("block+").group("block"))
            .node("horizontal_rule", NodeSpec::new("").group("block"))
            .node(
                "heading",
                NodeSpec::new("inline*").group("block").attr("level", json!(1)),
            )
            .node(
                "code_block",
                NodeSpec::new("text*").group("block").marks("").attr("language", Value::Null),
            )
            .node("text", NodeSpec::new("").group("inline"))
            .node(
                "image",
                NodeSpec::new("")
                    .group("inline")
                    .inline()
                    .required_attr("src")
                    .attr("alt", Value::Null)
                    .attr("title", Value::Null),
            )
            .node("hard_break", NodeSpec::new("").group("inline").inline())
            .mark(
                "link",
                MarkSpec::new()
                    .required_attr("href")
                    .attr("title", Value::Null)
                    .inclusive(false),
            )
            .mark("em", MarkSpec::new())
            .mark("strong", MarkSpec::new())
            .mark("code", MarkSpec::new());
        match Self::new(spec) {
            Ok(schema) => schema,
            Err(err) => unreachable!("basic schema is well formed: {err}"),
        }
    }

    pub fn node_type(&self, name: &str) -> Option<NodeType> {
        self.inner
            .nodes
            .iter()
            .position(|n| n.name == name)
            .map(|index| NodeType {
                schema: self.clone(),
                index,
            })
    }

    pub fn mark_type(&self, name: &str) -> Option<MarkType> {
        self.inner
            .marks
            .iter()
            .position(|m| m.name == name)
            .map(|index| MarkType {
                schema: self.clone(),
                index,
            })
    }

    pub fn node_types(&self) -> impl Iterator<Item = NodeType> + '_ {
        (0..self.inner.nodes.len()).map(|index| NodeType {
            schema: self.clone(),
            index,
        })
    }

    pub fn mark_types(&self) -> impl Iterator<Item = MarkType> + '_ {
        (0..self.inner.marks.len()).map(|index| MarkType {
            schema: self.clone(),
            index,
        })
    }

    pub fn top_node_type(&self) -> NodeType {
        NodeType {
            schema: self.clone(),
            index: self.inner.top,
        }
    }

    pub fn text_type(&self) -> NodeType {
        NodeType {
            schema: self.clone(),
            index: self.inner.text,
        }
    }

    pub(crate) fn expect_node_type(&self, name: &str) -> ModelResult<NodeType> {
        self.node_type(name)
            .ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))
    }

    pub(crate) fn expect_mark_type(&self, name: &str) -> ModelResult<MarkType> {
        self.mark_type(name)
            .ok_or_else(|| ModelError::UnknownMarkType(name.to_string()))
    }

    /// Create a node of the named type. Content is not checked; use
    /// [`Node::check`] for that.
    pub fn node(
        &self,
        name: &str,
        attrs: Option<&Attrs>,
        content: impl Into<Fragment>,
        marks: Vec<Mark>,
    ) -> ModelResult<Node> {
        self.expect_node_type(name)?.create(attrs, content, marks)
    }

    /// Create a text node.
    pub fn text(&self, text: &str, marks: Vec<Mark>) -> ModelResult<Node> {
        if text.is_empty() {
            return Err(ModelError::EmptyText);
        }
        Ok(Node::new_text(self.text_type(), text.to_string(), Mark::set_from(marks)))
    }

    /// Create a mark of the named type.
    pub fn mark(&self, name: &str, attrs: Option<&Attrs>) -> ModelResult<Mark> {
        self.expect_mark_type(name)?.create(attrs)
    }
}

fn compute_attrs(
    owner: &str,
    specs: &IndexMap<String, AttrSpec>,
    given: Option<&Attrs>,
) -> ModelResult<Attrs> {
    let mut built = Map::new();
    for (name, spec) in specs {
        let value = match given.and_then(|g| g.get(name)) {
            Some(v) => v.clone(),
            None => spec.default.clone().ok_or_else(|| ModelError::MissingAttr {
                owner: owner.to_string(),
                attr: name.clone(),
            })?,
        };
        built.insert(name.clone(), value);
    }
    Ok(built)
}

/// Handle to a node type of a schema.
#[derive(Clone)]
pub struct NodeType {
    schema: Schema,
    index: usize,
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.schema == other.schema
    }
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.name())
    }
}

impl NodeType {
    fn data(&self) -> &NodeTypeData {
        &self.schema.inner.nodes[self.index]
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn groups(&self) -> &[String] {
        &self.data().groups
    }

    pub fn is_text(&self) -> bool {
        self.data().is_text
    }

    pub fn is_inline(&self) -> bool {
        self.data().inline
    }

    pub fn is_block(&self) -> bool {
        !self.data().inline
    }

    pub fn is_leaf(&self) -> bool {
        self.data().content.is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.data().atom
    }

    pub fn inline_content(&self) -> bool {
        self.data().inline_content
    }

    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.inline_content()
    }

    /// Whether any attribute lacks a default.
    pub fn has_required_attrs(&self) -> bool {
        self.data().attrs.values().any(|a| a.default.is_none())
    }

    /// Fill in defaults for attributes not given, dropping undeclared ones.
    pub fn compute_attrs(&self, given: Option<&Attrs>) -> ModelResult<Attrs> {
        compute_attrs(self.name(), &self.data().attrs, given)
    }

    pub fn declares_attrs(&self) -> bool {
        !self.data().attrs.is_empty()
    }

    /// Create a node of this type without checking its content.
    pub fn create(
        &self,
        attrs: Option<&Attrs>,
        content: impl Into<Fragment>,
        marks: Vec<Mark>,
    ) -> ModelResult<Node> {
        if self.is_text() {
            return Err(ModelError::InvalidSchema(
                "text nodes are created with Schema::text".into(),
            ));
        }
        let attrs = self.compute_attrs(attrs)?;
        Ok(Node::new_element(self.clone(), attrs, content.into(), Mark::set_from(marks)))
    }

    /// Like [`NodeType::create`], but fails when the content is invalid.
    pub fn create_checked(
        &self,
        attrs: Option<&Attrs>,
        content: impl Into<Fragment>,
        marks: Vec<Mark>,
    ) -> ModelResult<Node> {
        let content = content.into();
        self.check_content(&content)?;
        self.create(attrs, content, marks)
    }

    /// Whether `content` matches the content expression and every child's
    /// marks are allowed here.
    pub fn valid_content(&self, content: &Fragment) -> bool {
        self.data()
            .content
            .matches(content.iter().map(|c| c.node_type().index))
            && content.iter().all(|c| self.allows_marks(c.marks()))
    }

    pub fn check_content(&self, content: &Fragment) -> ModelResult<()> {
        if self.valid_content(content) {
            Ok(())
        } else {
            Err(ModelError::InvalidContent(self.name().to_string()))
        }
    }

    /// Whether this type's content may start with a node of `other`'s
    /// first content.
    pub fn compatible_content(&self, other: &NodeType) -> bool {
        if self == other {
            return true;
        }
        let mine = self.data().content.first_types();
        other
            .data()
            .content
            .first_types()
            .iter()
            .any(|t| mine.contains(t))
    }

    pub fn allows_mark_type(&self, mark_type: &MarkType) -> bool {
        match &self.data().mark_set {
            None => true,
            Some(set) => set.contains(&mark_type.index),
        }
    }

    pub fn allows_marks(&self, marks: &[Mark]) -> bool {
        marks.iter().all(|m| self.allows_mark_type(m.mark_type()))
    }
}

/// Handle to a mark type of a schema.
#[derive(Clone)]
pub struct MarkType {
    schema: Schema,
    index: usize,
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.schema == other.schema
    }
}

impl Eq for MarkType {}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkType({})", self.name())
    }
}

impl MarkType {
    fn data(&self) -> &MarkTypeData {
        &self.schema.inner.marks[self.index]
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    /// Position in the schema's mark order; mark sets are sorted by it.
    pub fn rank(&self) -> usize {
        self.index
    }

    pub fn is_inclusive(&self) -> bool {
        self.data().inclusive
    }

    pub fn excludes(&self, other: &MarkType) -> bool {
        self.schema == other.schema && self.data().excluded.contains(&other.index)
    }

    pub fn create(&self, attrs: Option<&Attrs>) -> ModelResult<Mark> {
        let attrs = compute_attrs(self.name(), &self.data().attrs, attrs)?;
        Ok(Mark::new(self.clone(), attrs))
    }

    /// Remove every mark of this type from `set`.
    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|m| m.mark_type() != self).cloned().collect()
    }

    /// The first mark of this type in `set`.
    pub fn is_in_set<'a>(&self, set: &'a [Mark]) -> Option<&'a Mark> {
        set.iter().find(|m| m.mark_type() == self)
    }
}
