//! Projection of a token tree into display nodes.
//!
//! Root nodes come in a fixed order: the strict indicator, the Imports,
//! Variables, Functions, Rules and Items sections, then interfaces, traits,
//! classes, media blocks, selector nodes and the top-level values of a data
//! file. Exactly one root node starts expanded: the first eligible one.

pub mod labels;

use serde::Serialize;

use crate::config::Config;
use crate::tokens::{
    DataKind, DataToken, EntityKind, EntityToken, Position, TokenTree, Visibility,
};

pub use labels::{compare_members, sorted, Markers};

/// What a node displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Strict,
    Section,
    Interface,
    Trait,
    Class,
    Media,
    Selector,
    Import,
    Variable,
    Constant,
    Property,
    Accessor,
    UsedTrait,
    Method,
    Function,
    Rule,
    Item,
    Declaration,
    Object,
    Array,
    Value,
}

impl From<EntityKind> for NodeKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Interface => NodeKind::Interface,
            EntityKind::Trait => NodeKind::Trait,
            EntityKind::Class => NodeKind::Class,
        }
    }
}

impl From<DataKind> for NodeKind {
    fn from(kind: DataKind) -> Self {
        match kind {
            DataKind::Object => NodeKind::Object,
            DataKind::Array => NodeKind::Array,
            DataKind::Value => NodeKind::Value,
        }
    }
}

/// Initial expansion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collapse {
    /// A leaf.
    None,
    Collapsed,
    Expanded,
}

/// Root sections grouping flat token lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Imports,
    Variables,
    Functions,
    Rules,
    Items,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::Imports => "Imports",
            Section::Variables => "Variables",
            Section::Functions => "Functions",
            Section::Rules => "Rules",
            Section::Items => "Items",
        }
    }

    /// Auxiliary sections never start expanded.
    fn expandable_by_default(&self) -> bool {
        !matches!(self, Section::Imports | Section::Variables)
    }
}

/// Where a node's children come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeTarget {
    Section(Section),
    Entity { kind: EntityKind, index: usize },
    Media(String),
    Selector { media: Option<String>, selector: String },
    /// Child indexes from the data root.
    Data(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub label: String,
    pub kind: NodeKind,
    pub collapse: Collapse,
    /// Reveal/select range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub visibility: Visibility,
    pub is_static: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeTarget>,
}

impl OutlineNode {
    fn leaf(label: String, kind: NodeKind, position: Option<Position>) -> Self {
        Self {
            label,
            kind,
            collapse: Collapse::None,
            position,
            visibility: Visibility::Public,
            is_static: false,
            target: None,
        }
    }

    fn branch(label: String, kind: NodeKind, position: Option<Position>, target: NodeTarget) -> Self {
        Self {
            collapse: Collapse::Collapsed,
            target: Some(target),
            ..Self::leaf(label, kind, position)
        }
    }

    fn member(mut self, visibility: Visibility, is_static: bool) -> Self {
        self.visibility = visibility;
        self.is_static = is_static;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.target.is_none()
    }
}

/// Projects token trees into outline nodes.
#[derive(Debug, Clone)]
pub struct Projector {
    markers: Markers,
}

impl Projector {
    pub fn new(config: &Config) -> Self {
        Self {
            markers: Markers {
                readonly: config.readonly_character.clone(),
                is_abstract: config.abstract_character.clone(),
            },
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn project_root(&self, tree: &TokenTree) -> Vec<OutlineNode> {
        let mut nodes = Vec::new();
        let mut expanded = false;
        let mut push = |mut node: OutlineNode, eligible: bool| {
            if eligible && !expanded {
                node.collapse = Collapse::Expanded;
                expanded = true;
            }
            nodes.push(node);
        };

        if tree.strict == Some(true) {
            push(
                OutlineNode::leaf("Strict: Yes".to_string(), NodeKind::Strict, None),
                false,
            );
        }

        let sections = [
            (Section::Imports, tree.imports.is_empty()),
            (Section::Variables, tree.variables.is_empty()),
            (Section::Functions, tree.functions.is_empty()),
            (Section::Rules, tree.rules.is_empty()),
            (Section::Items, tree.items.is_empty()),
        ];
        for (section, empty) in sections {
            if empty {
                continue;
            }
            push(
                OutlineNode::branch(
                    section.title().to_string(),
                    NodeKind::Section,
                    None,
                    NodeTarget::Section(section),
                ),
                section.expandable_by_default(),
            );
        }

        for kind in [EntityKind::Interface, EntityKind::Trait, EntityKind::Class] {
            for (index, entity) in tree.entities_of(kind).iter().enumerate() {
                push(
                    OutlineNode::branch(
                        labels::entity(entity, kind, &self.markers),
                        kind.into(),
                        entity.position,
                        NodeTarget::Entity { kind, index },
                    )
                    .member(entity.visibility, false),
                    true,
                );
            }
        }

        for condition in tree.media.keys() {
            push(
                OutlineNode::branch(
                    format!("@media {}", condition),
                    NodeKind::Media,
                    None,
                    NodeTarget::Media(condition.clone()),
                ),
                true,
            );
        }

        for (selector, declarations) in &tree.nodes {
            push(
                self.selector_node(None, selector, declarations.first().and_then(|d| d.position)),
                true,
            );
        }

        if let Some(root) = &tree.data {
            if root.kind.is_container() {
                for node in self.data_nodes(root, &[]) {
                    let eligible = !node.is_leaf();
                    push(node, eligible);
                }
            } else {
                push(
                    OutlineNode::leaf(
                        labels::data(root, DataKind::Value),
                        NodeKind::Value,
                        root.position,
                    ),
                    false,
                );
            }
        }

        nodes
    }

    /// Children of an expandable node; leaves have none.
    pub fn project_children(&self, tree: &TokenTree, node: &OutlineNode) -> Vec<OutlineNode> {
        match &node.target {
            None => Vec::new(),
            Some(NodeTarget::Section(section)) => self.section(tree, *section),
            Some(NodeTarget::Entity { kind, index }) => tree
                .entities_of(*kind)
                .get(*index)
                .map(|entity| self.entity_members(entity, *kind))
                .unwrap_or_default(),
            Some(NodeTarget::Media(condition)) => tree
                .media
                .get(condition)
                .map(|selectors| {
                    selectors
                        .iter()
                        .map(|(selector, declarations)| {
                            self.selector_node(
                                Some(condition.clone()),
                                selector,
                                declarations.first().and_then(|d| d.position),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Some(NodeTarget::Selector { media, selector }) => {
                let map = match media {
                    Some(condition) => tree.media.get(condition),
                    None => Some(&tree.nodes),
                };
                map.and_then(|m| m.get(selector))
                    .map(|declarations| {
                        declarations
                            .iter()
                            .map(|d| {
                                OutlineNode::leaf(
                                    labels::declaration(d),
                                    NodeKind::Declaration,
                                    d.position,
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            Some(NodeTarget::Data(path)) => tree
                .data
                .as_ref()
                .and_then(|root| root.descendant(path))
                .map(|parent| self.data_nodes(parent, path))
                .unwrap_or_default(),
        }
    }

    /// Values of a data container in source order; nested containers
    /// expand, scalars jump to their value.
    fn data_nodes(&self, parent: &DataToken, path: &[usize]) -> Vec<OutlineNode> {
        parent
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let label = labels::data(child, parent.kind);
                if child.kind.is_container() {
                    let mut target = path.to_vec();
                    target.push(index);
                    OutlineNode::branch(
                        label,
                        child.kind.into(),
                        child.position,
                        NodeTarget::Data(target),
                    )
                } else {
                    OutlineNode::leaf(label, NodeKind::Value, child.position)
                }
            })
            .collect()
    }

    fn selector_node(
        &self,
        media: Option<String>,
        selector: &str,
        position: Option<Position>,
    ) -> OutlineNode {
        OutlineNode::branch(
            selector.to_string(),
            NodeKind::Selector,
            position,
            NodeTarget::Selector {
                media,
                selector: selector.to_string(),
            },
        )
    }

    fn section(&self, tree: &TokenTree, section: Section) -> Vec<OutlineNode> {
        match section {
            Section::Imports => sorted(&tree.imports)
                .into_iter()
                .map(|i| OutlineNode::leaf(labels::import(i), NodeKind::Import, i.position))
                .collect(),
            Section::Variables => self.variables(&tree.variables, NodeKind::Variable),
            Section::Rules => self.variables(&tree.rules, NodeKind::Rule),
            Section::Items => self.variables(&tree.items, NodeKind::Item),
            Section::Functions => sorted(&tree.functions)
                .into_iter()
                .map(|f| {
                    OutlineNode::leaf(
                        labels::method(f, &self.markers),
                        NodeKind::Function,
                        f.position,
                    )
                    .member(f.visibility, f.is_static)
                })
                .collect(),
        }
    }

    fn variables(
        &self,
        variables: &[crate::tokens::VariableToken],
        kind: NodeKind,
    ) -> Vec<OutlineNode> {
        sorted(variables)
            .into_iter()
            .map(|v| {
                OutlineNode::leaf(labels::variable(v), kind, v.position)
                    .member(v.visibility, v.is_static)
            })
            .collect()
    }

    /// Constants, accessors, properties, used traits, then methods.
    fn entity_members(&self, entity: &EntityToken, kind: EntityKind) -> Vec<OutlineNode> {
        let mut nodes = self.variables(&entity.constants, NodeKind::Constant);

        if kind == EntityKind::Class {
            nodes.extend(sorted(&entity.accessors).into_iter().map(|a| {
                OutlineNode::leaf(labels::accessor(a), NodeKind::Accessor, a.position)
                    .member(a.visibility, a.is_static)
            }));
        }

        nodes.extend(sorted(&entity.properties).into_iter().map(|p| {
            OutlineNode::leaf(
                labels::property(p, &self.markers),
                NodeKind::Property,
                p.position,
            )
            .member(p.visibility, p.is_static)
        }));

        if kind != EntityKind::Interface {
            nodes.extend(sorted(&entity.traits).into_iter().map(|t| {
                OutlineNode::leaf(t.name.clone(), NodeKind::UsedTrait, t.position)
            }));
        }

        nodes.extend(sorted(&entity.methods).into_iter().map(|m| {
            OutlineNode::leaf(
                labels::method(m, &self.markers),
                NodeKind::Method,
                m.position,
            )
            .member(m.visibility, m.is_static)
        }));

        nodes
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
