//! Language-agnostic token model.
//!
//! Every analyzer produces a [`TokenTree`]; the outline projector and the
//! entity generators only read it. Collections are unique by name within
//! themselves and keep source order.

mod builder;
mod naming;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use builder::TreeBuilder;
pub use naming::{qualify, split_qualified, NamespacePosition};

/// A line/column location (both 0-indexed).
///
/// Columns count characters, not bytes, so a column matches what an editor
/// shows for lines with multi-byte text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub line: usize,
    pub column: usize,
}

impl Point {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Half-open source range used for jump-to-definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

impl Position {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start: Point::new(start_line, start_column),
            end: Point::new(end_line, end_column),
        }
    }

    /// A range covering `len` columns of a single line.
    pub fn on_line(line: usize, column: usize, len: usize) -> Self {
        Self::new(line, column, line, column + len)
    }

    /// Create a position from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self::new(start.row, start.column, end.row, end.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Human-facing output is 1-indexed.
        write!(f, "{}:{}", self.start.line + 1, self.start.column + 1)
    }
}

/// Member visibility, ordered like the lexicographic order of its name.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Protected,
    #[default]
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }

    /// Parse a visibility keyword; anything else is not a visibility.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "private" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "public" => Some(Visibility::Public),
            _ => None,
        }
    }

    pub fn is_public(&self) -> bool {
        *self == Visibility::Public
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A standalone variable, a callable argument, a constant or a style-sheet
/// declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableToken {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub is_static: bool,
}

impl VariableToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

pub type ConstantToken = VariableToken;

/// A class, trait or interface field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyToken {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,
}

impl PropertyToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A mutable property with the variable's fields.
    pub fn from_variable(variable: VariableToken) -> Self {
        Self {
            name: variable.name,
            position: variable.position,
            type_name: variable.type_name,
            value: variable.value,
            visibility: variable.visibility,
            is_static: variable.is_static,
            readonly: false,
        }
    }
}

/// Direction of an accessor member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Get,
    Set,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Get => "get",
            Direction::Set => "set",
        }
    }
}

/// A getter or setter member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorToken {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,
    #[serde(rename = "abstract", default, skip_serializing_if = "is_false")]
    pub is_abstract: bool,
    pub direction: Direction,
}

/// A method, or a free function when it sits in [`TokenTree::functions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodToken {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Return type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<VariableToken>,
    #[serde(rename = "abstract", default, skip_serializing_if = "is_false")]
    pub is_abstract: bool,
    /// Final / sealed.
    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,
}

impl MethodToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Free functions are always static.
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_static: true,
            ..Default::default()
        }
    }

    /// Magic methods (`__construct`, `__toString`, ...) are never generated.
    pub fn is_magic(&self) -> bool {
        self.name.starts_with("__")
    }
}

pub type FunctionToken = MethodToken;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportToken {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ImportToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Which collection of the tree an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Interface,
    Trait,
    Class,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Interface => "interface",
            EntityKind::Trait => "trait",
            EntityKind::Class => "class",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interface, trait or class with its members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityToken {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<ConstantToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<AccessorToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodToken>,
    /// Composed traits (`use Foo;` inside a class or trait).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<EntityToken>,
    #[serde(rename = "abstract", default, skip_serializing_if = "is_false")]
    pub is_abstract: bool,
    /// Final / sealed.
    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,
}

impl EntityToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_constant(&mut self, constant: ConstantToken) {
        push_unique(&mut self.constants, constant);
    }

    pub fn add_property(&mut self, property: PropertyToken) {
        push_unique(&mut self.properties, property);
    }

    pub fn add_accessor(&mut self, accessor: AccessorToken) {
        // A getter and a setter of the same property are distinct members.
        if !self
            .accessors
            .iter()
            .any(|a| a.name == accessor.name && a.direction == accessor.direction)
        {
            self.accessors.push(accessor);
        }
    }

    pub fn add_method(&mut self, method: MethodToken) {
        push_unique(&mut self.methods, method);
    }

    pub fn add_trait(&mut self, used: EntityToken) {
        push_unique(&mut self.traits, used);
    }

    /// Name without namespace qualification.
    pub fn simple_name(&self, separator: &str) -> &str {
        split_qualified(&self.name, separator).0
    }

    pub fn has_members(&self) -> bool {
        !(self.constants.is_empty()
            && self.properties.is_empty()
            && self.accessors.is_empty()
            && self.methods.is_empty()
            && self.traits.is_empty())
    }
}

/// Anything the projector can sort as a member of a section or entity.
pub trait Member {
    fn name(&self) -> &str;
    fn visibility(&self) -> Visibility {
        Visibility::Public
    }
    fn is_static(&self) -> bool {
        false
    }
}

macro_rules! impl_member {
    ($($ty:ty),*) => {
        $(impl Member for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn visibility(&self) -> Visibility {
                self.visibility
            }
            fn is_static(&self) -> bool {
                self.is_static
            }
        })*
    };
}

impl_member!(VariableToken, PropertyToken, AccessorToken, MethodToken);

impl Member for EntityToken {
    fn name(&self) -> &str {
        &self.name
    }
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

impl Member for ImportToken {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Push unless an item with the same name already exists (first wins).
pub(crate) fn push_unique<T: Member>(items: &mut Vec<T>, item: T) -> bool {
    if items.iter().any(|existing| existing.name() == item.name()) {
        return false;
    }
    items.push(item);
    true
}

/// Style-sheet rule map: selector to declarations, in source order.
pub type SelectorMap = IndexMap<String, Vec<VariableToken>>;

/// Shape of a data-file value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Object,
    Array,
    #[default]
    Value,
}

impl DataKind {
    pub fn is_container(&self) -> bool {
        !matches!(self, DataKind::Value)
    }
}

/// One value of a data file (JSON) with its nested values.
///
/// `name` is the member key inside an object and the element index inside
/// an array. Scalars keep their source text in `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataToken {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default)]
    pub kind: DataKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DataToken>,
}

impl DataToken {
    pub fn new(name: impl Into<String>, kind: DataKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    /// The value reached by following child indexes from this one.
    pub fn descendant(&self, path: &[usize]) -> Option<&DataToken> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }
}

/// The per-document outline model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<EntityToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<EntityToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<EntityToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<VariableToken>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<VariableToken>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub nodes: SelectorMap,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub media: IndexMap<String, SelectorMap>,
    /// Root value of a data file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataToken>,
}

impl TokenTree {
    pub fn is_empty(&self) -> bool {
        self.strict.is_none()
            && self.namespace.is_none()
            && self.imports.is_empty()
            && self.interfaces.is_empty()
            && self.traits.is_empty()
            && self.classes.is_empty()
            && self.functions.is_empty()
            && self.variables.is_empty()
            && self.rules.is_empty()
            && self.items.is_empty()
            && self.nodes.is_empty()
            && self.media.is_empty()
            && self.data.is_none()
    }

    pub fn entities_of(&self, kind: EntityKind) -> &[EntityToken] {
        match kind {
            EntityKind::Interface => &self.interfaces,
            EntityKind::Trait => &self.traits,
            EntityKind::Class => &self.classes,
        }
    }

    /// All interfaces, traits and classes, in that order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityKind, &EntityToken)> {
        self.interfaces
            .iter()
            .map(|e| (EntityKind::Interface, e))
            .chain(self.traits.iter().map(|e| (EntityKind::Trait, e)))
            .chain(self.classes.iter().map(|e| (EntityKind::Class, e)))
    }

    pub fn find_entity(&self, name: &str) -> Option<(EntityKind, &EntityToken)> {
        self.entities().find(|(_, e)| e.name == name)
    }

    pub fn entity_count(&self) -> usize {
        self.interfaces.len() + self.traits.len() + self.classes.len()
    }

    /// Apply `f` to every position in the tree.
    pub fn for_each_position(&mut self, mut f: impl FnMut(&mut Position)) {
        let f: &mut dyn FnMut(&mut Position) = &mut f;
        for import in &mut self.imports {
            visit(&mut import.position, f);
        }
        for entity in self
            .interfaces
            .iter_mut()
            .chain(self.traits.iter_mut())
            .chain(self.classes.iter_mut())
        {
            visit_entity(entity, f);
        }
        for function in &mut self.functions {
            visit_method(function, f);
        }
        let flat = self
            .variables
            .iter_mut()
            .chain(self.rules.iter_mut())
            .chain(self.items.iter_mut())
            .chain(self.nodes.values_mut().flatten())
            .chain(self.media.values_mut().flat_map(|m| m.values_mut()).flatten());
        for variable in flat {
            visit(&mut variable.position, f);
        }
        if let Some(root) = &mut self.data {
            visit_data(root, f);
        }
    }
}

fn visit(position: &mut Option<Position>, f: &mut dyn FnMut(&mut Position)) {
    if let Some(position) = position {
        f(position);
    }
}

fn visit_method(method: &mut MethodToken, f: &mut dyn FnMut(&mut Position)) {
    visit(&mut method.position, f);
    for argument in &mut method.arguments {
        visit(&mut argument.position, f);
    }
}

fn visit_entity(entity: &mut EntityToken, f: &mut dyn FnMut(&mut Position)) {
    visit(&mut entity.position, f);
    for constant in &mut entity.constants {
        visit(&mut constant.position, f);
    }
    for property in &mut entity.properties {
        visit(&mut property.position, f);
    }
    for accessor in &mut entity.accessors {
        visit(&mut accessor.position, f);
    }
    for method in &mut entity.methods {
        visit_method(method, f);
    }
    for used in &mut entity.traits {
        visit_entity(used, f);
    }
}

fn visit_data(token: &mut DataToken, f: &mut dyn FnMut(&mut Position)) {
    visit(&mut token.position, f);
    for child in &mut token.children {
        visit_data(child, f);
    }
}
