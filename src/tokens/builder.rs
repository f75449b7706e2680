//! Accumulates tokens during one analysis pass and assembles the tree.

use indexmap::IndexMap;

use super::{
    push_unique, DataToken, EntityKind, EntityToken, FunctionToken, ImportToken, SelectorMap,
    TokenTree, VariableToken,
};

/// Collects tokens in source order; [`TreeBuilder::build`] assigns every
/// collection of the resulting [`TokenTree`] once.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    strict: Option<bool>,
    namespace: Option<String>,
    imports: Vec<ImportToken>,
    interfaces: Vec<EntityToken>,
    traits: Vec<EntityToken>,
    classes: Vec<EntityToken>,
    functions: Vec<FunctionToken>,
    variables: Vec<VariableToken>,
    rules: Vec<VariableToken>,
    items: Vec<VariableToken>,
    nodes: SelectorMap,
    media: IndexMap<String, SelectorMap>,
    data: Option<DataToken>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(&mut self, strict: bool) {
        self.strict = Some(strict);
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        if !namespace.is_empty() {
            self.namespace = Some(namespace);
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn import(&mut self, import: ImportToken) {
        push_unique(&mut self.imports, import);
    }

    /// Whether `name` was imported, either as-is or under an alias.
    pub fn is_imported(&self, name: &str) -> bool {
        self.imports.iter().any(|i| {
            i.alias.as_deref() == Some(name)
                || i.name == name
                || i.name.rsplit(|c: char| c == '\\' || c == '.').next() == Some(name)
        })
    }

    pub fn entity(&mut self, kind: EntityKind, entity: EntityToken) {
        let list = match kind {
            EntityKind::Interface => &mut self.interfaces,
            EntityKind::Trait => &mut self.traits,
            EntityKind::Class => &mut self.classes,
        };
        push_unique(list, entity);
    }

    pub fn class(&mut self, entity: EntityToken) {
        self.entity(EntityKind::Class, entity);
    }

    pub fn interface(&mut self, entity: EntityToken) {
        self.entity(EntityKind::Interface, entity);
    }

    pub fn add_trait(&mut self, entity: EntityToken) {
        self.entity(EntityKind::Trait, entity);
    }

    /// The most recently opened class.
    pub fn last_class_mut(&mut self) -> Option<&mut EntityToken> {
        self.classes.last_mut()
    }

    /// Find a class or interface by qualified or simple name.
    pub fn find_entity_mut(&mut self, name: &str, separator: &str) -> Option<&mut EntityToken> {
        self.classes
            .iter_mut()
            .chain(self.interfaces.iter_mut())
            .find(|e| e.name == name || e.simple_name(separator) == name)
    }

    pub fn function(&mut self, function: FunctionToken) {
        push_unique(&mut self.functions, function);
    }

    pub fn variable(&mut self, variable: VariableToken) {
        push_unique(&mut self.variables, variable);
    }

    pub fn rule(&mut self, rule: VariableToken) {
        push_unique(&mut self.rules, rule);
    }

    pub fn item(&mut self, item: VariableToken) {
        push_unique(&mut self.items, item);
    }

    /// Append declarations to a selector; repeated selectors merge.
    pub fn declarations(&mut self, selector: impl Into<String>, declarations: Vec<VariableToken>) {
        self.nodes
            .entry(selector.into())
            .or_default()
            .extend(declarations);
    }

    /// Append declarations to a selector inside a media block.
    pub fn media_declarations(
        &mut self,
        condition: impl Into<String>,
        selector: impl Into<String>,
        declarations: Vec<VariableToken>,
    ) {
        self.media
            .entry(condition.into())
            .or_default()
            .entry(selector.into())
            .or_default()
            .extend(declarations);
    }

    /// Root value of a data file; a document has one.
    pub fn data(&mut self, root: DataToken) {
        self.data = Some(root);
    }

    pub fn build(self) -> TokenTree {
        TokenTree {
            strict: self.strict,
            namespace: self.namespace,
            imports: self.imports,
            interfaces: self.interfaces,
            traits: self.traits,
            classes: self.classes,
            functions: self.functions,
            variables: self.variables,
            rules: self.rules,
            items: self.items,
            nodes: self.nodes,
            media: self.media,
            data: self.data,
        }
    }
}
