//! Display labels and member ordering.

use std::cmp::Ordering;

use crate::tokens::{
    AccessorToken, DataKind, DataToken, EntityKind, EntityToken, ImportToken, Member, MethodToken,
    PropertyToken, VariableToken,
};

/// Marker strings prefixed to readonly and abstract members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub readonly: String,
    pub is_abstract: String,
}

impl Markers {
    fn prefix(&self, readonly: bool, is_abstract: bool) -> &str {
        if readonly {
            &self.readonly
        } else if is_abstract {
            &self.is_abstract
        } else {
            ""
        }
    }

    /// Remove a leading marker from a label.
    pub fn strip<'a>(&self, label: &'a str) -> &'a str {
        label
            .strip_prefix(self.readonly.as_str())
            .or_else(|| label.strip_prefix(self.is_abstract.as_str()))
            .unwrap_or(label)
    }
}

/// Visibility ascending, static before instance, then name.
pub fn compare_members<T: Member + ?Sized>(a: &T, b: &T) -> Ordering {
    a.visibility()
        .cmp(&b.visibility())
        .then_with(|| b.is_static().cmp(&a.is_static()))
        .then_with(|| a.name().cmp(b.name()))
}

/// Members in display order; the input is left untouched.
pub fn sorted<T: Member>(members: &[T]) -> Vec<&T> {
    let mut refs: Vec<&T> = members.iter().collect();
    refs.sort_by(|a, b| compare_members(*a, *b));
    refs
}

fn typed_value(name: &str, type_name: Option<&str>, value: Option<&str>) -> String {
    let mut label = name.to_string();
    if let Some(ty) = type_name.filter(|t| !t.is_empty()) {
        label.push_str(": ");
        label.push_str(ty);
    }
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        label.push_str(" = ");
        label.push_str(value);
    }
    label
}

pub fn import(token: &ImportToken) -> String {
    match token.alias.as_deref().filter(|a| !a.is_empty()) {
        Some(alias) => format!("{} as {}", token.name, alias),
        None => token.name.clone(),
    }
}

pub fn variable(token: &VariableToken) -> String {
    typed_value(
        &token.name,
        token.type_name.as_deref(),
        token.value.as_deref(),
    )
}

pub fn property(token: &PropertyToken, markers: &Markers) -> String {
    format!(
        "{}{}",
        markers.prefix(token.readonly, false),
        typed_value(
            &token.name,
            token.type_name.as_deref(),
            token.value.as_deref()
        )
    )
}

pub fn accessor(token: &AccessorToken) -> String {
    typed_value(
        &token.name,
        token.type_name.as_deref(),
        token.value.as_deref(),
    )
}

/// `type name = value`, or `name = value` when untyped.
pub fn argument(token: &VariableToken) -> String {
    let mut label = match token.type_name.as_deref().filter(|t| !t.is_empty()) {
        Some(ty) => format!("{} {}", ty, token.name),
        None => token.name.clone(),
    };
    if let Some(value) = token.value.as_deref().filter(|v| !v.is_empty()) {
        label.push_str(" = ");
        label.push_str(value);
    }
    label
}

pub fn method(token: &MethodToken, markers: &Markers) -> String {
    let arguments: Vec<String> = token.arguments.iter().map(argument).collect();
    let mut label = format!(
        "{}{}({})",
        markers.prefix(token.readonly, token.is_abstract),
        token.name,
        arguments.join(", ")
    );
    if let Some(ty) = token.type_name.as_deref().filter(|t| !t.is_empty()) {
        label.push_str(": ");
        label.push_str(ty);
    }
    label
}

pub fn entity(token: &EntityToken, kind: EntityKind, markers: &Markers) -> String {
    match kind {
        EntityKind::Class => format!(
            "{}{}",
            markers.prefix(token.readonly, token.is_abstract),
            token.name
        ),
        EntityKind::Interface | EntityKind::Trait => token.name.clone(),
    }
}

/// Style-sheet declaration; LESS variables use `=`.
pub fn declaration(token: &VariableToken) -> String {
    let value = token.value.as_deref().unwrap_or("");
    if token.name.starts_with('@') {
        format!("{} = {}", token.name, value)
    } else {
        format!("{}: {}", token.name, value)
    }
}

/// Data-file value inside `parent`: containers show their key or index,
/// object members `key: value`, array elements their bare value.
pub fn data(token: &DataToken, parent: DataKind) -> String {
    let value = token.value.as_deref().unwrap_or("");
    if token.kind.is_container() {
        return token.name.clone();
    }
    match parent {
        DataKind::Object => format!("{}: {}", token.name, value),
        DataKind::Array | DataKind::Value => value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value)
            .to_string(),
    }
}
