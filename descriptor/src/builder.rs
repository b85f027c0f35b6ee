//! Builds a [`File`] graph from a parsed payload and links by-name type
//! references to the declarations they name.

use std::collections::HashMap;

use crate::enums;
use crate::field::{FieldNode, FieldScope, TypeRef};
use crate::file::{File, MessageId, qualify};
use crate::message;
use crate::raw::{DescriptorProto, FieldType, FileDescriptorProto};
use crate::service;

/// Wraps a whole file payload: every message tree, enum, service, extension
/// and source location, then resolves type references.
pub fn wrap_file(raw: &FileDescriptorProto) -> File {
    let mut file = File::new(
        raw.name.clone().unwrap_or_default(),
        raw.package.clone().unwrap_or_default(),
    );
    file.syntax = raw.syntax.clone();
    file.dependencies = raw.dependency.clone();
    file.options = raw.options.clone();

    for m in &raw.message_type {
        wrap_message_tree(&mut file, None, m);
    }
    for e in &raw.enum_type {
        enums::wrap(&mut file, None, e);
    }
    for s in &raw.service {
        service::wrap(&mut file, s);
    }
    for x in &raw.extension {
        crate::field::wrap(&mut file, FieldScope::FileExtension, x, &[]);
    }
    for location in raw.source_code_info.iter().flat_map(|info| &info.location) {
        file.push_location(location);
    }

    let unresolved = resolve_references(&mut file);
    tracing::debug!(
        file = %file.name,
        messages = file.messages.len(),
        enums = file.enums.len(),
        services = file.services.len(),
        unresolved,
        "wrapped file"
    );
    file
}

/// Wraps `raw` and, recursively, its nested messages and enums.
pub(crate) fn wrap_message_tree(
    file: &mut File,
    parent: Option<MessageId>,
    raw: &DescriptorProto,
) -> MessageId {
    let id = message::wrap(file, parent, raw);
    for nested in &raw.nested_type {
        wrap_message_tree(file, Some(id), nested);
    }
    for e in &raw.enum_type {
        enums::wrap(file, Some(id), e);
    }
    id
}

/// Full name to declaration, for every message and enum of one file.
pub(crate) struct TypeIndex(HashMap<String, TypeRef>);

impl TypeIndex {
    pub(crate) fn build(file: &File) -> Self {
        let mut map = HashMap::new();
        for m in file.all_messages() {
            map.entry(m.full_name())
                .or_insert(TypeRef::Message(m.id()));
        }
        for e in file.all_enums() {
            map.entry(e.full_name()).or_insert(TypeRef::Enum(e.id()));
        }
        Self(map)
    }

    /// Looks `name` up the way protoc scopes names: a leading `.` makes it
    /// absolute, otherwise the innermost enclosing scope wins, walking out
    /// to the package and finally the root.
    pub(crate) fn resolve(&self, file: &File, scope: Option<MessageId>, name: &str) -> Option<TypeRef> {
        if let Some(absolute) = name.strip_prefix('.') {
            return self.0.get(absolute).cloned();
        }
        let mut scope = match scope.and_then(|id| file.message(id)) {
            Some(m) => m.full_name(),
            None => file.package().to_string(),
        };
        loop {
            if let Some(found) = self.0.get(&qualify(Some(&scope), name)) {
                return Some(found.clone());
            }
            if scope.is_empty() {
                return None;
            }
            match scope.rfind('.') {
                Some(dot) => scope.truncate(dot),
                None => scope.clear(),
            }
        }
    }
}

/// The kind and link a field should carry once its type name is resolved,
/// or `None` when there is nothing to link. A missing kind is taken from
/// the target; a kind that cannot refer to the target leaves it unlinked.
pub(crate) fn resolve_field(
    file: &File,
    index: &TypeIndex,
    node: &FieldNode,
) -> Option<(FieldType, TypeRef)> {
    if node.kind.is_some_and(FieldType::is_scalar) {
        return None;
    }
    let TypeRef::Named(name) = &node.target else {
        return None;
    };
    match (index.resolve(file, node.parent, name)?, node.kind) {
        (TypeRef::Enum(id), None | Some(FieldType::Enum)) => {
            Some((FieldType::Enum, TypeRef::Enum(id)))
        }
        (TypeRef::Message(id), None) => Some((FieldType::Message, TypeRef::Message(id))),
        (TypeRef::Message(id), Some(kind @ (FieldType::Message | FieldType::Group))) => {
            Some((kind, TypeRef::Message(id)))
        }
        _ => None,
    }
}

/// Links every field and method type name that names a message or enum of
/// `file`. Returns the number of references left unresolved.
pub fn resolve_references(file: &mut File) -> usize {
    let index = TypeIndex::build(file);
    let mut unresolved = 0;

    for i in 0..file.fields.len() {
        if let Some((kind, target)) = resolve_field(file, &index, &file.fields[i]) {
            let node = &mut file.fields[i];
            node.kind = Some(kind);
            node.target = target;
            continue;
        }
        let node = &file.fields[i];
        if let TypeRef::Named(name) = &node.target {
            if !node.kind.is_some_and(FieldType::is_scalar) {
                tracing::debug!(field = %node.name, type_name = %name, "unresolved field type");
                unresolved += 1;
            }
        }
    }

    for i in 0..file.methods.len() {
        let input = link_message(file, &index, &file.methods[i].input);
        let output = link_message(file, &index, &file.methods[i].output);
        let method = &mut file.methods[i];
        for (slot, linked) in [(&mut method.input, input), (&mut method.output, output)] {
            match linked {
                Some(id) => *slot = TypeRef::Message(id),
                None => {
                    if let TypeRef::Named(name) = slot {
                        tracing::debug!(method = %method.name, type_name = %name, "unresolved method type");
                        unresolved += 1;
                    }
                }
            }
        }
    }
    unresolved
}

fn link_message(file: &File, index: &TypeIndex, target: &TypeRef) -> Option<MessageId> {
    let TypeRef::Named(name) = target else {
        return None;
    };
    match index.resolve(file, None, name)? {
        TypeRef::Message(id) => Some(id),
        _ => None,
    }
}
