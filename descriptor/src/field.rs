use crate::builder::{self, TypeIndex};
use crate::enums::Enum;
use crate::file::{
    Declaration, EnumId, FieldId, File, MessageId, OneofId, declaration, non_empty, qualify,
};
use crate::message::{Message, Oneof};
use crate::options::Options;
use crate::path::{SourcePath, slot};
use crate::raw::{FieldDescriptorProto, FieldType, Label};

/// What a field's or method's type name points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeRef {
    Unset,
    /// A name not (yet) linked to a declaration of this file.
    Named(String),
    Enum(EnumId),
    Message(MessageId),
}

impl TypeRef {
    pub(crate) fn from_name(name: Option<&String>) -> Self {
        name.map_or(TypeRef::Unset, |n| TypeRef::Named(n.clone()))
    }

    /// The name written to the payload. Linked targets always report their
    /// current full name.
    pub(crate) fn name(&self, file: &File) -> Option<String> {
        match self {
            TypeRef::Unset => None,
            TypeRef::Named(name) => Some(name.clone()),
            TypeRef::Enum(id) => file.enum_type(*id).map(|e| e.full_name()),
            TypeRef::Message(id) => file.message(*id).map(|m| m.full_name()),
        }
    }

    fn unlinked(&self, file: &File) -> TypeRef {
        match self {
            TypeRef::Enum(_) | TypeRef::Message(_) => Self::from_name(self.name(file).as_ref()),
            other => other.clone(),
        }
    }
}

/// Maps a friendly type name to its wire type. Names outside the table are
/// taken as references to a message declared elsewhere.
pub fn friendly_type(name: &str) -> FieldType {
    match name {
        "Double" | "Float64" => FieldType::Double,
        "Float" | "Float32" => FieldType::Float,
        "Int64" | "Int" => FieldType::Int64,
        "UInt64" | "UInt" => FieldType::Uint64,
        "Int8" | "Int16" | "Int32" => FieldType::Int32,
        "UInt8" | "UInt16" | "UInt32" => FieldType::Uint32,
        "Bool" => FieldType::Bool,
        "String" => FieldType::String,
        "Bytes" => FieldType::Bytes,
        "Enum" => FieldType::Enum,
        _ => FieldType::Message,
    }
}

/// Schema spelling of a friendly scalar name (`"Int32"` gives `"int32"`);
/// any other name is returned unchanged.
pub fn friendly_type_name(name: &str) -> &str {
    friendly_type(name).scalar_name().unwrap_or(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldScope {
    Message(MessageId),
    MessageExtension(MessageId),
    FileExtension,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldNode {
    pub(crate) name: String,
    pub(crate) number: i32,
    pub(crate) label: Option<Label>,
    pub(crate) kind: Option<FieldType>,
    pub(crate) target: TypeRef,
    pub(crate) parent: Option<MessageId>,
    pub(crate) extendee: Option<String>,
    pub(crate) oneof: Option<OneofId>,
    pub(crate) default_value: Option<String>,
    pub(crate) json_name: Option<String>,
    pub(crate) index: usize,
    pub(crate) path: SourcePath,
    pub(crate) options: Option<Options>,
}

impl FieldNode {
    pub(crate) fn named(name: String) -> Self {
        Self {
            name,
            number: 0,
            label: None,
            kind: None,
            target: TypeRef::Unset,
            parent: None,
            extendee: None,
            oneof: None,
            default_value: None,
            json_name: None,
            index: 0,
            path: SourcePath::default(),
            options: None,
        }
    }
}

pub(crate) fn attach(file: &mut File, scope: FieldScope, mut node: FieldNode) -> FieldId {
    let id = FieldId::new(file.token, file.fields.len());
    match scope {
        FieldScope::Message(parent) => {
            let parent_node = &mut file.messages[parent.index];
            node.parent = Some(parent);
            node.index = parent_node.fields.len();
            node.path = parent_node.path.child(slot::MESSAGE_FIELD, node.index);
            parent_node.fields.push(id);
        }
        FieldScope::MessageExtension(parent) => {
            let parent_node = &mut file.messages[parent.index];
            node.parent = Some(parent);
            node.index = parent_node.extensions.len();
            node.path = parent_node.path.child(slot::MESSAGE_EXTENSION, node.index);
            parent_node.extensions.push(id);
        }
        FieldScope::FileExtension => {
            node.parent = None;
            node.index = file.top_extensions.len();
            node.path = SourcePath::root(slot::FILE_EXTENSION, node.index);
            file.top_extensions.push(id);
        }
    }
    file.fields.push(node);
    id
}

/// Wraps a field payload. `oneofs` are the oneofs of the enclosing message,
/// in declaration order, so `oneof_index` can be turned into a link.
pub(crate) fn wrap(
    file: &mut File,
    scope: FieldScope,
    raw: &FieldDescriptorProto,
    oneofs: &[OneofId],
) -> FieldId {
    let oneof = raw
        .oneof_index
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| oneofs.get(i))
        .copied();
    let node = FieldNode {
        number: raw.number.unwrap_or_default(),
        label: raw.label,
        kind: raw.r#type,
        target: TypeRef::from_name(raw.type_name.as_ref()),
        extendee: raw.extendee.clone(),
        oneof,
        default_value: raw.default_value.clone(),
        json_name: raw.json_name.clone(),
        options: raw.options.clone(),
        ..FieldNode::named(raw.name.clone().unwrap_or_default())
    };
    attach(file, scope, node)
}

declaration! {
    /// A message field, or an extension when it names an extendee.
    /// File-level extensions have no parent.
    Field, FieldMut, FieldId, FieldNode, fields
}

impl<'a> Field<'a> {
    pub fn full_name(&self) -> String {
        match self.parent() {
            Some(parent) => qualify(Some(&parent.full_name()), self.name()),
            None => qualify(Some(self.file.package()), self.name()),
        }
    }

    pub fn parent(&self) -> Option<Message<'a>> {
        self.node().parent.map(|id| Message::new(self.file, id))
    }

    pub fn oneof(&self) -> Option<Oneof<'a>> {
        self.node().oneof.map(|id| Oneof::new(self.file, id))
    }

    pub fn number(&self) -> i32 {
        self.node().number
    }

    pub fn label(&self) -> Option<Label> {
        self.node().label
    }

    pub fn is_repeated(&self) -> bool {
        self.node().label == Some(Label::Repeated)
    }

    pub fn field_type(&self) -> Option<FieldType> {
        self.node().kind
    }

    pub fn is_enum_type(&self) -> bool {
        self.node().kind == Some(FieldType::Enum)
    }

    pub fn is_message_type(&self) -> bool {
        self.node().kind == Some(FieldType::Message)
    }

    /// `"int32"`, `"string"`, ... for scalars; the referenced type's name
    /// otherwise, or `""` when nothing is referenced.
    pub fn type_name(&self) -> String {
        let node = self.node();
        if let Some(name) = node.kind.and_then(FieldType::scalar_name) {
            return name.to_string();
        }
        node.target.name(self.file).unwrap_or_default()
    }

    pub fn resolved_enum(&self) -> Option<Enum<'a>> {
        match self.node().target {
            TypeRef::Enum(id) => Some(Enum::new(self.file, id)),
            _ => None,
        }
    }

    pub fn resolved_message(&self) -> Option<Message<'a>> {
        match self.node().target {
            TypeRef::Message(id) => Some(Message::new(self.file, id)),
            _ => None,
        }
    }

    pub fn extendee(&self) -> Option<&'a str> {
        self.node().extendee.as_deref()
    }

    pub fn is_extension(&self) -> bool {
        self.node().extendee.is_some()
    }

    pub fn default_value(&self) -> Option<&'a str> {
        self.node().default_value.as_deref()
    }

    pub fn json_name(&self) -> Option<&'a str> {
        self.node().json_name.as_deref()
    }

    pub fn to_raw(&self) -> FieldDescriptorProto {
        let node = self.node();
        FieldDescriptorProto {
            name: non_empty(&node.name),
            number: (node.number != 0).then_some(node.number),
            label: node.label,
            r#type: node.kind,
            type_name: node.target.name(self.file),
            extendee: node.extendee.clone(),
            default_value: node.default_value.clone(),
            oneof_index: self.oneof().map(|o| o.index() as i32),
            json_name: node.json_name.clone(),
            options: node.options.clone(),
        }
    }
}

impl FieldMut<'_> {
    pub fn set_number(&mut self, number: i32) -> &mut Self {
        self.node_mut().number = number;
        self
    }

    pub fn set_label(&mut self, label: Label) -> &mut Self {
        self.node_mut().label = Some(label);
        self
    }

    pub fn set_repeated(&mut self, repeated: bool) -> &mut Self {
        self.set_label(if repeated {
            Label::Repeated
        } else {
            Label::Optional
        })
    }

    /// Sets the type from a friendly name such as `"Int32"` or `"Bytes"`.
    /// A name outside the friendly table makes this a message field that
    /// references the type of that name.
    pub fn set_type(&mut self, name: &str) -> &mut Self {
        let kind = friendly_type(name);
        self.set_field_type(kind);
        if kind == FieldType::Message {
            self.set_type_name(name);
        }
        self
    }

    /// Sets the wire type. Scalars carry no type name, so any reference is
    /// cleared; a link that no longer fits an enum or message type is
    /// dropped back to a plain name.
    pub fn set_field_type(&mut self, kind: FieldType) -> &mut Self {
        let target = {
            let node = self.node();
            match (&node.target, kind) {
                (_, k) if k.is_scalar() => TypeRef::Unset,
                (TypeRef::Enum(_), FieldType::Enum)
                | (TypeRef::Message(_), FieldType::Message | FieldType::Group) => {
                    node.target.clone()
                }
                (target, _) => target.unlinked(&*self.file),
            }
        };
        tracing::trace!(field = %self.node().name, ?kind, "set field type");
        let node = self.node_mut();
        node.kind = Some(kind);
        node.target = target;
        self.relink();
        self
    }

    /// Sets the referenced type name; friendly scalar names are stored in
    /// schema spelling. The name is linked when it names a declaration of
    /// this file.
    pub fn set_type_name(&mut self, name: &str) -> &mut Self {
        self.node_mut().target = TypeRef::Named(friendly_type_name(name).to_string());
        self.relink();
        self
    }

    /// Makes this an enum field linked to `target`. No-op for a foreign id.
    pub fn set_enum_type(&mut self, target: EnumId) -> &mut Self {
        if self.file.enum_type(target).is_some() {
            let node = self.node_mut();
            node.kind = Some(FieldType::Enum);
            node.target = TypeRef::Enum(target);
        }
        self
    }

    /// Makes this a message field linked to `target`. No-op for a foreign id.
    pub fn set_message_type(&mut self, target: MessageId) -> &mut Self {
        if self.file.message(target).is_some() {
            let node = self.node_mut();
            node.kind = Some(FieldType::Message);
            node.target = TypeRef::Message(target);
        }
        self
    }

    /// Moves the field into `oneof`, which must belong to the same message.
    pub fn set_oneof(&mut self, oneof: OneofId) -> &mut Self {
        let same_parent = self
            .file
            .oneof(oneof)
            .is_some_and(|o| Some(o.parent().id()) == self.node().parent);
        if same_parent && self.node().extendee.is_none() {
            self.node_mut().oneof = Some(oneof);
        }
        self
    }

    pub fn clear_oneof(&mut self) -> &mut Self {
        self.node_mut().oneof = None;
        self
    }

    pub fn set_default_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.node_mut().default_value = Some(value.into());
        self
    }

    pub fn set_json_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.node_mut().json_name = Some(name.into());
        self
    }

    fn relink(&mut self) {
        let index = TypeIndex::build(&*self.file);
        if let Some((kind, target)) = builder::resolve_field(&*self.file, &index, self.node()) {
            let node = self.node_mut();
            node.kind = Some(kind);
            node.target = target;
        }
    }
}
