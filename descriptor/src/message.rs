use crate::builder;
use crate::enums::{self, Enum, EnumNode};
use crate::field::{self, Field, FieldNode, FieldScope, TypeRef};
use crate::file::{
    Declaration, EnumId, FieldId, File, MessageId, OneofId, declaration, non_empty, qualify,
};
use crate::options::Options;
use crate::path::{SourcePath, slot};
use crate::raw::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FieldType, OneofDescriptorProto,
};

// ---------------- Message ----------------

#[derive(Debug, Clone)]
pub(crate) struct MessageNode {
    pub(crate) name: String,
    pub(crate) parent: Option<MessageId>,
    pub(crate) index: usize,
    pub(crate) path: SourcePath,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) extensions: Vec<FieldId>,
    pub(crate) messages: Vec<MessageId>,
    pub(crate) enums: Vec<EnumId>,
    pub(crate) oneofs: Vec<OneofId>,
    pub(crate) options: Option<Options>,
}

impl MessageNode {
    pub(crate) fn named(name: String) -> Self {
        Self {
            name,
            parent: None,
            index: 0,
            path: SourcePath::default(),
            fields: Vec::new(),
            extensions: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            oneofs: Vec::new(),
            options: None,
        }
    }
}

/// Places `node` as the last message of `parent` (or of the file) and gives it
/// its index and path.
pub(crate) fn attach(file: &mut File, parent: Option<MessageId>, mut node: MessageNode) -> MessageId {
    let id = MessageId::new(file.token, file.messages.len());
    node.parent = parent;
    match parent {
        Some(p) => {
            let parent_node = &mut file.messages[p.index];
            node.index = parent_node.messages.len();
            node.path = parent_node.path.child(slot::MESSAGE_NESTED, node.index);
            parent_node.messages.push(id);
        }
        None => {
            node.index = file.top_messages.len();
            node.path = SourcePath::root(slot::FILE_MESSAGE, node.index);
            file.top_messages.push(id);
        }
    }
    file.messages.push(node);
    id
}

/// Wraps a message payload with its oneofs, fields and extensions. Nested
/// messages and enums are left to the builder.
pub(crate) fn wrap(file: &mut File, parent: Option<MessageId>, raw: &DescriptorProto) -> MessageId {
    let mut node = MessageNode::named(raw.name.clone().unwrap_or_default());
    node.options = raw.options.clone();
    let id = attach(file, parent, node);

    let oneofs: Vec<OneofId> = raw
        .oneof_decl
        .iter()
        .map(|o| attach_oneof(file, id, o.name.clone().unwrap_or_default(), o.options.clone()))
        .collect();
    for f in &raw.field {
        field::wrap(file, FieldScope::Message(id), f, &oneofs);
    }
    for x in &raw.extension {
        field::wrap(file, FieldScope::MessageExtension(id), x, &oneofs);
    }
    id
}

declaration! {
    /// A message declaration. Top-level messages have no parent.
    Message, MessageMut, MessageId, MessageNode, messages
}

impl<'a> Message<'a> {
    /// `package.Name` at top level, `Parent.FullName.Name` when nested.
    pub fn full_name(&self) -> String {
        match self.parent() {
            Some(parent) => qualify(Some(&parent.full_name()), self.name()),
            None => qualify(Some(self.file.package()), self.name()),
        }
    }

    pub fn parent(&self) -> Option<Message<'a>> {
        self.node().parent.map(|id| Message::new(self.file, id))
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = Field<'a>> + use<'a> {
        let file = self.file;
        self.node().fields.iter().map(move |&id| Field::new(file, id))
    }

    /// Extensions declared inside this message.
    pub fn extensions(&self) -> impl ExactSizeIterator<Item = Field<'a>> + use<'a> {
        let file = self.file;
        self.node().extensions.iter().map(move |&id| Field::new(file, id))
    }

    /// Nested messages.
    pub fn messages(&self) -> impl ExactSizeIterator<Item = Message<'a>> + use<'a> {
        let file = self.file;
        self.node().messages.iter().map(move |&id| Message::new(file, id))
    }

    /// Nested enums.
    pub fn enums(&self) -> impl ExactSizeIterator<Item = Enum<'a>> + use<'a> {
        let file = self.file;
        self.node().enums.iter().map(move |&id| Enum::new(file, id))
    }

    pub fn oneofs(&self) -> impl ExactSizeIterator<Item = Oneof<'a>> + use<'a> {
        let file = self.file;
        self.node().oneofs.iter().map(move |&id| Oneof::new(file, id))
    }

    pub fn field(&self, name: &str) -> Option<Field<'a>> {
        self.fields().find(|f| f.name() == name)
    }

    pub fn field_by_number(&self, number: i32) -> Option<Field<'a>> {
        self.fields().find(|f| f.number() == number)
    }

    pub fn inner_message(&self, name: &str) -> Option<Message<'a>> {
        self.messages().find(|m| m.name() == name)
    }

    pub fn has_inner_message(&self, name: &str) -> bool {
        self.inner_message(name).is_some()
    }

    pub fn inner_enum(&self, name: &str) -> Option<Enum<'a>> {
        self.enums().find(|e| e.name() == name)
    }

    pub fn oneof(&self, name: &str) -> Option<Oneof<'a>> {
        self.oneofs().find(|o| o.name() == name)
    }

    pub fn to_raw(&self) -> DescriptorProto {
        let node = self.node();
        DescriptorProto {
            name: non_empty(&node.name),
            field: self.fields().map(|f| f.to_raw()).collect(),
            extension: self.extensions().map(|f| f.to_raw()).collect(),
            nested_type: self.messages().map(|m| m.to_raw()).collect(),
            enum_type: self.enums().map(|e| e.to_raw()).collect(),
            oneof_decl: self.oneofs().map(|o| o.to_raw()).collect(),
            options: node.options.clone(),
        }
    }
}

impl MessageMut<'_> {
    /// Appends a fresh nested message.
    pub fn add_inner_message(&mut self, name: impl Into<String>) -> MessageId {
        attach(self.file, Some(self.id), MessageNode::named(name.into()))
    }

    /// Wraps a nested message payload without descending into its own
    /// nested declarations.
    pub fn wrap_inner_message(&mut self, raw: &DescriptorProto) -> MessageId {
        let id = wrap(self.file, Some(self.id), raw);
        builder::resolve_references(self.file);
        id
    }

    /// Wraps a nested message payload and its whole subtree.
    pub fn add_inner_message_from(&mut self, raw: &DescriptorProto) -> MessageId {
        let id = builder::wrap_message_tree(self.file, Some(self.id), raw);
        builder::resolve_references(self.file);
        id
    }

    /// Appends a fresh nested enum.
    pub fn add_inner_enum(&mut self, name: impl Into<String>) -> EnumId {
        enums::attach(self.file, Some(self.id), EnumNode::named(name.into()))
    }

    pub fn wrap_inner_enum(&mut self, raw: &EnumDescriptorProto) -> EnumId {
        let id = enums::wrap(self.file, Some(self.id), raw);
        builder::resolve_references(self.file);
        id
    }

    /// Appends a fresh field with no type or number yet.
    pub fn add_field(&mut self, name: impl Into<String>) -> FieldId {
        field::attach(self.file, FieldScope::Message(self.id), FieldNode::named(name.into()))
    }

    /// Appends a field typed as, and linked to, `target`. Does nothing when
    /// `target` is not an enum of this file.
    pub fn add_enum_field(&mut self, name: impl Into<String>, target: EnumId) -> Option<FieldId> {
        self.file.enum_type(target)?;
        let mut node = FieldNode::named(name.into());
        node.kind = Some(FieldType::Enum);
        node.target = TypeRef::Enum(target);
        Some(field::attach(self.file, FieldScope::Message(self.id), node))
    }

    /// Appends a field typed as, and linked to, `target`. Does nothing when
    /// `target` is not a message of this file.
    pub fn add_message_field(
        &mut self,
        name: impl Into<String>,
        target: MessageId,
    ) -> Option<FieldId> {
        self.file.message(target)?;
        let mut node = FieldNode::named(name.into());
        node.kind = Some(FieldType::Message);
        node.target = TypeRef::Message(target);
        Some(field::attach(self.file, FieldScope::Message(self.id), node))
    }

    pub fn wrap_field(&mut self, raw: &FieldDescriptorProto) -> FieldId {
        let oneofs = self.node().oneofs.clone();
        let id = field::wrap(self.file, FieldScope::Message(self.id), raw, &oneofs);
        builder::resolve_references(self.file);
        id
    }

    /// Appends an extension of `extendee` declared in this message's scope.
    pub fn add_extension(
        &mut self,
        name: impl Into<String>,
        extendee: impl Into<String>,
    ) -> FieldId {
        let mut node = FieldNode::named(name.into());
        node.extendee = Some(extendee.into());
        field::attach(self.file, FieldScope::MessageExtension(self.id), node)
    }

    pub fn add_oneof(&mut self, name: impl Into<String>) -> OneofId {
        attach_oneof(self.file, self.id, name.into(), None)
    }
}

// ---------------- Oneof ----------------

#[derive(Debug, Clone)]
pub(crate) struct OneofNode {
    pub(crate) name: String,
    pub(crate) parent: MessageId,
    pub(crate) index: usize,
    pub(crate) path: SourcePath,
    pub(crate) options: Option<Options>,
}

fn attach_oneof(
    file: &mut File,
    parent: MessageId,
    name: String,
    options: Option<Options>,
) -> OneofId {
    let id = OneofId::new(file.token, file.oneofs.len());
    let parent_node = &mut file.messages[parent.index];
    let index = parent_node.oneofs.len();
    let path = parent_node.path.child(slot::MESSAGE_ONEOF, index);
    parent_node.oneofs.push(id);
    file.oneofs.push(OneofNode {
        name,
        parent,
        index,
        path,
        options,
    });
    id
}

declaration! {
    /// A oneof group. Membership is recorded on the fields.
    Oneof, OneofMut, OneofId, OneofNode, oneofs
}

impl<'a> Oneof<'a> {
    pub fn parent(&self) -> Message<'a> {
        Message::new(self.file, self.node().parent)
    }

    /// Fields of the parent message that belong to this oneof.
    pub fn fields(&self) -> impl Iterator<Item = Field<'a>> + use<'a> {
        let id = self.id;
        self.parent()
            .fields()
            .filter(move |f| f.oneof().is_some_and(|o| o.id() == id))
    }

    pub fn to_raw(&self) -> OneofDescriptorProto {
        let node = self.node();
        OneofDescriptorProto {
            name: non_empty(&node.name),
            options: node.options.clone(),
        }
    }
}

impl OneofMut<'_> {
    /// Appends a fresh field to the parent message as a member of this oneof.
    pub fn add_field(&mut self, name: impl Into<String>) -> FieldId {
        let mut node = FieldNode::named(name.into());
        node.oneof = Some(self.id);
        let parent = self.node().parent;
        field::attach(self.file, FieldScope::Message(parent), node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::DeclarationMut;

    #[test]
    fn nested_messages_get_paths_and_full_names() {
        let mut file = File::new("a.proto", "pkg");
        let outer = file.add_message("Outer");
        let mut outer_mut = file.message_mut(outer).unwrap();
        let first = outer_mut.add_inner_message("First");
        let second = outer_mut.add_inner_message("Second");
        let status = outer_mut.add_inner_enum("Status");

        let second = file.message(second).unwrap();
        assert_eq!(second.full_name(), "pkg.Outer.Second");
        assert_eq!(second.index(), 1);
        assert_eq!(second.path().to_string(), "4,0,3,1");
        assert_eq!(second.parent().map(|p| p.id()), Some(outer));
        assert_eq!(file.message(first).unwrap().path().to_string(), "4,0,3,0");
        assert_eq!(file.enum_type(status).unwrap().path().to_string(), "4,0,4,0");
    }

    #[test]
    fn renaming_a_parent_renames_children() {
        let mut file = File::new("a.proto", "pkg");
        let outer = file.add_message("Outer");
        let inner = file.message_mut(outer).unwrap().add_inner_message("Inner");
        file.message_mut(outer).unwrap().set_name("Renamed");
        assert_eq!(file.message(inner).unwrap().full_name(), "pkg.Renamed.Inner");
    }

    #[test]
    fn add_inner_message_keeps_payload_in_step() {
        let mut file = File::new("a.proto", "pkg");
        let outer = file.add_message("Outer");
        for n in 1..=3 {
            file.message_mut(outer)
                .unwrap()
                .add_inner_message(format!("Inner{n}"));
            let typed = file.message(outer).unwrap().messages().len();
            let raw = file.to_raw().message_type[0].nested_type.len();
            assert_eq!(typed, n);
            assert_eq!(raw, n);
        }
        let raw = file.to_raw();
        let names: Vec<_> = raw.message_type[0]
            .nested_type
            .iter()
            .map(|m| m.name.clone().unwrap())
            .collect();
        assert_eq!(names, ["Inner1", "Inner2", "Inner3"]);
    }

    #[test]
    fn lookups_by_name_and_number() {
        let mut file = File::new("a.proto", "pkg");
        let foo = file.add_message("Foo");
        let mut foo_mut = file.message_mut(foo).unwrap();
        let bar = foo_mut.add_field("bar");
        foo_mut.add_inner_message("Inner");
        file.field_mut(bar).unwrap().set_number(7);

        let foo = file.message(foo).unwrap();
        assert_eq!(foo.field("bar").map(|f| f.id()), Some(bar));
        assert_eq!(foo.field_by_number(7).map(|f| f.id()), Some(bar));
        assert!(foo.field("missing").is_none());
        assert!(foo.has_inner_message("Inner"));
        assert!(!foo.has_inner_message("Other"));
        assert_eq!(file.message_by_name("Foo"), Some(foo));
    }

    #[test]
    fn oneof_members_are_tracked_on_fields() {
        let mut file = File::new("a.proto", "pkg");
        let msg = file.add_message("Shape");
        let mut msg_mut = file.message_mut(msg).unwrap();
        msg_mut.add_field("id");
        let kind = msg_mut.add_oneof("kind");
        let circle = file.oneof_mut(kind).unwrap().add_field("circle");
        let square = file.oneof_mut(kind).unwrap().add_field("square");

        let oneof = file.oneof(kind).unwrap();
        assert_eq!(oneof.path().to_string(), "4,0,8,0");
        let members: Vec<_> = oneof.fields().map(|f| f.id()).collect();
        assert_eq!(members, [circle, square]);

        let raw = file.message(msg).unwrap().to_raw();
        assert_eq!(raw.oneof_decl.len(), 1);
        assert_eq!(raw.field[0].oneof_index, None);
        assert_eq!(raw.field[1].oneof_index, Some(0));
        assert_eq!(raw.field[2].oneof_index, Some(0));
    }

    #[test]
    fn shallow_wrap_skips_nested_declarations() {
        let raw = DescriptorProto {
            name: Some("Foo".to_string()),
            field: vec![FieldDescriptorProto {
                name: Some("bar".to_string()),
                number: Some(1),
                r#type: Some(FieldType::String),
                ..Default::default()
            }],
            nested_type: vec![DescriptorProto {
                name: Some("Inner".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut file = File::new("a.proto", "pkg");
        let shallow = file.wrap_message(&raw);
        let deep = file.add_message_from(&raw);

        let shallow = file.message(shallow).unwrap();
        assert_eq!(shallow.fields().len(), 1);
        assert_eq!(shallow.messages().len(), 0);
        let deep = file.message(deep).unwrap();
        assert_eq!(deep.messages().len(), 1);
        assert_eq!(deep.path().to_string(), "4,1");
    }

    #[test]
    fn typed_field_constructors_ignore_foreign_targets() {
        let mut other = File::new("b.proto", "other");
        let foreign = other.add_message("Elsewhere");
        let mut file = File::new("a.proto", "pkg");
        let msg = file.add_message("Foo");
        let color = file.add_enum("Color");
        let mut msg_mut = file.message_mut(msg).unwrap();
        assert!(msg_mut.add_enum_field("color", color).is_some());
        assert!(msg_mut.add_message_field("bad", foreign).is_none());
        msg_mut.set_deprecated(true);
        assert_eq!(file.message(msg).unwrap().fields().len(), 1);
        assert!(file.message(msg).unwrap().is_deprecated());
    }
}
