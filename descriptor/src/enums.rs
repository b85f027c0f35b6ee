use crate::file::{Declaration, EnumId, EnumValueId, File, MessageId, declaration, non_empty, qualify};
use crate::message::Message;
use crate::options::Options;
use crate::path::{SourcePath, slot};
use crate::raw::{EnumDescriptorProto, EnumValueDescriptorProto};

// ---------------- Enum ----------------

#[derive(Debug, Clone)]
pub(crate) struct EnumNode {
    pub(crate) name: String,
    pub(crate) parent: Option<MessageId>,
    pub(crate) index: usize,
    pub(crate) path: SourcePath,
    pub(crate) values: Vec<EnumValueId>,
    pub(crate) options: Option<Options>,
}

impl EnumNode {
    pub(crate) fn named(name: String) -> Self {
        Self {
            name,
            parent: None,
            index: 0,
            path: SourcePath::default(),
            values: Vec::new(),
            options: None,
        }
    }
}

pub(crate) fn attach(file: &mut File, parent: Option<MessageId>, mut node: EnumNode) -> EnumId {
    let id = EnumId::new(file.token, file.enums.len());
    node.parent = parent;
    match parent {
        Some(p) => {
            let parent_node = &mut file.messages[p.index];
            node.index = parent_node.enums.len();
            node.path = parent_node.path.child(slot::MESSAGE_ENUM, node.index);
            parent_node.enums.push(id);
        }
        None => {
            node.index = file.top_enums.len();
            node.path = SourcePath::root(slot::FILE_ENUM, node.index);
            file.top_enums.push(id);
        }
    }
    file.enums.push(node);
    id
}

/// Wraps an enum payload together with its values.
pub(crate) fn wrap(file: &mut File, parent: Option<MessageId>, raw: &EnumDescriptorProto) -> EnumId {
    let mut node = EnumNode::named(raw.name.clone().unwrap_or_default());
    node.options = raw.options.clone();
    let id = attach(file, parent, node);
    for value in &raw.value {
        attach_value(file, id, value);
    }
    id
}

declaration! {
    /// An enum declaration. Top-level enums have no parent.
    Enum, EnumMut, EnumId, EnumNode, enums
}

impl<'a> Enum<'a> {
    pub fn full_name(&self) -> String {
        match self.parent() {
            Some(parent) => qualify(Some(&parent.full_name()), self.name()),
            None => qualify(Some(self.file.package()), self.name()),
        }
    }

    pub fn parent(&self) -> Option<Message<'a>> {
        self.node().parent.map(|id| Message::new(self.file, id))
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = EnumValue<'a>> + use<'a> {
        let file = self.file;
        self.node().values.iter().map(move |&id| EnumValue::new(file, id))
    }

    pub fn value(&self, name: &str) -> Option<EnumValue<'a>> {
        self.values().find(|v| v.name() == name)
    }

    /// First value carrying `number`; aliases share numbers.
    pub fn value_by_number(&self, number: i32) -> Option<EnumValue<'a>> {
        self.values().find(|v| v.number() == number)
    }

    pub fn to_raw(&self) -> EnumDescriptorProto {
        let node = self.node();
        EnumDescriptorProto {
            name: non_empty(&node.name),
            value: self.values().map(|v| v.to_raw()).collect(),
            options: node.options.clone(),
        }
    }
}

impl EnumMut<'_> {
    pub fn append_value_with(&mut self, name: impl Into<String>, number: i32) -> EnumValueId {
        let raw = EnumValueDescriptorProto {
            name: Some(name.into()),
            number: Some(number),
            options: None,
        };
        attach_value(self.file, self.id, &raw)
    }

    /// Appends a value wrapped from its payload.
    pub fn append_value(&mut self, raw: &EnumValueDescriptorProto) -> EnumValueId {
        attach_value(self.file, self.id, raw)
    }
}

// ---------------- EnumValue ----------------

#[derive(Debug, Clone)]
pub(crate) struct EnumValueNode {
    pub(crate) name: String,
    pub(crate) number: i32,
    pub(crate) parent: EnumId,
    pub(crate) index: usize,
    pub(crate) path: SourcePath,
    pub(crate) options: Option<Options>,
}

fn attach_value(file: &mut File, parent: EnumId, raw: &EnumValueDescriptorProto) -> EnumValueId {
    let id = EnumValueId::new(file.token, file.values.len());
    let parent_node = &mut file.enums[parent.index];
    let index = parent_node.values.len();
    let path = parent_node.path.child(slot::ENUM_VALUE, index);
    parent_node.values.push(id);
    file.values.push(EnumValueNode {
        name: raw.name.clone().unwrap_or_default(),
        number: raw.number.unwrap_or_default(),
        parent,
        index,
        path,
        options: raw.options.clone(),
    });
    id
}

declaration! {
    /// One value of an enum.
    EnumValue, EnumValueMut, EnumValueId, EnumValueNode, values
}

impl<'a> EnumValue<'a> {
    pub fn number(&self) -> i32 {
        self.node().number
    }

    /// The enum declaring this value.
    pub fn parent(&self) -> Enum<'a> {
        Enum::new(self.file, self.node().parent)
    }

    pub fn to_raw(&self) -> EnumValueDescriptorProto {
        let node = self.node();
        EnumValueDescriptorProto {
            name: non_empty(&node.name),
            number: Some(node.number),
            options: node.options.clone(),
        }
    }
}

impl EnumValueMut<'_> {
    pub fn set_number(&mut self, number: i32) -> &mut Self {
        self.node_mut().number = number;
        self
    }
}
