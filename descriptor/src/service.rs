use crate::builder::{self, TypeIndex};
use crate::field::TypeRef;
use crate::file::{Declaration, File, MessageId, MethodId, ServiceId, declaration, non_empty, qualify};
use crate::message::Message;
use crate::options::Options;
use crate::path::{SourcePath, slot};
use crate::raw::{MethodDescriptorProto, ServiceDescriptorProto};

// ---------------- Service ----------------

#[derive(Debug, Clone)]
pub(crate) struct ServiceNode {
    pub(crate) name: String,
    pub(crate) index: usize,
    pub(crate) path: SourcePath,
    pub(crate) methods: Vec<MethodId>,
    pub(crate) options: Option<Options>,
}

impl ServiceNode {
    pub(crate) fn named(name: String) -> Self {
        Self {
            name,
            index: 0,
            path: SourcePath::default(),
            methods: Vec::new(),
            options: None,
        }
    }
}

pub(crate) fn attach(file: &mut File, mut node: ServiceNode) -> ServiceId {
    let id = ServiceId::new(file.token, file.services.len());
    node.index = file.top_services.len();
    node.path = SourcePath::root(slot::FILE_SERVICE, node.index);
    file.top_services.push(id);
    file.services.push(node);
    id
}

/// Wraps a service payload together with its methods.
pub(crate) fn wrap(file: &mut File, raw: &ServiceDescriptorProto) -> ServiceId {
    let mut node = ServiceNode::named(raw.name.clone().unwrap_or_default());
    node.options = raw.options.clone();
    let id = attach(file, node);
    for method in &raw.method {
        attach_method(file, id, method);
    }
    id
}

declaration! {
    /// A service declaration. Services only live at file level.
    Service, ServiceMut, ServiceId, ServiceNode, services
}

impl<'a> Service<'a> {
    pub fn full_name(&self) -> String {
        qualify(Some(self.file.package()), self.name())
    }

    pub fn methods(&self) -> impl ExactSizeIterator<Item = Method<'a>> + use<'a> {
        let file = self.file;
        self.node().methods.iter().map(move |&id| Method::new(file, id))
    }

    pub fn method(&self, name: &str) -> Option<Method<'a>> {
        self.methods().find(|m| m.name() == name)
    }

    pub fn to_raw(&self) -> ServiceDescriptorProto {
        let node = self.node();
        ServiceDescriptorProto {
            name: non_empty(&node.name),
            method: self.methods().map(|m| m.to_raw()).collect(),
            options: node.options.clone(),
        }
    }
}

impl ServiceMut<'_> {
    /// Appends a fresh method with no input or output yet.
    pub fn add_method(&mut self, name: impl Into<String>) -> MethodId {
        let raw = MethodDescriptorProto {
            name: Some(name.into()),
            ..Default::default()
        };
        attach_method(self.file, self.id, &raw)
    }

    pub fn wrap_method(&mut self, raw: &MethodDescriptorProto) -> MethodId {
        let id = attach_method(self.file, self.id, raw);
        builder::resolve_references(self.file);
        id
    }
}

// ---------------- Method ----------------

#[derive(Debug, Clone)]
pub(crate) struct MethodNode {
    pub(crate) name: String,
    pub(crate) parent: ServiceId,
    pub(crate) index: usize,
    pub(crate) path: SourcePath,
    pub(crate) input: TypeRef,
    pub(crate) output: TypeRef,
    pub(crate) client_streaming: Option<bool>,
    pub(crate) server_streaming: Option<bool>,
    pub(crate) options: Option<Options>,
}

fn attach_method(file: &mut File, parent: ServiceId, raw: &MethodDescriptorProto) -> MethodId {
    let id = MethodId::new(file.token, file.methods.len());
    let parent_node = &mut file.services[parent.index];
    let index = parent_node.methods.len();
    let path = parent_node.path.child(slot::SERVICE_METHOD, index);
    parent_node.methods.push(id);
    file.methods.push(MethodNode {
        name: raw.name.clone().unwrap_or_default(),
        parent,
        index,
        path,
        input: TypeRef::from_name(raw.input_type.as_ref()),
        output: TypeRef::from_name(raw.output_type.as_ref()),
        client_streaming: raw.client_streaming,
        server_streaming: raw.server_streaming,
        options: raw.options.clone(),
    });
    id
}

declaration! {
    /// An RPC method of a service.
    Method, MethodMut, MethodId, MethodNode, methods
}

impl<'a> Method<'a> {
    pub fn parent(&self) -> Service<'a> {
        Service::new(self.file, self.node().parent)
    }

    /// The request message, when it is declared in this file.
    pub fn input(&self) -> Option<Message<'a>> {
        match self.node().input {
            TypeRef::Message(id) => Some(Message::new(self.file, id)),
            _ => None,
        }
    }

    /// The response message, when it is declared in this file.
    pub fn output(&self) -> Option<Message<'a>> {
        match self.node().output {
            TypeRef::Message(id) => Some(Message::new(self.file, id)),
            _ => None,
        }
    }

    pub fn input_type(&self) -> String {
        self.node().input.name(self.file).unwrap_or_default()
    }

    pub fn output_type(&self) -> String {
        self.node().output.name(self.file).unwrap_or_default()
    }

    pub fn client_streaming(&self) -> bool {
        self.node().client_streaming.unwrap_or(false)
    }

    pub fn server_streaming(&self) -> bool {
        self.node().server_streaming.unwrap_or(false)
    }

    pub fn to_raw(&self) -> MethodDescriptorProto {
        let node = self.node();
        MethodDescriptorProto {
            name: non_empty(&node.name),
            input_type: node.input.name(self.file),
            output_type: node.output.name(self.file),
            options: node.options.clone(),
            client_streaming: node.client_streaming,
            server_streaming: node.server_streaming,
        }
    }
}

impl MethodMut<'_> {
    /// Links the request message. No-op for a foreign id.
    pub fn set_input(&mut self, input: MessageId) -> &mut Self {
        if self.file.message(input).is_some() {
            self.node_mut().input = TypeRef::Message(input);
        }
        self
    }

    /// Links the response message. No-op for a foreign id.
    pub fn set_output(&mut self, output: MessageId) -> &mut Self {
        if self.file.message(output).is_some() {
            self.node_mut().output = TypeRef::Message(output);
        }
        self
    }

    /// Sets the request type by name, linking it when the file declares it.
    pub fn set_input_type(&mut self, name: &str) -> &mut Self {
        let target = lookup_message(self.file, name);
        self.node_mut().input = target;
        self
    }

    /// Sets the response type by name, linking it when the file declares it.
    pub fn set_output_type(&mut self, name: &str) -> &mut Self {
        let target = lookup_message(self.file, name);
        self.node_mut().output = target;
        self
    }

    pub fn set_client_streaming(&mut self, streaming: bool) -> &mut Self {
        self.node_mut().client_streaming = Some(streaming);
        self
    }

    pub fn set_server_streaming(&mut self, streaming: bool) -> &mut Self {
        self.node_mut().server_streaming = Some(streaming);
        self
    }
}

fn lookup_message(file: &File, name: &str) -> TypeRef {
    let index = TypeIndex::build(file);
    match index.resolve(file, None, name) {
        Some(found @ TypeRef::Message(_)) => found,
        _ => TypeRef::Named(name.to_string()),
    }
}
