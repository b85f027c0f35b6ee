//! The file node. A [`File`] owns every declaration of one schema file in
//! per-kind arenas; declarations are addressed by typed ids and read through
//! borrowed views, so a view can never outlive the file it points into.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::builder;
use crate::enums::{self, Enum, EnumMut, EnumNode, EnumValue, EnumValueMut, EnumValueNode};
use crate::error::Result;
use crate::field::{self, Field, FieldMut, FieldNode, FieldScope};
use crate::message::{self, Message, MessageMut, MessageNode, Oneof, OneofMut, OneofNode};
use crate::options::{Extension, OptionType, Options};
use crate::path::SourcePath;
use crate::raw::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto, Location,
    ServiceDescriptorProto, SourceCodeInfo,
};
use crate::service::{self, Method, MethodMut, MethodNode, Service, ServiceMut, ServiceNode};

/// Identity of one [`File`], stamped into every id the file hands out so
/// that ids of another file never resolve here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FileToken(u64);

impl FileToken {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

macro_rules! node_ids {
    ($($id:ident),* $(,)?) => {$(
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $id {
            pub(crate) file: FileToken,
            pub(crate) index: usize,
        }

        impl $id {
            pub(crate) fn new(file: FileToken, index: usize) -> Self {
                Self { file, index }
            }
        }
    )*};
}

node_ids!(MessageId, EnumId, EnumValueId, FieldId, OneofId, ServiceId, MethodId);

/// Source comments attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    pub leading: Option<String>,
    pub trailing: Option<String>,
    pub leading_detached: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceLocation {
    pub(crate) path: SourcePath,
    pub(crate) span: Vec<i32>,
    pub(crate) comments: Comments,
}

impl SourceLocation {
    fn to_raw(&self) -> Location {
        Location {
            path: self.path.as_slice().to_vec(),
            span: self.span.clone(),
            leading_comments: self.comments.leading.clone(),
            trailing_comments: self.comments.trailing.clone(),
            leading_detached_comments: self.comments.leading_detached.clone(),
        }
    }
}

/// Read access shared by every declaration view.
pub trait Declaration<'a> {
    /// The file this declaration belongs to.
    fn file(&self) -> &'a File;
    fn name(&self) -> &'a str;
    /// Structural address, used to look up source comments.
    fn path(&self) -> &'a SourcePath;
    /// Position among the siblings of the same container slot.
    fn index(&self) -> usize;
    /// The options block, if one was ever created.
    fn options(&self) -> Option<&'a Options>;

    fn comments(&self) -> Option<&'a Comments> {
        self.file().comments_at(self.path())
    }

    fn leading_comments(&self) -> Option<&'a str> {
        self.comments().and_then(|c| c.leading.as_deref())
    }

    fn trailing_comments(&self) -> Option<&'a str> {
        self.comments().and_then(|c| c.trailing.as_deref())
    }

    fn leading_detached_comments(&self) -> &'a [String] {
        self.comments()
            .map(|c| c.leading_detached.as_slice())
            .unwrap_or(&[])
    }

    fn has_options(&self) -> bool {
        self.options().is_some()
    }

    fn has_option<T>(&self, ext: &Extension<T>) -> bool {
        self.options().is_some_and(|o| o.has(ext))
    }

    fn get_option<T: OptionType>(&self, ext: &Extension<T>) -> Option<T> {
        self.options().and_then(|o| o.get(ext))
    }

    fn bool_option(&self, ext: &Extension<bool>) -> bool {
        self.get_option(ext).unwrap_or_default()
    }

    fn string_option(&self, ext: &Extension<String>) -> String {
        self.get_option(ext).unwrap_or_default()
    }

    fn int64_option(&self, ext: &Extension<i64>) -> i64 {
        self.get_option(ext).unwrap_or_default()
    }

    fn float64_option(&self, ext: &Extension<f64>) -> f64 {
        self.get_option(ext).unwrap_or_default()
    }

    fn is_deprecated(&self) -> bool {
        self.options().and_then(|o| o.deprecated).unwrap_or(false)
    }
}

/// Write access shared by every mutable declaration view.
pub trait DeclarationMut: Sized {
    fn file_mut(&mut self) -> &mut File;
    fn source_path(&self) -> SourcePath;
    fn options_mut(&mut self) -> &mut Option<Options>;

    /// Comments set here are kept in memory only. A declaration without a
    /// recorded location has no span, so nothing is written to
    /// `source_code_info` for it.
    fn set_leading_comments(&mut self, text: impl Into<String>) -> &mut Self {
        let path = self.source_path();
        self.file_mut().comments_entry(path).leading = Some(text.into());
        self
    }

    fn set_trailing_comments(&mut self, text: impl Into<String>) -> &mut Self {
        let path = self.source_path();
        self.file_mut().comments_entry(path).trailing = Some(text.into());
        self
    }

    /// Stores a custom option, replacing any value already set under the
    /// same tag. Fails without touching the node when the extension's tag
    /// cannot live in an options message.
    fn set_option<T: OptionType>(&mut self, ext: &Extension<T>, value: T) -> Result<&mut Self> {
        crate::options::store(self.options_mut(), ext, value, true)?;
        Ok(self)
    }

    /// Like [`set_option`](Self::set_option) but keeps an existing value.
    /// Returns whether `value` was written.
    fn set_option_if_absent<T: OptionType>(&mut self, ext: &Extension<T>, value: T) -> Result<bool> {
        crate::options::store(self.options_mut(), ext, value, false)
    }

    fn set_bool_option(&mut self, ext: &Extension<bool>, value: bool) -> Result<&mut Self> {
        self.set_option(ext, value)
    }

    fn set_string_option(
        &mut self,
        ext: &Extension<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self> {
        self.set_option(ext, value.into())
    }

    fn set_int64_option(&mut self, ext: &Extension<i64>, value: i64) -> Result<&mut Self> {
        self.set_option(ext, value)
    }

    fn set_float64_option(&mut self, ext: &Extension<f64>, value: f64) -> Result<&mut Self> {
        self.set_option(ext, value)
    }

    fn set_deprecated(&mut self, deprecated: bool) -> &mut Self {
        self.options_mut()
            .get_or_insert_with(Options::default)
            .deprecated = Some(deprecated);
        self
    }
}

/// Declares the read and write views of one declaration kind.
macro_rules! declaration {
    ($(#[$meta:meta])* $view:ident, $view_mut:ident, $id:ident, $node:ident, $arena:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $view<'a> {
            file: &'a $crate::file::File,
            id: $id,
        }

        #[doc = concat!("Mutable access to a [`", stringify!($view), "`].")]
        pub struct $view_mut<'a> {
            file: &'a mut $crate::file::File,
            id: $id,
        }

        impl<'a> $view<'a> {
            pub(crate) fn new(file: &'a $crate::file::File, id: $id) -> Self {
                Self { file, id }
            }

            pub fn id(&self) -> $id {
                self.id
            }

            fn node(&self) -> &'a $node {
                &self.file.$arena[self.id.index]
            }
        }

        impl<'a> $view_mut<'a> {
            pub(crate) fn new(file: &'a mut $crate::file::File, id: $id) -> Self {
                Self { file, id }
            }

            pub fn id(&self) -> $id {
                self.id
            }

            pub fn view(&self) -> $view<'_> {
                $view::new(&*self.file, self.id)
            }

            #[allow(dead_code)]
            fn node(&self) -> &$node {
                &self.file.$arena[self.id.index]
            }

            fn node_mut(&mut self) -> &mut $node {
                &mut self.file.$arena[self.id.index]
            }

            pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
                let name = name.into();
                tracing::trace!(kind = stringify!($view), %name, "rename");
                self.node_mut().name = name;
                self
            }
        }

        impl<'a> $crate::file::Declaration<'a> for $view<'a> {
            fn file(&self) -> &'a $crate::file::File {
                self.file
            }

            fn name(&self) -> &'a str {
                &self.node().name
            }

            fn path(&self) -> &'a $crate::path::SourcePath {
                &self.node().path
            }

            fn index(&self) -> usize {
                self.node().index
            }

            fn options(&self) -> Option<&'a $crate::options::Options> {
                self.node().options.as_ref()
            }
        }

        impl $crate::file::DeclarationMut for $view_mut<'_> {
            fn file_mut(&mut self) -> &mut $crate::file::File {
                &mut *self.file
            }

            fn source_path(&self) -> $crate::path::SourcePath {
                self.file.$arena[self.id.index].path.clone()
            }

            fn options_mut(&mut self) -> &mut Option<$crate::options::Options> {
                &mut self.node_mut().options
            }
        }

        impl std::fmt::Debug for $view<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let node = self.node();
                f.debug_struct(stringify!($view))
                    .field("name", &node.name)
                    .field("path", &node.path.to_string())
                    .finish()
            }
        }

        impl PartialEq for $view<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.file, other.file) && self.id == other.id
            }
        }

        impl Eq for $view<'_> {}
    };
}

pub(crate) use declaration;

/// Joins a scope and a simple name into a dotted full name.
pub(crate) fn qualify(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(p) if !p.is_empty() => format!("{p}.{name}"),
        _ => name.to_string(),
    }
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// A schema file and every declaration it contains.
///
/// Lookups by id return `None` for ids this file never handed out, so a
/// chain of lookups degrades to an absent result instead of panicking.
/// Mutation needs `&mut File`; share a file across threads only behind a
/// lock of your own. Copy a file with `File::from_raw(&file.to_raw())`; the
/// copy hands out its own ids.
#[derive(Debug)]
pub struct File {
    pub(crate) token: FileToken,
    pub(crate) name: String,
    pub(crate) package: String,
    pub(crate) syntax: Option<String>,
    pub(crate) dependencies: Vec<String>,
    pub(crate) options: Option<Options>,

    pub(crate) top_messages: Vec<MessageId>,
    pub(crate) top_enums: Vec<EnumId>,
    pub(crate) top_services: Vec<ServiceId>,
    pub(crate) top_extensions: Vec<FieldId>,

    pub(crate) messages: Vec<MessageNode>,
    pub(crate) enums: Vec<EnumNode>,
    pub(crate) values: Vec<EnumValueNode>,
    pub(crate) fields: Vec<FieldNode>,
    pub(crate) oneofs: Vec<OneofNode>,
    pub(crate) services: Vec<ServiceNode>,
    pub(crate) methods: Vec<MethodNode>,

    pub(crate) locations: Vec<SourceLocation>,
    location_index: HashMap<SourcePath, usize>,
}

impl Default for File {
    fn default() -> Self {
        Self {
            token: FileToken::next(),
            name: String::new(),
            package: String::new(),
            syntax: None,
            dependencies: Vec::new(),
            options: None,
            top_messages: Vec::new(),
            top_enums: Vec::new(),
            top_services: Vec::new(),
            top_extensions: Vec::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            values: Vec::new(),
            fields: Vec::new(),
            oneofs: Vec::new(),
            services: Vec::new(),
            methods: Vec::new(),
            locations: Vec::new(),
            location_index: HashMap::new(),
        }
    }
}

impl File {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            ..Self::default()
        }
    }

    /// Builds the whole graph from an already parsed payload.
    pub fn from_raw(raw: &FileDescriptorProto) -> Self {
        builder::wrap_file(raw)
    }

    /// Generates the serializable payload from the current graph.
    pub fn to_raw(&self) -> FileDescriptorProto {
        FileDescriptorProto {
            name: non_empty(&self.name),
            package: non_empty(&self.package),
            dependency: self.dependencies.clone(),
            message_type: self.messages().map(|m| m.to_raw()).collect(),
            enum_type: self.enums().map(|e| e.to_raw()).collect(),
            service: self.services().map(|s| s.to_raw()).collect(),
            extension: self.extensions().map(|f| f.to_raw()).collect(),
            options: self.options.clone(),
            source_code_info: self.source_code_info(),
            syntax: self.syntax.clone(),
        }
    }

    /// Only locations that carry a span are emitted: a span always has
    /// three or four elements, and comments set through the API have none.
    fn source_code_info(&self) -> Option<SourceCodeInfo> {
        let location: Vec<Location> = self
            .locations
            .iter()
            .filter(|l| !l.span.is_empty())
            .map(SourceLocation::to_raw)
            .collect();
        (!location.is_empty()).then_some(SourceCodeInfo { location })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Changes the package. Full names of every declaration follow.
    pub fn set_package(&mut self, package: impl Into<String>) -> &mut Self {
        self.package = package.into();
        self
    }

    pub fn syntax(&self) -> Option<&str> {
        self.syntax.as_deref()
    }

    pub fn set_syntax(&mut self, syntax: impl Into<String>) -> &mut Self {
        self.syntax = Some(syntax.into());
        self
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn add_dependency(&mut self, dependency: impl Into<String>) -> &mut Self {
        self.dependencies.push(dependency.into());
        self
    }

    // ---------------- Top-level declarations ----------------

    pub fn messages(&self) -> impl ExactSizeIterator<Item = Message<'_>> + '_ {
        self.top_messages.iter().map(move |&id| Message::new(self, id))
    }

    pub fn enums(&self) -> impl ExactSizeIterator<Item = Enum<'_>> + '_ {
        self.top_enums.iter().map(move |&id| Enum::new(self, id))
    }

    pub fn services(&self) -> impl ExactSizeIterator<Item = Service<'_>> + '_ {
        self.top_services.iter().map(move |&id| Service::new(self, id))
    }

    /// Extensions declared at file level.
    pub fn extensions(&self) -> impl ExactSizeIterator<Item = Field<'_>> + '_ {
        self.top_extensions.iter().map(move |&id| Field::new(self, id))
    }

    /// Every message of the file, nested ones included.
    pub fn all_messages(&self) -> impl Iterator<Item = Message<'_>> + '_ {
        (0..self.messages.len()).map(move |i| Message::new(self, MessageId::new(self.token, i)))
    }

    /// Every enum of the file, nested ones included.
    pub fn all_enums(&self) -> impl Iterator<Item = Enum<'_>> + '_ {
        (0..self.enums.len()).map(move |i| Enum::new(self, EnumId::new(self.token, i)))
    }

    pub fn message_by_name(&self, name: &str) -> Option<Message<'_>> {
        self.messages().find(|m| m.name() == name)
    }

    pub fn enum_by_name(&self, name: &str) -> Option<Enum<'_>> {
        self.enums().find(|e| e.name() == name)
    }

    pub fn service_by_name(&self, name: &str) -> Option<Service<'_>> {
        self.services().find(|s| s.name() == name)
    }

    /// Finds a message at any depth by full name; a leading `.` is accepted.
    pub fn find_message(&self, full_name: &str) -> Option<Message<'_>> {
        let full_name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.all_messages().find(|m| m.full_name() == full_name)
    }

    /// Finds an enum at any depth by full name; a leading `.` is accepted.
    pub fn find_enum(&self, full_name: &str) -> Option<Enum<'_>> {
        let full_name = full_name.strip_prefix('.').unwrap_or(full_name);
        self.all_enums().find(|e| e.full_name() == full_name)
    }

    // ---------------- Lookup by id ----------------

    pub fn message(&self, id: MessageId) -> Option<Message<'_>> {
        self.owns(id.file, id.index, self.messages.len()).then(|| Message::new(self, id))
    }

    pub fn message_mut(&mut self, id: MessageId) -> Option<MessageMut<'_>> {
        self.owns(id.file, id.index, self.messages.len()).then(|| MessageMut::new(self, id))
    }

    pub fn enum_type(&self, id: EnumId) -> Option<Enum<'_>> {
        self.owns(id.file, id.index, self.enums.len()).then(|| Enum::new(self, id))
    }

    pub fn enum_type_mut(&mut self, id: EnumId) -> Option<EnumMut<'_>> {
        self.owns(id.file, id.index, self.enums.len()).then(|| EnumMut::new(self, id))
    }

    pub fn enum_value(&self, id: EnumValueId) -> Option<EnumValue<'_>> {
        self.owns(id.file, id.index, self.values.len()).then(|| EnumValue::new(self, id))
    }

    pub fn enum_value_mut(&mut self, id: EnumValueId) -> Option<EnumValueMut<'_>> {
        self.owns(id.file, id.index, self.values.len()).then(|| EnumValueMut::new(self, id))
    }

    pub fn field(&self, id: FieldId) -> Option<Field<'_>> {
        self.owns(id.file, id.index, self.fields.len()).then(|| Field::new(self, id))
    }

    pub fn field_mut(&mut self, id: FieldId) -> Option<FieldMut<'_>> {
        self.owns(id.file, id.index, self.fields.len()).then(|| FieldMut::new(self, id))
    }

    pub fn oneof(&self, id: OneofId) -> Option<Oneof<'_>> {
        self.owns(id.file, id.index, self.oneofs.len()).then(|| Oneof::new(self, id))
    }

    pub fn oneof_mut(&mut self, id: OneofId) -> Option<OneofMut<'_>> {
        self.owns(id.file, id.index, self.oneofs.len()).then(|| OneofMut::new(self, id))
    }

    pub fn service(&self, id: ServiceId) -> Option<Service<'_>> {
        self.owns(id.file, id.index, self.services.len()).then(|| Service::new(self, id))
    }

    pub fn service_mut(&mut self, id: ServiceId) -> Option<ServiceMut<'_>> {
        self.owns(id.file, id.index, self.services.len()).then(|| ServiceMut::new(self, id))
    }

    pub fn method(&self, id: MethodId) -> Option<Method<'_>> {
        self.owns(id.file, id.index, self.methods.len()).then(|| Method::new(self, id))
    }

    pub fn method_mut(&mut self, id: MethodId) -> Option<MethodMut<'_>> {
        self.owns(id.file, id.index, self.methods.len()).then(|| MethodMut::new(self, id))
    }

    fn owns(&self, file: FileToken, index: usize, len: usize) -> bool {
        file == self.token && index < len
    }

    // ---------------- Construction ----------------

    /// Appends a fresh, empty top-level message.
    pub fn add_message(&mut self, name: impl Into<String>) -> MessageId {
        message::attach(self, None, MessageNode::named(name.into()))
    }

    pub fn add_enum(&mut self, name: impl Into<String>) -> EnumId {
        enums::attach(self, None, EnumNode::named(name.into()))
    }

    pub fn add_service(&mut self, name: impl Into<String>) -> ServiceId {
        service::attach(self, ServiceNode::named(name.into()))
    }

    /// Appends a file-level extension of `extendee`.
    pub fn add_extension(
        &mut self,
        name: impl Into<String>,
        extendee: impl Into<String>,
    ) -> FieldId {
        let mut node = FieldNode::named(name.into());
        node.extendee = Some(extendee.into());
        field::attach(self, FieldScope::FileExtension, node)
    }

    /// Wraps a top-level message payload together with its fields and oneofs.
    /// Nested messages and enums of `raw` are not wrapped; use
    /// [`add_message_from`](Self::add_message_from) for a whole subtree.
    pub fn wrap_message(&mut self, raw: &DescriptorProto) -> MessageId {
        let id = message::wrap(self, None, raw);
        builder::resolve_references(self);
        id
    }

    /// Wraps a message payload and everything nested in it, then resolves
    /// type references across the file.
    pub fn add_message_from(&mut self, raw: &DescriptorProto) -> MessageId {
        let id = builder::wrap_message_tree(self, None, raw);
        builder::resolve_references(self);
        id
    }

    pub fn wrap_enum(&mut self, raw: &EnumDescriptorProto) -> EnumId {
        let id = enums::wrap(self, None, raw);
        builder::resolve_references(self);
        id
    }

    pub fn wrap_service(&mut self, raw: &ServiceDescriptorProto) -> ServiceId {
        let id = service::wrap(self, raw);
        builder::resolve_references(self);
        id
    }

    pub fn wrap_extension(&mut self, raw: &FieldDescriptorProto) -> FieldId {
        let id = field::wrap(self, FieldScope::FileExtension, raw, &[]);
        builder::resolve_references(self);
        id
    }

    /// Links every by-name type reference to the declaration it names, when
    /// that declaration lives in this file. Returns how many references stay
    /// unresolved.
    pub fn resolve_references(&mut self) -> usize {
        builder::resolve_references(self)
    }

    // ---------------- Options ----------------

    pub fn options(&self) -> Option<&Options> {
        self.options.as_ref()
    }

    pub fn has_option<T>(&self, ext: &Extension<T>) -> bool {
        self.options.as_ref().is_some_and(|o| o.has(ext))
    }

    pub fn get_option<T: OptionType>(&self, ext: &Extension<T>) -> Option<T> {
        self.options.as_ref().and_then(|o| o.get(ext))
    }

    pub fn set_option<T: OptionType>(&mut self, ext: &Extension<T>, value: T) -> Result<&mut Self> {
        crate::options::store(&mut self.options, ext, value, true)?;
        Ok(self)
    }

    // ---------------- Source comments ----------------

    pub fn comments_at(&self, path: &SourcePath) -> Option<&Comments> {
        self.location_index
            .get(path)
            .map(|&i| &self.locations[i].comments)
    }

    pub(crate) fn comments_entry(&mut self, path: SourcePath) -> &mut Comments {
        let index = match self.location_index.get(&path) {
            Some(&i) => i,
            None => {
                self.locations.push(SourceLocation {
                    path: path.clone(),
                    span: Vec::new(),
                    comments: Comments::default(),
                });
                self.location_index.insert(path, self.locations.len() - 1);
                self.locations.len() - 1
            }
        };
        &mut self.locations[index].comments
    }

    /// Records a location from a payload. When protoc repeats a path the
    /// first occurrence answers lookups; all are kept for serialization.
    pub(crate) fn push_location(&mut self, raw: &Location) {
        let path = SourcePath::from(raw.path.clone());
        self.locations.push(SourceLocation {
            path: path.clone(),
            span: raw.span.clone(),
            comments: Comments {
                leading: raw.leading_comments.clone(),
                trailing: raw.trailing_comments.clone(),
                leading_detached: raw.leading_detached_comments.clone(),
            },
        });
        let index = self.locations.len() - 1;
        self.location_index.entry(path).or_insert(index);
    }
}
