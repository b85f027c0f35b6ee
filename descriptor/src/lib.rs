//! In-memory object model for protobuf schema descriptors.
//!
//! A [`File`] is built either from scratch or by wrapping an already parsed
//! [`FileDescriptorProto`]. Every declaration gets a structural
//! [`SourcePath`] that keys its source comments, can be renamed or extended
//! in place, and carries typed custom options. [`File::to_raw`] regenerates
//! the payload from the current graph at any time.
//!
//! Reads go through views borrowed from the file (`file.message(id)`),
//! writes through mutable views (`file.message_mut(id)`). Nothing is
//! synchronized internally; a file shared between threads needs an
//! external lock.

mod builder;
mod enums;
mod error;
mod field;
mod file;
mod message;
mod options;
mod path;
pub mod raw;
mod service;

pub use builder::{resolve_references, wrap_file};
pub use enums::{Enum, EnumMut, EnumValue, EnumValueMut};
pub use error::{DescriptorError, Result};
pub use field::{Field, FieldMut, friendly_type, friendly_type_name};
pub use file::{
    Comments, Declaration, DeclarationMut, EnumId, EnumValueId, FieldId, File, MessageId,
    MethodId, OneofId, ServiceId,
};
pub use message::{Message, MessageMut, Oneof, OneofMut};
pub use options::{Extension, OptionType, OptionValue, Options};
pub use path::{SourcePath, slot};
pub use raw::{FieldType, FileDescriptorProto, Label};
pub use service::{Method, MethodMut, Service, ServiceMut};
