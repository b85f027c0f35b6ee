/// Errors raised by the few fallible operations of the descriptor model.
///
/// Missing declarations, unset options and type mismatches are not errors:
/// those surface as `None` or a zero value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// The extension's tag cannot be stored in an options message.
    #[error("extension `{name}` has tag {tag}, outside the options extension range")]
    InvalidExtensionTag { name: &'static str, tag: u32 },

    /// A textual structural path did not parse.
    #[error("invalid source path `{0}`")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, DescriptorError>;
