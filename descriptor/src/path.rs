use std::fmt;
use std::str::FromStr;

use crate::error::DescriptorError;

/// Field numbers of the container slots in `descriptor.proto`.
///
/// Comment indexes produced by protoc address declarations with these numbers,
/// so they must not change.
pub mod slot {
    pub const FILE_MESSAGE: i32 = 4;
    pub const FILE_ENUM: i32 = 5;
    pub const FILE_SERVICE: i32 = 6;
    pub const FILE_EXTENSION: i32 = 7;

    pub const MESSAGE_FIELD: i32 = 2;
    pub const MESSAGE_NESTED: i32 = 3;
    pub const MESSAGE_ENUM: i32 = 4;
    pub const MESSAGE_EXTENSION: i32 = 6;
    pub const MESSAGE_ONEOF: i32 = 8;

    pub const ENUM_VALUE: i32 = 2;
    pub const SERVICE_METHOD: i32 = 2;
}

/// Structural address of a declaration: `(slot, index)` pairs from the file
/// root down to the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourcePath(Vec<i32>);

impl SourcePath {
    /// Address of a node living at `index` in `slot` of `parent`, or of the
    /// file itself when there is no parent.
    pub fn encode(parent: Option<&SourcePath>, slot: i32, index: usize) -> Self {
        let mut segments = parent.map(|p| p.0.clone()).unwrap_or_default();
        segments.reserve(2);
        segments.push(slot);
        segments.push(index as i32);
        Self(segments)
    }

    pub fn root(slot: i32, index: usize) -> Self {
        Self::encode(None, slot, index)
    }

    pub fn child(&self, slot: i32, index: usize) -> Self {
        Self::encode(Some(self), slot, index)
    }

    /// Path of the enclosing declaration; `None` for top-level nodes.
    pub fn parent(&self) -> Option<SourcePath> {
        if self.0.len() <= 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 2].to_vec()))
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i32>> for SourcePath {
    fn from(segments: Vec<i32>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for SourcePath {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        s.split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
            .map_err(|_| DescriptorError::InvalidPath(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_paths_use_file_slots() {
        assert_eq!(SourcePath::root(slot::FILE_MESSAGE, 2).to_string(), "4,2");
        assert_eq!(SourcePath::root(slot::FILE_ENUM, 0).to_string(), "5,0");
        assert_eq!(SourcePath::root(slot::FILE_SERVICE, 1).to_string(), "6,1");
    }

    #[test]
    fn nested_paths_extend_the_parent() {
        let outer = SourcePath::root(slot::FILE_MESSAGE, 0);
        let inner = outer.child(slot::MESSAGE_NESTED, 1);
        assert_eq!(inner.to_string(), "4,0,3,1");
        assert_eq!(inner.child(slot::MESSAGE_ENUM, 0).to_string(), "4,0,3,1,4,0");
        assert_eq!(inner.parent(), Some(outer.clone()));
        assert_eq!(outer.parent(), None);
    }

    #[test]
    fn parses_textual_paths() {
        let path: SourcePath = "4, 0,4,0".parse().unwrap();
        assert_eq!(path.as_slice(), &[4, 0, 4, 0]);
        assert!("".parse::<SourcePath>().unwrap().is_empty());
        assert!(matches!(
            "4,x".parse::<SourcePath>(),
            Err(DescriptorError::InvalidPath(_))
        ));
    }
}
