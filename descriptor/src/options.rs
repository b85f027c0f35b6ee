//! Typed storage for custom options.
//!
//! An [`Extension`] names a vendor option by tag and fixes the Rust type its
//! value is read back as. Values are kept in an [`Options`] block as tagged
//! [`OptionValue`]s, so a lookup through an extension whose declared type does
//! not match the stored value yields `None` instead of failing.

use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};

/// Options messages in `descriptor.proto` declare `extensions 1000 to max`.
const MIN_EXTENSION_TAG: u32 = 1000;
const MAX_FIELD_TAG: u32 = 536_870_911;
const RESERVED_TAGS: std::ops::RangeInclusive<u32> = 19000..=19999;

/// Identity of a custom option: a tag plus the type its value is read as.
pub struct Extension<T> {
    name: &'static str,
    tag: u32,
    _value: PhantomData<fn() -> T>,
}

impl<T> Extension<T> {
    pub const fn new(name: &'static str, tag: u32) -> Self {
        Self {
            name,
            tag,
            _value: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn tag(&self) -> u32 {
        self.tag
    }

    fn validate(&self) -> Result<()> {
        let tag = self.tag;
        if !(MIN_EXTENSION_TAG..=MAX_FIELD_TAG).contains(&tag) || RESERVED_TAGS.contains(&tag) {
            return Err(DescriptorError::InvalidExtensionTag {
                name: self.name,
                tag,
            });
        }
        Ok(())
    }
}

impl<T> Clone for Extension<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Extension<T> {}

impl<T> fmt::Debug for Extension<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish()
    }
}

/// A stored option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

/// Rust types that can be stored as option values.
///
/// Supporting a new scalar only takes a new impl.
pub trait OptionType: Sized {
    fn into_value(self) -> OptionValue;
    fn from_value(value: &OptionValue) -> Option<Self>;
}

macro_rules! option_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl OptionType for $ty {
            fn into_value(self) -> OptionValue {
                OptionValue::$variant(self)
            }

            fn from_value(value: &OptionValue) -> Option<Self> {
                match value {
                    OptionValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    )*};
}

option_type! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Bytes,
}

/// The options block of a declaration: standard flags plus custom options
/// keyed by tag, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<u32, OptionValue>,
}

impl Options {
    pub fn has<T>(&self, ext: &Extension<T>) -> bool {
        self.extensions.contains_key(&ext.tag)
    }

    /// The stored value, reinterpreted as the extension's declared type.
    pub fn get<T: OptionType>(&self, ext: &Extension<T>) -> Option<T> {
        self.extensions.get(&ext.tag).and_then(T::from_value)
    }

    /// Stores `value`, replacing any earlier value under the same tag.
    pub fn set<T: OptionType>(&mut self, ext: &Extension<T>, value: T) -> Result<()> {
        ext.validate()?;
        self.extensions.insert(ext.tag, value.into_value());
        Ok(())
    }

    /// Stores `value` only when nothing is stored under the tag yet.
    /// Returns whether the value was written.
    pub fn set_if_absent<T: OptionType>(&mut self, ext: &Extension<T>, value: T) -> Result<bool> {
        ext.validate()?;
        if self.has(ext) {
            return Ok(false);
        }
        self.extensions.insert(ext.tag, value.into_value());
        Ok(true)
    }

    pub fn clear<T>(&mut self, ext: &Extension<T>) -> bool {
        self.extensions.shift_remove(&ext.tag).is_some()
    }

    pub fn value(&self, tag: u32) -> Option<&OptionValue> {
        self.extensions.get(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.deprecated.is_none() && self.extensions.is_empty()
    }
}

/// Writes into a possibly missing block, creating it only once the extension
/// is known to be storable.
pub(crate) fn store<T: OptionType>(
    block: &mut Option<Options>,
    ext: &Extension<T>,
    value: T,
    overwrite: bool,
) -> Result<bool> {
    ext.validate()?;
    let options = block.get_or_insert_with(Options::default);
    if overwrite {
        options.set(ext, value)?;
        Ok(true)
    } else {
        options.set_if_absent(ext, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIAS: Extension<String> = Extension::new("test.alias", 50001);
    const IGNORE: Extension<bool> = Extension::new("test.ignore", 50002);
    const WEIGHT: Extension<f64> = Extension::new("test.weight", 50003);
    const SHADOW: Extension<i64> = Extension::new("test.shadow", 50001);

    #[test]
    fn set_then_get_returns_written_value() {
        let mut options = Options::default();
        options.set(&ALIAS, "name".to_string()).unwrap();
        options.set(&WEIGHT, 0.5).unwrap();
        assert_eq!(options.get(&ALIAS).as_deref(), Some("name"));
        assert_eq!(options.get(&WEIGHT), Some(0.5));
        assert_eq!(options.get(&IGNORE), None);
        assert!(!options.has(&IGNORE));
    }

    #[test]
    fn mismatched_type_reads_as_absent() {
        let mut options = Options::default();
        options.set(&ALIAS, "name".to_string()).unwrap();
        assert!(options.has(&SHADOW));
        assert_eq!(options.get(&SHADOW), None);
    }

    #[test]
    fn set_overwrites_but_set_if_absent_keeps_first() {
        let mut options = Options::default();
        options.set(&IGNORE, false).unwrap();
        options.set(&IGNORE, true).unwrap();
        assert_eq!(options.get(&IGNORE), Some(true));

        assert!(!options.set_if_absent(&IGNORE, false).unwrap());
        assert_eq!(options.get(&IGNORE), Some(true));
        assert!(options.clear(&IGNORE));
        assert!(options.set_if_absent(&IGNORE, false).unwrap());
        assert_eq!(options.get(&IGNORE), Some(false));
    }

    #[test]
    fn rejects_tags_outside_extension_range() {
        let reserved: Extension<bool> = Extension::new("test.reserved", 19500);
        let standard: Extension<bool> = Extension::new("test.standard", 3);
        let mut block = None;
        assert_eq!(
            store(&mut block, &reserved, true, true),
            Err(DescriptorError::InvalidExtensionTag {
                name: "test.reserved",
                tag: 19500
            })
        );
        assert!(store(&mut block, &standard, true, true).is_err());
        assert!(block.is_none(), "a failed write must not create the block");
    }

    #[test]
    fn store_creates_block_lazily() {
        let mut block = None;
        assert!(store(&mut block, &ALIAS, "a".to_string(), true).unwrap());
        assert!(!store(&mut block, &ALIAS, "b".to_string(), false).unwrap());
        assert_eq!(block.unwrap().get(&ALIAS).as_deref(), Some("a"));
    }
}
