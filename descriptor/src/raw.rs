//! Raw descriptor payloads, mirroring `google/protobuf/descriptor.proto`.
//!
//! These are the values exchanged with an external codec. Field names and
//! enumerants follow the protobuf JSON mapping.

use serde::{Deserialize, Serialize};

use crate::options::Options;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileDescriptorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependency: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub message_type: Vec<DescriptorProto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_type: Vec<EnumDescriptorProto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<ServiceDescriptorProto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<FieldDescriptorProto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code_info: Option<SourceCodeInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field: Vec<FieldDescriptorProto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<FieldDescriptorProto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested_type: Vec<DescriptorProto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_type: Vec<EnumDescriptorProto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub oneof_decl: Vec<OneofDescriptorProto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldDescriptorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extendee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oneof_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OneofDescriptorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnumDescriptorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<EnumValueDescriptorProto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnumValueDescriptorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDescriptorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<MethodDescriptorProto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MethodDescriptorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_streaming: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_streaming: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceCodeInfo {
    pub location: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub path: Vec<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub span: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading_comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_comments: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leading_detached_comments: Vec<String>,
}

/// Wire type of a field. Discriminants match `FieldDescriptorProto.Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "TYPE_DOUBLE")]
    Double = 1,
    #[serde(rename = "TYPE_FLOAT")]
    Float = 2,
    #[serde(rename = "TYPE_INT64")]
    Int64 = 3,
    #[serde(rename = "TYPE_UINT64")]
    Uint64 = 4,
    #[serde(rename = "TYPE_INT32")]
    Int32 = 5,
    #[serde(rename = "TYPE_FIXED64")]
    Fixed64 = 6,
    #[serde(rename = "TYPE_FIXED32")]
    Fixed32 = 7,
    #[serde(rename = "TYPE_BOOL")]
    Bool = 8,
    #[serde(rename = "TYPE_STRING")]
    String = 9,
    #[serde(rename = "TYPE_GROUP")]
    Group = 10,
    #[serde(rename = "TYPE_MESSAGE")]
    Message = 11,
    #[serde(rename = "TYPE_BYTES")]
    Bytes = 12,
    #[serde(rename = "TYPE_UINT32")]
    Uint32 = 13,
    #[serde(rename = "TYPE_ENUM")]
    Enum = 14,
    #[serde(rename = "TYPE_SFIXED32")]
    Sfixed32 = 15,
    #[serde(rename = "TYPE_SFIXED64")]
    Sfixed64 = 16,
    #[serde(rename = "TYPE_SINT32")]
    Sint32 = 17,
    #[serde(rename = "TYPE_SINT64")]
    Sint64 = 18,
}

impl FieldType {
    /// Schema-language spelling for scalar kinds; `None` for enum, message
    /// and group, which are named by their type reference instead.
    pub fn scalar_name(self) -> Option<&'static str> {
        let name = match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int64 => "int64",
            FieldType::Uint64 => "uint64",
            FieldType::Int32 => "int32",
            FieldType::Fixed64 => "fixed64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Uint32 => "uint32",
            FieldType::Sfixed32 => "sfixed32",
            FieldType::Sfixed64 => "sfixed64",
            FieldType::Sint32 => "sint32",
            FieldType::Sint64 => "sint64",
            FieldType::Group | FieldType::Message | FieldType::Enum => return None,
        };
        Some(name)
    }

    pub fn is_scalar(self) -> bool {
        self.scalar_name().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "LABEL_OPTIONAL")]
    Optional = 1,
    #[serde(rename = "LABEL_REQUIRED")]
    Required = 2,
    #[serde(rename = "LABEL_REPEATED")]
    Repeated = 3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_uses_protobuf_json_names() {
        let field = FieldDescriptorProto {
            name: Some("bar".to_string()),
            number: Some(1),
            label: Some(Label::Repeated),
            r#type: Some(FieldType::String),
            ..Default::default()
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "bar",
                "number": 1,
                "label": "LABEL_REPEATED",
                "type": "TYPE_STRING"
            })
        );
    }

    #[test]
    fn reads_descriptor_json_with_missing_lists() {
        let file: FileDescriptorProto = serde_json::from_str(
            r#"{"name":"a.proto","package":"pkg","messageType":[{"name":"Foo","nestedType":[{"name":"Bar"}]}]}"#,
        )
        .unwrap();
        assert_eq!(file.package.as_deref(), Some("pkg"));
        assert_eq!(file.message_type[0].nested_type[0].name.as_deref(), Some("Bar"));
        assert!(file.enum_type.is_empty());
    }

    #[test]
    fn scalar_names_exclude_reference_kinds() {
        assert_eq!(FieldType::Int32.scalar_name(), Some("int32"));
        assert_eq!(FieldType::Bytes.scalar_name(), Some("bytes"));
        assert!(!FieldType::Enum.is_scalar());
        assert!(!FieldType::Message.is_scalar());
    }
}
