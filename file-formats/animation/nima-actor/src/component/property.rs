//! User-defined properties attached to components

use nima_data::BlockReader;

use crate::block_type::BlockType;
use crate::error::Result;

/// Value of a custom property
#[derive(Debug, Clone, PartialEq)]
pub enum CustomValue {
    Int(i32),
    Float(f32),
    Text(String),
    Bool(bool),
}

impl CustomValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Bool(_) => "boolean",
        }
    }
}

impl std::fmt::Display for CustomValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// A named value whose parent is the component it describes
#[derive(Debug, Clone, PartialEq)]
pub struct CustomProperty {
    pub(crate) value: CustomValue,
}

impl CustomProperty {
    pub(crate) fn read(reader: &mut BlockReader<'_>, block: BlockType) -> Result<Option<Self>> {
        let value = match block {
            BlockType::CustomIntProperty => CustomValue::Int(reader.read_i32()?),
            BlockType::CustomFloatProperty => CustomValue::Float(reader.read_f32()?),
            BlockType::CustomStringProperty => CustomValue::Text(reader.read_string()?),
            BlockType::CustomBooleanProperty => CustomValue::Bool(reader.read_bool()?),
            _ => return Ok(None),
        };
        Ok(Some(Self { value }))
    }

    pub fn value(&self) -> &CustomValue {
        &self.value
    }
}
