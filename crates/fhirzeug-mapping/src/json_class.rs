//! JSON encoding classes

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a value is represented once JSON encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonClass {
    Bool,
    Int,
    Float,
    Str,
    /// Structured object
    #[default]
    Dict,
}

impl JsonClass {
    /// Single-value JSON types, everything except objects
    pub fn is_primitive(self) -> bool {
        !matches!(self, Self::Dict)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Dict => "dict",
        }
    }
}

impl fmt::Display for JsonClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JsonClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "str" => Ok(Self::Str),
            "dict" => Ok(Self::Dict),
            other => Err(Error::UnknownJsonClass(other.to_string())),
        }
    }
}
