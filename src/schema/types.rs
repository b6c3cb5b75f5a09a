//! Column type definitions
//!
//! Supported types:
//! - bool: Boolean
//! - int: 64-bit signed integer
//! - float: 64-bit floating point
//! - string: UTF-8 string
//! - bytes: raw byte string
//! - `<elem>[]`: homogeneous array of an element type
//!
//! Array types are never orderable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type of a result column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DatumType {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// UTF-8 string
    String,
    /// Raw bytes
    Bytes,
    /// Homogeneous array with single element type
    Array(Box<DatumType>),
}

impl DatumType {
    /// Returns true if values of this type can be used as a sort key.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, DatumType::Array(_))
    }

    /// Returns true for int and float
    pub fn is_numeric(&self) -> bool {
        matches!(self, DatumType::Int | DatumType::Float)
    }

    /// Convenience constructor for `elem[]`
    pub fn array_of(elem: DatumType) -> Self {
        DatumType::Array(Box::new(elem))
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatumType::Bool => write!(f, "BOOL"),
            DatumType::Int => write!(f, "INT"),
            DatumType::Float => write!(f, "FLOAT"),
            DatumType::String => write!(f, "STRING"),
            DatumType::Bytes => write!(f, "BYTES"),
            DatumType::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}

impl FromStr for DatumType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(elem) = s.strip_suffix("[]") {
            return Ok(DatumType::array_of(elem.parse()?));
        }
        match s.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(DatumType::Bool),
            "int" | "integer" | "int8" => Ok(DatumType::Int),
            "float" | "float8" | "double" => Ok(DatumType::Float),
            "string" | "text" => Ok(DatumType::String),
            "bytes" => Ok(DatumType::Bytes),
            other => Err(format!("unknown column type '{}'", other)),
        }
    }
}

impl TryFrom<String> for DatumType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DatumType> for String {
    fn from(t: DatumType) -> Self {
        t.to_string().to_ascii_lowercase()
    }
}
