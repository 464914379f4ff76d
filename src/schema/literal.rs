//! Literal field types.

use crate::error::{Result, ValuableError};
use crate::types::Raw;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar type descriptor for a schema field.
///
/// `null` is accepted by every literal and kept as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LiteralType {
    /// Accepts any value.
    #[default]
    Any,
    Str,
    Bool,
    /// Any JSON number.
    Decimal,
    /// A number representable as `i64` or `u64`.
    Integer,
}

impl LiteralType {
    /// Check `raw` against this literal type.
    pub fn validate(&self, raw: &Raw) -> Result<Raw> {
        let ok = raw.is_null()
            || match self {
                LiteralType::Any => true,
                LiteralType::Str => raw.is_string(),
                LiteralType::Bool => raw.is_boolean(),
                LiteralType::Decimal => raw.is_number(),
                LiteralType::Integer => raw.is_i64() || raw.is_u64(),
            };

        if ok {
            Ok(raw.clone())
        } else {
            Err(ValuableError::Validation(format!(
                "{} expected, got {}",
                self, raw
            )))
        }
    }

    /// Value used when an attribute is absent.
    pub fn default_raw(&self) -> Raw {
        match self {
            LiteralType::Any => Raw::Null,
            LiteralType::Str => Raw::String(String::new()),
            LiteralType::Bool => Raw::Bool(false),
            LiteralType::Decimal | LiteralType::Integer => Raw::from(0),
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiteralType::Any => "Literal",
            LiteralType::Str => "Str",
            LiteralType::Bool => "Bool",
            LiteralType::Decimal => "Decimal",
            LiteralType::Integer => "Integer",
        };
        f.write_str(name)
    }
}
