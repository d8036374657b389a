// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased runtime values.

use crate::union_value::UnionValue;
use std::collections::HashMap;

/// A runtime value for any descriptor-described type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Primitives
    Bool(bool),
    Char(char),
    WChar(u16),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),

    // Composites
    Struct(HashMap<String, Value>),
    Sequence(Vec<Value>),
    Array(Vec<Value>),
    Enum(i32, String), // (value, variant name)
    Bitmask(u64),
    Union(Box<UnionValue>),
}

impl Value {
    /// Create an empty struct value.
    pub fn new_struct() -> Self {
        Self::Struct(HashMap::new())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Self::U8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::F32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Sequence or array elements.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(v) | Self::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_mask(&self) -> Option<u64> {
        match self {
            Self::Bitmask(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionValue> {
        match self {
            Self::Union(v) => Some(v),
            _ => None,
        }
    }

    pub fn enum_value(&self) -> Option<i32> {
        match self {
            Self::Enum(v, _) => Some(*v),
            _ => None,
        }
    }

    pub fn enum_variant(&self) -> Option<&str> {
        match self {
            Self::Enum(_, name) => Some(name),
            _ => None,
        }
    }

    /// Get struct field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Get typed struct field by name.
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.field(name).and_then(T::from_value)
    }

    /// Set struct field; returns false when this is not a struct.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> bool {
        match self {
            Self::Struct(fields) => {
                fields.insert(name.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Name of the kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Char(_) => "char8",
            Self::WChar(_) => "char16",
            Self::I8(_) => "int8",
            Self::I16(_) => "int16",
            Self::I32(_) => "int32",
            Self::I64(_) => "int64",
            Self::U8(_) => "uint8",
            Self::U16(_) => "uint16",
            Self::U32(_) => "uint32",
            Self::U64(_) => "uint64",
            Self::F32(_) => "float32",
            Self::F64(_) => "float64",
            Self::String(_) => "string",
            Self::Struct(_) => "struct",
            Self::Sequence(_) => "sequence",
            Self::Array(_) => "array",
            Self::Enum(..) => "enum",
            Self::Bitmask(_) => "bitmask",
            Self::Union(_) => "union",
        }
    }
}

/// Conversion out of a [`Value`], for typed field access.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

/// Conversion into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

macro_rules! impl_value_conv {
    ($ty:ty, $variant:ident) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_value_conv!(bool, Bool);
impl_value_conv!(char, Char);
impl_value_conv!(i8, I8);
impl_value_conv!(i16, I16);
impl_value_conv!(i32, I32);
impl_value_conv!(i64, I64);
impl_value_conv!(u8, U8);
impl_value_conv!(u16, U16);
impl_value_conv!(u32, U32);
impl_value_conv!(u64, U64);
impl_value_conv!(f32, F32);
impl_value_conv!(f64, F64);

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<UnionValue> for Value {
    fn from(v: UnionValue) -> Self {
        Self::Union(Box::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Sequence(v.into_iter().map(Into::into).collect())
    }
}
