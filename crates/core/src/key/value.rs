use std::any::{type_name, Any};
use std::fmt;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::storage::{RepositoryError, Result};

/// The closed set of scalar kinds a key attribute can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    String,
    Int32,
    Int64,
    Double,
    Boolean,
}

impl KeyKind {
    pub fn type_name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::Double => "f64",
            Self::Boolean => "bool",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A type usable as a repository's partition or sort key parameter.
///
/// `KIND` is checked against the entity's key field when a repository is
/// constructed. The value itself is encoded through [`to_native_value`] on
/// every call, so a type claiming a kind it cannot be encoded as is
/// rejected on first use.
pub trait KeyType: fmt::Debug + Send + Sync + 'static {
    /// `None` marks the absence of a sort key.
    const KIND: Option<KeyKind>;

    fn type_name() -> &'static str {
        short_type_name::<Self>()
    }
}

impl KeyType for String {
    const KIND: Option<KeyKind> = Some(KeyKind::String);

    fn type_name() -> &'static str {
        "String"
    }
}

impl KeyType for i32 {
    const KIND: Option<KeyKind> = Some(KeyKind::Int32);
}

impl KeyType for i64 {
    const KIND: Option<KeyKind> = Some(KeyKind::Int64);
}

impl KeyType for f64 {
    const KIND: Option<KeyKind> = Some(KeyKind::Double);
}

impl KeyType for bool {
    const KIND: Option<KeyKind> = Some(KeyKind::Boolean);
}

/// Sort key parameter for tables that have no sort key.
///
/// Uninhabited: it only exists at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSortKey {}

impl KeyType for NoSortKey {
    const KIND: Option<KeyKind> = None;
}

/// A typed key scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Boolean(bool),
}

impl KeyValue {
    pub fn kind(&self) -> KeyKind {
        match self {
            Self::String(_) => KeyKind::String,
            Self::Int32(_) => KeyKind::Int32,
            Self::Int64(_) => KeyKind::Int64,
            Self::Double(_) => KeyKind::Double,
            Self::Boolean(_) => KeyKind::Boolean,
        }
    }

    /// Captures a runtime value of one of the allowed key types.
    pub fn from_any<T: Any>(value: &T) -> Result<Self> {
        let value = value as &dyn Any;
        if let Some(s) = value.downcast_ref::<String>() {
            Ok(Self::String(s.clone()))
        } else if let Some(s) = value.downcast_ref::<&'static str>() {
            Ok(Self::String((*s).to_string()))
        } else if let Some(i) = value.downcast_ref::<i32>() {
            Ok(Self::Int32(*i))
        } else if let Some(l) = value.downcast_ref::<i64>() {
            Ok(Self::Int64(*l))
        } else if let Some(d) = value.downcast_ref::<f64>() {
            Ok(Self::Double(*d))
        } else if let Some(b) = value.downcast_ref::<bool>() {
            Ok(Self::Boolean(*b))
        } else {
            Err(RepositoryError::unsupported_key_type(short_type_name::<T>()))
        }
    }

    /// Reads a key value of the expected kind from a stored attribute.
    pub fn from_attribute(attribute: &AttributeValue, kind: KeyKind) -> Result<Self> {
        let mismatch = || {
            RepositoryError::InvalidData(format!(
                "Key attribute {attribute:?} does not hold a {kind} value"
            ))
        };
        match attribute {
            AttributeValue::S(s) if kind == KeyKind::String => Ok(Self::String(s.clone())),
            AttributeValue::N(n) => match kind {
                KeyKind::Int32 => n.parse().map(Self::Int32).map_err(|_| mismatch()),
                KeyKind::Int64 => n.parse().map(Self::Int64).map_err(|_| mismatch()),
                KeyKind::Double => n.parse().map(Self::Double).map_err(|_| mismatch()),
                KeyKind::String | KeyKind::Boolean => Err(mismatch()),
            },
            AttributeValue::Bool(b) if kind == KeyKind::Boolean => Ok(Self::Boolean(*b)),
            AttributeValue::S(_) | AttributeValue::Bool(_) => Err(mismatch()),
            other => Err(RepositoryError::unsupported_key_type(attribute_type_name(
                other,
            ))),
        }
    }

    /// Encodes the value as a store attribute. Numbers use their canonical
    /// decimal text form.
    pub fn to_attribute_value(&self) -> Result<AttributeValue> {
        Ok(match self {
            Self::String(s) => AttributeValue::S(s.clone()),
            Self::Int32(i) => AttributeValue::N(i.to_string()),
            Self::Int64(l) => AttributeValue::N(l.to_string()),
            Self::Double(d) if d.is_finite() => AttributeValue::N(d.to_string()),
            Self::Double(d) => {
                return Err(RepositoryError::InvalidData(format!(
                    "{d} cannot be stored as a number"
                )))
            }
            Self::Boolean(b) => AttributeValue::Bool(*b),
        })
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int32(i) => write!(f, "{i}"),
            Self::Int64(l) => write!(f, "{l}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Converts a runtime key value into the store's attribute encoding.
///
/// Fails with [`RepositoryError::UnsupportedKeyType`] for anything outside
/// `String`, `i32`, `i64`, `f64` and `bool`.
pub fn to_native_value<T: Any>(value: &T) -> Result<AttributeValue> {
    KeyValue::from_any(value)?.to_attribute_value()
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(index) => &full[index + 2..],
        None => full,
    }
}

fn attribute_type_name(attribute: &AttributeValue) -> &'static str {
    match attribute {
        AttributeValue::B(_) => "Binary",
        AttributeValue::Bs(_) => "BinarySet",
        AttributeValue::L(_) => "List",
        AttributeValue::M(_) => "Map",
        AttributeValue::Ns(_) => "NumberSet",
        AttributeValue::Null(_) => "Null",
        AttributeValue::Ss(_) => "StringSet",
        AttributeValue::S(_) => "String",
        AttributeValue::N(_) => "Number",
        AttributeValue::Bool(_) => "Boolean",
        _ => "Unknown",
    }
}
