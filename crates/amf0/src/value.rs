//! AMF0 value types.

use std::borrow::Cow;

use crate::encoder::Amf0Encoder;
use crate::error::Result;

/// Represents any AMF0 object.
///
/// Objects and ECMA arrays are kept as ordered key-value pair lists because
/// the wire format is ordered and command handlers rely on reading properties
/// back in the order they were written.
pub type Amf0Object<'a> = Cow<'a, [(Cow<'a, str>, Amf0Value<'a>)]>;

/// Represents any AMF0 value.
#[derive(Debug, PartialEq, Clone)]
pub enum Amf0Value<'a> {
    /// AMF0 Number.
    Number(f64),
    /// AMF0 Boolean.
    Boolean(bool),
    /// AMF0 String.
    String(Cow<'a, str>),
    /// AMF0 Object.
    Object(Amf0Object<'a>),
    /// AMF0 Null.
    Null,
    /// AMF0 ECMA array.
    ///
    /// Decodes to the same pair list as an object but remembers that it was
    /// encoded with the ecma-array-marker so that it round-trips.
    EcmaArray(Amf0Object<'a>),
}

impl<'a> Amf0Value<'a> {
    /// Converts this AMF0 value into an owned version (static lifetime).
    pub fn into_owned(self) -> Amf0Value<'static> {
        match self {
            Amf0Value::Number(v) => Amf0Value::Number(v),
            Amf0Value::Boolean(v) => Amf0Value::Boolean(v),
            Amf0Value::String(v) => Amf0Value::String(Cow::Owned(v.into_owned())),
            Amf0Value::Object(v) => Amf0Value::Object(owned_object(v)),
            Amf0Value::Null => Amf0Value::Null,
            Amf0Value::EcmaArray(v) => Amf0Value::EcmaArray(owned_object(v)),
        }
    }

    /// Encode this value into the given writer.
    pub fn encode(&self, writer: &mut impl std::io::Write) -> Result<()> {
        match self {
            Amf0Value::Number(v) => Amf0Encoder::encode_number(writer, *v),
            Amf0Value::Boolean(v) => Amf0Encoder::encode_boolean(writer, *v),
            Amf0Value::String(v) => Amf0Encoder::encode_string(writer, v),
            Amf0Value::Object(v) => Amf0Encoder::encode_object(writer, v),
            Amf0Value::Null => Amf0Encoder::encode_null(writer),
            Amf0Value::EcmaArray(v) => Amf0Encoder::encode_ecma_array(writer, v),
        }
    }

    /// Returns the string slice if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Returns the number if this value is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the object pair list if this value is an object or ECMA array.
    pub fn as_object(&self) -> Option<&[(Cow<'a, str>, Amf0Value<'a>)]> {
        match self {
            Amf0Value::Object(o) | Amf0Value::EcmaArray(o) => Some(o.as_ref()),
            _ => None,
        }
    }

    /// Looks up a property by key if this value is an object or ECMA array.
    pub fn get(&self, key: &str) -> Option<&Amf0Value<'a>> {
        self.as_object()?.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

fn owned_object(object: Amf0Object<'_>) -> Amf0Object<'static> {
    Cow::Owned(
        object
            .into_owned()
            .into_iter()
            .map(|(k, v)| (Cow::Owned(k.into_owned()), v.into_owned()))
            .collect(),
    )
}

impl From<f64> for Amf0Value<'_> {
    fn from(value: f64) -> Self {
        Amf0Value::Number(value)
    }
}

impl From<bool> for Amf0Value<'_> {
    fn from(value: bool) -> Self {
        Amf0Value::Boolean(value)
    }
}

impl<'a> From<&'a str> for Amf0Value<'a> {
    fn from(value: &'a str) -> Self {
        Amf0Value::String(Cow::Borrowed(value))
    }
}

impl From<String> for Amf0Value<'_> {
    fn from(value: String) -> Self {
        Amf0Value::String(Cow::Owned(value))
    }
}

impl<'a> From<Amf0Object<'a>> for Amf0Value<'a> {
    fn from(value: Amf0Object<'a>) -> Self {
        Amf0Value::Object(value)
    }
}

impl<'a> FromIterator<(Cow<'a, str>, Amf0Value<'a>)> for Amf0Value<'a> {
    fn from_iter<T: IntoIterator<Item = (Cow<'a, str>, Amf0Value<'a>)>>(iter: T) -> Self {
        Amf0Value::Object(Cow::Owned(iter.into_iter().collect()))
    }
}
