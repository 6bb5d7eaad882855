//! Runtime value types for property access.
//!
//! [`Value`] is what a read accessor hands back: borrowed from the row where
//! possible, and able to point at a nested row for dotted paths. [`Datum`] is
//! the owned counterpart used for writes and stored in configuration.

use std::any::Any;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime value of a property, borrowed from the row it was read from.
///
/// # Example
///
/// ```
/// use rowsieve::{Number, Value};
///
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// fn name<'a>(person: &'a Person) -> Value<'a> {
///     Value::str(&person.name)
/// }
///
/// let p = Person { name: "Ridcully".into(), age: 70 };
/// assert_eq!(name(&p).as_str(), Some("Ridcully"));
/// assert_eq!(Value::Number(Number::from(p.age)).text().as_deref(), Some("70"));
/// ```
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// String value, borrowed or computed.
    String(Cow<'a, str>),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Boolean value.
    Bool(bool),
    /// Nested row. Its own properties are looked up by its concrete type.
    Object(&'a dyn Any),
    /// Absent or null.
    Null,
}

impl<'a> Value<'a> {
    /// Borrows a string slice as a value.
    pub fn str(s: &'a str) -> Self {
        Value::String(Cow::Borrowed(s))
    }

    /// Wraps a computed string.
    pub fn owned(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }

    /// Wraps an optional nested row, mapping `None` to [`Value::Null`].
    pub fn object<T: Any>(inner: Option<&'a T>) -> Self {
        match inner {
            Some(inner) => Value::Object(inner),
            None => Value::Null,
        }
    }

    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the kind of this value, or `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::String(_) => Some(ValueKind::String),
            Value::Number(_) => Some(ValueKind::Number),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Object(_) => Some(ValueKind::Object),
            Value::Null => None,
        }
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the timestamp value, if present.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extracts the nested row, if present.
    pub fn as_object(&self) -> Option<&'a dyn Any> {
        match self {
            Value::Object(o) => Some(*o),
            _ => None,
        }
    }

    /// String representation used by the text matchers.
    ///
    /// `Null` and nested rows have no text form.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s.as_ref())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Timestamp(t) => Some(Cow::Owned(t.as_millis().to_string())),
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Object(_) | Value::Null => None,
        }
    }

    /// Copies this value into an owned [`Datum`]. Nested rows have no owned form.
    pub fn to_datum(&self) -> Option<Datum> {
        match self {
            Value::String(s) => Some(Datum::String(s.to_string())),
            Value::Number(n) => Some(Datum::Number(*n)),
            Value::Timestamp(t) => Some(Datum::Timestamp(*t)),
            Value::Bool(b) => Some(Datum::Bool(*b)),
            Value::Null => Some(Datum::Null),
            Value::Object(_) => None,
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => std::ptr::eq(
                *a as *const dyn Any as *const (),
                *b as *const dyn Any as *const (),
            ),
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// The declared kind of a property or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Timestamp,
    Bool,
    Object,
}

impl ValueKind {
    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Bool => "bool",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of a property: its kind and whether it accepts null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyType {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl PropertyType {
    /// A property that never holds null.
    pub const fn required(kind: ValueKind) -> Self {
        PropertyType {
            kind,
            nullable: false,
        }
    }

    /// A property that may hold null.
    pub const fn optional(kind: ValueKind) -> Self {
        PropertyType {
            kind,
            nullable: true,
        }
    }

    /// Returns `true` if `datum` can be written to a property of this type.
    pub fn accepts(&self, datum: &Datum) -> bool {
        match datum.kind() {
            Some(kind) => kind == self.kind,
            None => self.nullable,
        }
    }

    /// Human readable form used in error messages.
    pub fn describe(&self) -> String {
        if self.nullable {
            format!("optional {}", self.kind)
        } else {
            self.kind.to_string()
        }
    }
}

impl From<ValueKind> for PropertyType {
    fn from(kind: ValueKind) -> Self {
        PropertyType::required(kind)
    }
}

/// Owned value used for property writes and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Bool(bool),
    Number(Number),
    String(String),
    Timestamp(Timestamp),
    Null,
}

impl Datum {
    /// Returns the kind of this datum, or `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Datum::String(_) => Some(ValueKind::String),
            Datum::Number(_) => Some(ValueKind::Number),
            Datum::Timestamp(_) => Some(ValueKind::Timestamp),
            Datum::Bool(_) => Some(ValueKind::Bool),
            Datum::Null => None,
        }
    }

    /// Name of this datum's kind, `"null"` for `Null`.
    pub fn kind_name(&self) -> &'static str {
        self.kind().map_or("null", ValueKind::as_str)
    }

    /// Returns `true` if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Borrows this datum as a [`Value`].
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Datum::String(s) => Value::str(s),
            Datum::Number(n) => Value::Number(*n),
            Datum::Timestamp(t) => Value::Timestamp(*t),
            Datum::Bool(b) => Value::Bool(*b),
            Datum::Null => Value::Null,
        }
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::String(s)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::String(s.to_string())
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Bool(b)
    }
}

impl From<Number> for Datum {
    fn from(n: Number) -> Self {
        Datum::Number(n)
    }
}

impl From<Timestamp> for Datum {
    fn from(t: Timestamp) -> Self {
        Datum::Timestamp(t)
    }
}

impl<T: Into<Datum>> From<Option<T>> for Datum {
    fn from(value: Option<T>) -> Self {
        value.map_or(Datum::Null, Into::into)
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision.
/// Comparisons between different variants go through `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Returns the integral value, if this number has one.
    ///
    /// Floats qualify only when finite with no fractional part.
    pub fn to_i128(self) -> Option<i128> {
        match self {
            Number::I64(n) => Some(n as i128),
            Number::U64(n) => Some(n as i128),
            Number::F64(n) if n.is_finite() && n.fract() == 0.0 => Some(n as i128),
            Number::F64(_) => None,
        }
    }

    /// Compares two numbers, handling mixed types.
    ///
    /// Integral values compare exactly; only a fractional float is compared
    /// through `f64`.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            _ => match (self.to_i128(), other.to_i128()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => self.to_f64().partial_cmp(&other.to_f64()),
            },
        }
    }

    /// Total order used for sorting: like [`Number::compare`], with NaN
    /// placed by `f64::total_cmp`.
    pub fn total_cmp(self, other: Number) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.to_f64().total_cmp(&other.to_f64()))
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{}", n),
            Number::U64(n) => write!(f, "{}", n),
            Number::F64(n) => write!(f, "{}", n),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(n: $t) -> Self {
                    Number::$variant(n as $wide)
                }
            }

            impl From<$t> for Datum {
                fn from(n: $t) -> Self {
                    Datum::Number(Number::from(n))
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f32, f64);

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// ```
/// use rowsieve::Timestamp;
///
/// assert!(Timestamp(1000) < Timestamp(2000));
/// assert_eq!(Timestamp::from_secs(2).as_millis(), 2000);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * 1000)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch.
    pub fn as_secs(self) -> i64 {
        self.0 / 1000
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}
