//! Traits for derive macro support.
//!
//! [`Properties`] is implemented by `#[derive(Properties)]` (or by hand) to
//! register a row type's accessors. [`ToValue`] and [`FromDatum`] convert
//! field types to and from the runtime value model; the generated accessors
//! are thin calls into them.

use std::any::Any;

use crate::error::{Result, SieveError};
use crate::registry::PropertyResolver;
use crate::value::{Datum, Number, PropertyType, Timestamp, Value, ValueKind};

/// A row type whose properties can be registered with a [`PropertyResolver`].
///
/// # Derive Usage
///
/// ```ignore
/// use rowsieve::Properties;
///
/// #[derive(Properties)]
/// struct Wizard {
///     name: String,
///     #[prop(nested)]
///     office: Option<Office>,
///     #[prop(version)]
///     revision: u64,
/// }
/// ```
///
/// # Manual Implementation
///
/// ```
/// use rowsieve::{Properties, PropertyResolver, ToValue, ValueKind};
///
/// struct Wizard {
///     name: String,
/// }
///
/// impl Properties for Wizard {
///     fn register_properties(resolver: &mut PropertyResolver) {
///         resolver
///             .register::<Self>()
///             .reader("name", ValueKind::String, |w| w.name.to_value());
///     }
/// }
///
/// let resolver = PropertyResolver::new().with_type::<Wizard>();
/// assert!(resolver.is_registered::<Wizard>());
/// ```
pub trait Properties: Any {
    /// Registers this type's accessors (and those of nested row types).
    fn register_properties(resolver: &mut PropertyResolver);
}

/// Conversion of a field into a borrowed [`Value`].
pub trait ToValue {
    /// Declared type of a property holding this field type.
    const TYPE: PropertyType;

    /// Borrows the field as a value.
    fn to_value(&self) -> Value<'_>;
}

/// Conversion of an owned [`Datum`] into a field type.
///
/// Failures are reported as [`SieveError::TypeMismatch`] with an empty
/// path; the resolver fills in the path being assigned.
pub trait FromDatum: Sized {
    fn from_datum(datum: Datum) -> Result<Self>;
}

pub(crate) fn mismatch(expected: &str, datum: &Datum) -> SieveError {
    SieveError::TypeMismatch {
        path: String::new(),
        expected: expected.to_string(),
        actual: datum.kind_name().to_string(),
    }
}

impl ToValue for String {
    const TYPE: PropertyType = PropertyType::required(ValueKind::String);

    fn to_value(&self) -> Value<'_> {
        Value::str(self)
    }
}

impl FromDatum for String {
    fn from_datum(datum: Datum) -> Result<Self> {
        match datum {
            Datum::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl ToValue for bool {
    const TYPE: PropertyType = PropertyType::required(ValueKind::Bool);

    fn to_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

impl FromDatum for bool {
    fn from_datum(datum: Datum) -> Result<Self> {
        match datum {
            Datum::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl ToValue for Timestamp {
    const TYPE: PropertyType = PropertyType::required(ValueKind::Timestamp);

    fn to_value(&self) -> Value<'_> {
        Value::Timestamp(*self)
    }
}

impl FromDatum for Timestamp {
    fn from_datum(datum: Datum) -> Result<Self> {
        match datum {
            Datum::Timestamp(t) => Ok(t),
            other => Err(mismatch("timestamp", &other)),
        }
    }
}

impl ToValue for Number {
    const TYPE: PropertyType = PropertyType::required(ValueKind::Number);

    fn to_value(&self) -> Value<'_> {
        Value::Number(*self)
    }
}

impl FromDatum for Number {
    fn from_datum(datum: Datum) -> Result<Self> {
        match datum {
            Datum::Number(n) => Ok(n),
            other => Err(mismatch("number", &other)),
        }
    }
}

// Integers accept any number with an integral value in range.
macro_rules! integer_field {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                const TYPE: PropertyType = PropertyType::required(ValueKind::Number);

                fn to_value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }

            impl FromDatum for $t {
                fn from_datum(datum: Datum) -> Result<Self> {
                    match &datum {
                        Datum::Number(n) => n
                            .to_i128()
                            .and_then(|wide| <$t>::try_from(wide).ok())
                            .ok_or_else(|| mismatch(stringify!($t), &datum)),
                        _ => Err(mismatch(stringify!($t), &datum)),
                    }
                }
            }
        )*
    };
}

integer_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! float_field {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                const TYPE: PropertyType = PropertyType::required(ValueKind::Number);

                fn to_value(&self) -> Value<'_> {
                    Value::Number(Number::from(*self))
                }
            }

            impl FromDatum for $t {
                fn from_datum(datum: Datum) -> Result<Self> {
                    match datum {
                        Datum::Number(n) => Ok(n.to_f64() as $t),
                        other => Err(mismatch(stringify!($t), &other)),
                    }
                }
            }
        )*
    };
}

float_field!(f32, f64);

impl<T: ToValue> ToValue for Option<T> {
    const TYPE: PropertyType = PropertyType::optional(T::TYPE.kind);

    fn to_value(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromDatum> FromDatum for Option<T> {
    fn from_datum(datum: Datum) -> Result<Self> {
        match datum {
            Datum::Null => Ok(None),
            other => T::from_datum(other).map(Some),
        }
    }
}
