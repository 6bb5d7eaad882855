//! Dotted-path resolution over registered row types.
//!
//! Resolution walks a [`PropertyPath`] one segment at a time. Each segment is
//! looked up on the concrete type of the current row; a [`Value::Object`]
//! result becomes the row for the next segment.
//!
//! A null intermediate ends the walk with `Null` rather than an error, so
//! `manager.name` on a row without a manager reads as null.

use std::any::{Any, TypeId};
use std::collections::BTreeSet;

use tracing::trace;

use crate::error::{Result, SieveError};
use crate::path::{split_head, PropertyPath};
use crate::registry::PropertyResolver;
use crate::value::{Datum, Value, ValueKind};

impl PropertyResolver {
    /// Reads the value at `path` on `row`.
    ///
    /// # Errors
    ///
    /// [`SieveError::PropertyNotFound`] when a segment has neither a read
    /// accessor nor a boolean fallback, or when a non-object value is
    /// followed by more segments.
    pub fn resolve<'a, T: Any>(&self, row: &'a T, path: &PropertyPath) -> Result<Value<'a>> {
        self.resolve_dyn(row, path.as_str())
    }

    /// Type-erased form of [`resolve`](Self::resolve).
    pub fn resolve_dyn<'a>(&self, row: &'a dyn Any, path: &str) -> Result<Value<'a>> {
        let mut current = row;
        let mut rest = path;
        loop {
            let (head, tail) = split_head(rest);
            let value = self.read_segment(current, head, path)?;
            match (tail, value) {
                (None, value) => return Ok(value),
                (Some(_), Value::Null) => return Ok(Value::Null),
                (Some(tail), Value::Object(inner)) => {
                    current = inner;
                    rest = tail;
                }
                (Some(tail), _) => {
                    let (next, _) = split_head(tail);
                    return Err(self.not_found(current, path, next));
                }
            }
        }
    }

    fn read_segment<'a>(&self, row: &'a dyn Any, segment: &str, path: &str) -> Result<Value<'a>> {
        let type_id = row.type_id();
        if let Some(value) = self
            .lookup(type_id, segment)
            .and_then(|accessor| accessor.read(row))
        {
            return Ok(value);
        }
        match self.lookup_flag(row, segment) {
            Some(flag) => Ok(Value::Bool(flag)),
            None => Err(self.not_found(row, path, segment)),
        }
    }

    /// Writes `value` to the property at `path` on `row`.
    ///
    /// Writes through a null intermediate and writes to a version token are
    /// silently skipped.
    ///
    /// # Errors
    ///
    /// [`SieveError::PropertyNotFound`] when a segment has no accessor of the
    /// needed role, [`SieveError::TypeMismatch`] when `value` does not fit
    /// the declared type of the final property.
    pub fn assign<T: Any>(
        &self,
        row: &mut T,
        path: &PropertyPath,
        value: impl Into<Datum>,
    ) -> Result<()> {
        self.assign_dyn(row, path.as_str(), value.into())
    }

    /// Type-erased form of [`assign`](Self::assign).
    pub fn assign_dyn(&self, row: &mut dyn Any, path: &str, value: Datum) -> Result<()> {
        let mut current = row;
        let mut rest = path;
        loop {
            let (head, tail) = split_head(rest);
            let type_id = (*current).type_id();
            let accessor = match self.lookup(type_id, head) {
                Some(accessor) => accessor,
                None => return Err(self.not_found_on(type_id, path, head)),
            };

            let Some(tail) = tail else {
                if accessor.is_version() {
                    trace!(path, "skipping write to version property");
                    return Ok(());
                }
                let Some(declared) = accessor.write_type() else {
                    return Err(self.not_found_on(type_id, path, head));
                };
                if !declared.accepts(&value) {
                    return Err(SieveError::TypeMismatch {
                        path: path.to_string(),
                        expected: declared.describe(),
                        actual: value.kind_name().to_string(),
                    });
                }
                return match accessor.write(current, value) {
                    Some(result) => result.map_err(|err| with_path(err, path)),
                    None => Err(self.not_found_on(type_id, path, head)),
                };
            };

            match accessor.nested_mut(current) {
                Some(Some(inner)) => {
                    current = inner;
                    rest = tail;
                }
                Some(None) => {
                    trace!(path, segment = head, "nested row absent, write skipped");
                    return Ok(());
                }
                None => {
                    let (next, _) = split_head(tail);
                    return Err(self.not_found_on(type_id, path, next));
                }
            }
        }
    }

    /// Names of the read/write properties of `T`.
    ///
    /// A name qualifies only when a read accessor (standard or flag) and a
    /// write accessor are both registered with the same value kind.
    pub fn property_names<T: Any>(&self) -> BTreeSet<String> {
        self.property_names_of(TypeId::of::<T>())
    }

    /// Type-id form of [`property_names`](Self::property_names).
    pub fn property_names_of(&self, type_id: TypeId) -> BTreeSet<String> {
        let Some(accessors) = self.type_accessors(type_id) else {
            return BTreeSet::new();
        };
        let flags = self.flag_names(type_id);
        accessors
            .properties
            .iter()
            .filter(|(name, accessor)| {
                let Some(write) = accessor.write_type() else {
                    return false;
                };
                match accessor.read_type() {
                    Some(read) => read.kind == write.kind,
                    None => {
                        write.kind == ValueKind::Bool && flags.contains(&name.as_str())
                    }
                }
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn not_found(&self, row: &dyn Any, path: &str, segment: &str) -> SieveError {
        self.not_found_on(row.type_id(), path, segment)
    }

    fn not_found_on(&self, type_id: TypeId, path: &str, segment: &str) -> SieveError {
        SieveError::PropertyNotFound {
            type_name: self
                .type_accessors(type_id)
                .map_or("unregistered type", |accessors| accessors.type_name),
            path: path.to_string(),
            segment: segment.to_string(),
        }
    }
}

fn with_path(err: SieveError, full: &str) -> SieveError {
    match err {
        SieveError::TypeMismatch {
            path,
            expected,
            actual,
        } if path.is_empty() => SieveError::TypeMismatch {
            path: full.to_string(),
            expected,
            actual,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FromDatum, ToValue};
    use crate::value::PropertyType;

    struct Address {
        city: String,
    }

    struct Person {
        name: String,
        age: u32,
        active: bool,
        revision: u64,
        address: Option<Address>,
    }

    fn resolver() -> PropertyResolver {
        let mut resolver = PropertyResolver::new();
        resolver.register::<Address>().property(
            "city",
            ValueKind::String,
            |a| a.city.to_value(),
            |a, v| {
                a.city = String::from_datum(v)?;
                Ok(())
            },
        );
        resolver
            .register::<Person>()
            .property(
                "name",
                ValueKind::String,
                |p| p.name.to_value(),
                |p, v| {
                    p.name = String::from_datum(v)?;
                    Ok(())
                },
            )
            .property(
                "age",
                ValueKind::Number,
                |p| p.age.to_value(),
                |p, v| {
                    p.age = u32::from_datum(v)?;
                    Ok(())
                },
            )
            .flag("is_active", |p| p.active)
            .writer("active", ValueKind::Bool, |p, v| {
                p.active = bool::from_datum(v)?;
                Ok(())
            })
            .property(
                "revision",
                ValueKind::Number,
                |p| p.revision.to_value(),
                |p, v| {
                    p.revision = u64::from_datum(v)?;
                    Ok(())
                },
            )
            .version("revision")
            .reader("initial", PropertyType::optional(ValueKind::String), |p| {
                match p.name.chars().next() {
                    Some(c) => Value::owned(c.to_string()),
                    None => Value::Null,
                }
            })
            .nested(
                "address",
                |p| Value::object(p.address.as_ref()),
                |p| p.address.as_mut().map(|a| a as &mut dyn Any),
            );
        resolver
    }

    fn person() -> Person {
        Person {
            name: "Mustrum".into(),
            age: 70,
            active: true,
            revision: 3,
            address: Some(Address {
                city: "Ankh-Morpork".into(),
            }),
        }
    }

    #[test]
    fn resolves_simple_and_nested_paths() {
        let r = resolver();
        let p = person();
        assert_eq!(
            r.resolve(&p, &"name".into()).unwrap().as_str(),
            Some("Mustrum")
        );
        assert_eq!(
            r.resolve(&p, &"address.city".into()).unwrap().as_str(),
            Some("Ankh-Morpork")
        );
        assert_eq!(
            r.resolve(&p, &"initial".into()).unwrap().as_str(),
            Some("M")
        );
    }

    #[test]
    fn null_intermediate_short_circuits() {
        let r = resolver();
        let mut p = person();
        p.address = None;
        assert!(r.resolve(&p, &"address.city".into()).unwrap().is_null());
        assert!(r
            .resolve(&p, &"address.city.whatever".into())
            .unwrap()
            .is_null());
    }

    #[test]
    fn missing_property_fails() {
        let r = resolver();
        let p = person();
        let err = r.resolve(&p, &"salary".into()).unwrap_err();
        assert!(err.is_property_not_found());
        let err = r.resolve(&p, &"address.zip".into()).unwrap_err();
        match err {
            SieveError::PropertyNotFound { segment, path, .. } => {
                assert_eq!(segment, "zip");
                assert_eq!(path, "address.zip");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn descending_into_scalar_fails() {
        let r = resolver();
        let err = r.resolve(&person(), &"name.length".into()).unwrap_err();
        assert!(err.is_property_not_found());
    }

    #[test]
    fn boolean_fallback_accessor() {
        let r = resolver();
        let p = person();
        assert_eq!(r.resolve(&p, &"active".into()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn unregistered_type_fails() {
        let r = resolver();
        let err = r.resolve(&42u8, &"anything".into()).unwrap_err();
        assert!(err.to_string().contains("unregistered type"));
    }

    #[test]
    fn assigns_simple_and_nested() {
        let r = resolver();
        let mut p = person();
        r.assign(&mut p, &"name".into(), "Ponder").unwrap();
        r.assign(&mut p, &"address.city".into(), "Quirm").unwrap();
        r.assign(&mut p, &"active".into(), false).unwrap();
        assert_eq!(p.name, "Ponder");
        assert_eq!(p.address.as_ref().map(|a| a.city.as_str()), Some("Quirm"));
        assert!(!p.active);
    }

    #[test]
    fn assign_type_mismatch() {
        let r = resolver();
        let mut p = person();
        let err = r.assign(&mut p, &"age".into(), "old").unwrap_err();
        assert!(err.is_type_mismatch());
        let err = r.assign(&mut p, &"age".into(), -5i64).unwrap_err();
        match err {
            SieveError::TypeMismatch { path, .. } => assert_eq!(path, "age"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(p.age, 70);
    }

    #[test]
    fn assign_skips_version_property() {
        let r = resolver();
        let mut p = person();
        r.assign(&mut p, &"revision".into(), 99u64).unwrap();
        r.assign(&mut p, &"revision".into(), "not even a number").unwrap();
        assert_eq!(p.revision, 3);
    }

    #[test]
    fn assign_through_absent_nested_row_is_noop() {
        let r = resolver();
        let mut p = person();
        p.address = None;
        r.assign(&mut p, &"address.city".into(), "Quirm").unwrap();
        assert!(p.address.is_none());
    }

    #[test]
    fn assign_to_read_only_fails() {
        let r = resolver();
        let mut p = person();
        let err = r.assign(&mut p, &"initial".into(), "X").unwrap_err();
        assert!(err.is_property_not_found());
    }

    #[test]
    fn property_names_need_matching_reader_and_writer() {
        let r = resolver();
        let names: Vec<String> = r.property_names::<Person>().into_iter().collect();
        assert_eq!(names, vec!["active", "age", "name", "revision"]);
        assert!(r.property_names::<String>().is_empty());
    }
}
