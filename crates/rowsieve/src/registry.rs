//! Accessor registry keyed by row type and property name.
//!
//! Every row type that filters or sorts touch is registered once, either by
//! hand through [`PropertyResolver::register`] or by the
//! `#[derive(Properties)]` macro. A registration is a table of plain function
//! pointers; the resolver chains them along dotted paths.
//!
//! ```
//! use rowsieve::{PropertyResolver, PropertyPath, Value, ValueKind, FromDatum};
//!
//! struct City {
//!     name: String,
//! }
//!
//! let mut resolver = PropertyResolver::new();
//! resolver.register::<City>().property(
//!     "name",
//!     ValueKind::String,
//!     |city| Value::str(&city.name),
//!     |city, value| {
//!         city.name = String::from_datum(value)?;
//!         Ok(())
//!     },
//! );
//!
//! let city = City { name: "Ankh-Morpork".into() };
//! let value = resolver.resolve(&city, &PropertyPath::from("name")).unwrap();
//! assert_eq!(value.as_str(), Some("Ankh-Morpork"));
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;

use crate::error::Result;
use crate::traits::Properties;
use crate::value::{Datum, PropertyType, Value, ValueKind};

/// Read accessor: borrows a property value from a row.
pub type ReadFn<T> = for<'a> fn(&'a T) -> Value<'a>;

/// Write accessor: stores an already type-checked datum into a row.
pub type WriteFn<T> = fn(&mut T, Datum) -> Result<()>;

/// Boolean accessor registered under the alternate `is_` naming convention.
pub type FlagFn<T> = fn(&T) -> bool;

/// Mutable access to a nested row, `None` when the nested row is absent.
pub type NestedMutFn<T> = for<'a> fn(&'a mut T) -> Option<&'a mut dyn Any>;

/// Prefix of the alternate boolean accessor naming convention.
pub const FLAG_PREFIX: &str = "is_";

trait ErasedRead: Send + Sync {
    fn read<'a>(&self, row: &'a dyn Any) -> Option<Value<'a>>;
}

trait ErasedWrite: Send + Sync {
    fn write(&self, row: &mut dyn Any, value: Datum) -> Option<Result<()>>;
}

trait ErasedFlag: Send + Sync {
    fn read(&self, row: &dyn Any) -> Option<bool>;
}

trait ErasedNested: Send + Sync {
    fn get_mut<'a>(&self, row: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>>;
}

struct TypedRead<T>(ReadFn<T>);

impl<T: Any> ErasedRead for TypedRead<T> {
    fn read<'a>(&self, row: &'a dyn Any) -> Option<Value<'a>> {
        row.downcast_ref::<T>().map(self.0)
    }
}

struct TypedWrite<T>(WriteFn<T>);

impl<T: Any> ErasedWrite for TypedWrite<T> {
    fn write(&self, row: &mut dyn Any, value: Datum) -> Option<Result<()>> {
        row.downcast_mut::<T>().map(|row| (self.0)(row, value))
    }
}

struct TypedFlag<T>(FlagFn<T>);

impl<T: Any> ErasedFlag for TypedFlag<T> {
    fn read(&self, row: &dyn Any) -> Option<bool> {
        row.downcast_ref::<T>().map(self.0)
    }
}

struct TypedNested<T>(NestedMutFn<T>);

impl<T: Any> ErasedNested for TypedNested<T> {
    fn get_mut<'a>(&self, row: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        row.downcast_mut::<T>().map(self.0)
    }
}

/// The accessors registered for one property name.
#[derive(Default)]
pub struct Accessor {
    reader: Option<(PropertyType, Box<dyn ErasedRead>)>,
    writer: Option<(PropertyType, Box<dyn ErasedWrite>)>,
    nested: Option<Box<dyn ErasedNested>>,
    version: bool,
}

impl Accessor {
    /// Declared type of the read accessor, if one is registered.
    pub fn read_type(&self) -> Option<PropertyType> {
        self.reader.as_ref().map(|(ty, _)| *ty)
    }

    /// Declared type of the write accessor, if one is registered.
    pub fn write_type(&self) -> Option<PropertyType> {
        self.writer.as_ref().map(|(ty, _)| *ty)
    }

    /// Returns `true` if this property is a concurrency/version token.
    pub fn is_version(&self) -> bool {
        self.version
    }

    /// Returns `true` if writes can descend into this property.
    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    pub(crate) fn read<'a>(&self, row: &'a dyn Any) -> Option<Value<'a>> {
        self.reader.as_ref().and_then(|(_, reader)| reader.read(row))
    }

    pub(crate) fn write(&self, row: &mut dyn Any, value: Datum) -> Option<Result<()>> {
        self.writer
            .as_ref()
            .and_then(|(_, writer)| writer.write(row, value))
    }

    pub(crate) fn nested_mut<'a>(&self, row: &'a mut dyn Any) -> Option<Option<&'a mut dyn Any>> {
        self.nested.as_ref().and_then(|nested| nested.get_mut(row))
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("read_type", &self.read_type())
            .field("write_type", &self.write_type())
            .field("nested", &self.is_nested())
            .field("version", &self.version)
            .finish()
    }
}

/// All accessors registered for one row type.
pub(crate) struct TypeAccessors {
    pub(crate) type_name: &'static str,
    pub(crate) properties: BTreeMap<String, Accessor>,
    flags: BTreeMap<String, Box<dyn ErasedFlag>>,
}

impl TypeAccessors {
    fn new(type_name: &'static str) -> Self {
        TypeAccessors {
            type_name,
            properties: BTreeMap::new(),
            flags: BTreeMap::new(),
        }
    }

    /// Flag lookup: `name` under the `is_` convention first, then verbatim.
    fn flag(&self, name: &str) -> Option<&dyn ErasedFlag> {
        self.flags
            .get(&format!("{}{}", FLAG_PREFIX, name))
            .or_else(|| self.flags.get(name))
            .map(|flag| flag.as_ref())
    }

    /// Property names backed by a flag reader, with the `is_` prefix removed.
    fn flag_properties(&self) -> impl Iterator<Item = &str> {
        self.flags
            .keys()
            .map(|name| name.strip_prefix(FLAG_PREFIX).unwrap_or(name))
    }
}

/// Registry of property accessors and the dotted-path resolver built on it.
///
/// The registry is filled once at start-up and then shared read-only,
/// typically behind an `Arc`.
#[derive(Default)]
pub struct PropertyResolver {
    pub(crate) types: HashMap<TypeId, TypeAccessors>,
}

impl PropertyResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        PropertyResolver::default()
    }

    /// Starts (or extends) the registration of row type `T`.
    pub fn register<T: Any>(&mut self) -> Registration<'_, T> {
        let accessors = self
            .types
            .entry(TypeId::of::<T>())
            .or_insert_with(|| TypeAccessors::new(type_name::<T>()));
        Registration {
            accessors,
            _row: PhantomData,
        }
    }

    /// Registers `T` through its [`Properties`] implementation, once.
    pub fn register_type<T: Properties>(&mut self) -> &mut Self {
        if !self.is_registered::<T>() {
            T::register_properties(self);
        }
        self
    }

    /// Builder-style variant of [`register_type`](Self::register_type).
    pub fn with_type<T: Properties>(mut self) -> Self {
        self.register_type::<T>();
        self
    }

    /// Returns `true` if `T` has been registered.
    pub fn is_registered<T: Any>(&self) -> bool {
        self.types.contains_key(&TypeId::of::<T>())
    }

    /// Looks up the accessors of `name` on the type identified by `type_id`.
    pub fn lookup(&self, type_id: TypeId, name: &str) -> Option<&Accessor> {
        self.types
            .get(&type_id)
            .and_then(|accessors| accessors.properties.get(name))
    }

    /// Reads the boolean fallback accessor of `name` on `row`, if one exists.
    pub fn lookup_flag(&self, row: &dyn Any, name: &str) -> Option<bool> {
        self.types
            .get(&row.type_id())
            .and_then(|accessors| accessors.flag(name))
            .and_then(|flag| flag.read(row))
    }

    pub(crate) fn type_accessors(&self, type_id: TypeId) -> Option<&TypeAccessors> {
        self.types.get(&type_id)
    }

    /// Names readable through a flag accessor on the type `type_id`.
    pub(crate) fn flag_names(&self, type_id: TypeId) -> Vec<&str> {
        self.types
            .get(&type_id)
            .map(|accessors| accessors.flag_properties().collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for PropertyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.types.values().map(|t| t.type_name).collect();
        names.sort_unstable();
        f.debug_struct("PropertyResolver")
            .field("types", &names)
            .finish()
    }
}

/// Builder returned by [`PropertyResolver::register`].
///
/// Each call inserts immediately; re-registering a name replaces the
/// previous accessor of the same role.
pub struct Registration<'r, T> {
    accessors: &'r mut TypeAccessors,
    _row: PhantomData<fn() -> T>,
}

impl<T: Any> Registration<'_, T> {
    fn slot(&mut self, name: &str) -> &mut Accessor {
        self.accessors.properties.entry(name.to_string()).or_default()
    }

    /// Registers a read accessor.
    pub fn reader(mut self, name: &str, ty: impl Into<PropertyType>, read: ReadFn<T>) -> Self {
        self.slot(name).reader = Some((ty.into(), Box::new(TypedRead(read))));
        self
    }

    /// Registers a write accessor.
    pub fn writer(mut self, name: &str, ty: impl Into<PropertyType>, write: WriteFn<T>) -> Self {
        self.slot(name).writer = Some((ty.into(), Box::new(TypedWrite(write))));
        self
    }

    /// Registers a read/write property pair of the same declared type.
    pub fn property(
        self,
        name: &str,
        ty: impl Into<PropertyType>,
        read: ReadFn<T>,
        write: WriteFn<T>,
    ) -> Self {
        let ty = ty.into();
        self.reader(name, ty, read).writer(name, ty, write)
    }

    /// Registers a boolean accessor under the alternate naming convention.
    ///
    /// `name` is stored as given; lookups for `active` find `is_active`.
    pub fn flag(mut self, name: &str, read: FlagFn<T>) -> Self {
        self.accessors
            .flags
            .insert(name.to_string(), Box::new(TypedFlag(read)));
        self
    }

    /// Registers a nested row: readable as [`Value::Object`] and
    /// traversable by writes to dotted paths.
    pub fn nested(mut self, name: &str, read: ReadFn<T>, get_mut: NestedMutFn<T>) -> Self {
        let slot = self.slot(name);
        slot.reader = Some((
            PropertyType::optional(ValueKind::Object),
            Box::new(TypedRead(read)),
        ));
        slot.nested = Some(Box::new(TypedNested(get_mut)));
        self
    }

    /// Marks `name` as a version token: writes to it are silently skipped.
    pub fn version(mut self, name: &str) -> Self {
        self.slot(name).version = true;
        self
    }
}
