//! Proc macros for rowsieve.
//!
//! # Available Macros
//!
//! - [`Properties`] - Register a struct's fields as filterable, sortable
//!   properties with a `PropertyResolver`
//!
//! The derive is re-exported by `rowsieve` behind its `derive` feature, so
//! most users never depend on this crate directly.

mod properties;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Properties` trait for row structs.
///
/// Each named field becomes a property registered with the resolver under
/// the field's name. Field types must implement `ToValue` for reading and
/// `FromDatum` for writing; the crate provides both for strings, booleans,
/// numbers, timestamps and their `Option` forms.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Leave the field out |
/// | `rename = "..."` | Register under a custom name |
/// | `readonly` | Register a read accessor only |
/// | `version` | Reads work, writes are silently skipped |
/// | `flag` | Boolean read registered as `is_<name>`, write as `<name>` |
/// | `nested` | The field (or `Option` of it) is a row type that also derives `Properties` |
///
/// # Generated Code
///
/// The macro generates:
///
/// 1. Property name constants (e.g., `Wizard::NAME`, `Wizard::OFFICE`)
/// 2. Implementation of `Properties::register_properties()`, which also
///    registers the types of nested fields
///
/// # Example
///
/// ```ignore
/// use rowsieve::{PropertyPath, PropertyResolver, Properties};
///
/// #[derive(Properties)]
/// struct Office {
///     room: String,
/// }
///
/// #[derive(Properties)]
/// struct Wizard {
///     name: String,
///     #[prop(flag)]
///     tenured: bool,
///     #[prop(version)]
///     revision: u64,
///     #[prop(nested)]
///     office: Option<Office>,
///     #[prop(skip)]
///     scratch: Vec<u8>,
/// }
///
/// let resolver = PropertyResolver::new().with_type::<Wizard>();
/// let wizard = Wizard {
///     name: "Ridcully".into(),
///     tenured: true,
///     revision: 1,
///     office: Some(Office { room: "Great Hall".into() }),
///     scratch: Vec::new(),
/// };
/// let room = resolver.resolve(&wizard, &PropertyPath::from("office.room")).unwrap();
/// assert_eq!(room.as_str(), Some("Great Hall"));
/// assert_eq!(Wizard::TENURED, "tenured");
/// ```
#[proc_macro_derive(Properties, attributes(prop))]
pub fn properties_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    properties::properties_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
