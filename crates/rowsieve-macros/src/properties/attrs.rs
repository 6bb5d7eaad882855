//! Attribute parsing for the Properties derive macro.
//!
//! This module parses the `#[prop(...)]` field attributes used by the
//! `Properties` derive macro.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Lit, Meta, Result, Token,
};

/// Field-level attributes from `#[prop(...)]`.
#[derive(Debug, Clone)]
pub struct PropAttr {
    /// Leave this field out of the registration.
    pub skip: bool,
    /// Register a read accessor only.
    pub readonly: bool,
    /// Writes to this property are skipped.
    pub version: bool,
    /// Boolean read under the `is_` convention.
    pub flag: bool,
    /// The field is itself a registered row type.
    pub nested: bool,
    /// Property name (default: field name).
    pub rename: Option<String>,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for PropAttr {
    fn default() -> Self {
        PropAttr {
            skip: false,
            readonly: false,
            version: false,
            flag: false,
            nested: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for PropAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = PropAttr {
            span: input.span(),
            ..PropAttr::default()
        };

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) => {
                    let flag = if p.is_ident("skip") {
                        &mut attr.skip
                    } else if p.is_ident("readonly") {
                        &mut attr.readonly
                    } else if p.is_ident("version") {
                        &mut attr.version
                    } else if p.is_ident("flag") {
                        &mut attr.flag
                    } else if p.is_ident("nested") {
                        &mut attr.nested
                    } else {
                        return Err(Error::new(
                            p.span(),
                            "unknown prop attribute. Expected: skip, readonly, version, flag, nested, or rename = \"...\"",
                        ));
                    };
                    *flag = true;
                }

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    {
                        if s.value().is_empty() || s.value().contains('.') {
                            return Err(Error::new(
                                s.span(),
                                "rename must be a non-empty name without '.'",
                            ));
                        }
                        attr.rename = Some(s.value());
                    } else {
                        return Err(Error::new(
                            nv.value.span(),
                            "rename must be a string literal",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown prop attribute. Expected: skip, readonly, version, flag, nested, or rename = \"...\"",
                    ));
                }
            }
        }

        attr.validate()?;
        Ok(attr)
    }
}

impl PropAttr {
    fn validate(&self) -> Result<()> {
        if self.nested && (self.flag || self.version || self.readonly) {
            return Err(Error::new(
                self.span,
                "nested cannot be combined with flag, version or readonly",
            ));
        }
        if self.flag && self.version {
            return Err(Error::new(self.span, "a flag cannot be a version property"));
        }
        Ok(())
    }
}

/// Extract `#[prop(...)]` attributes from a field's attributes.
pub fn parse_prop_attrs(attrs: &[Attribute]) -> Result<PropAttr> {
    for attr in attrs {
        if attr.path().is_ident("prop") {
            return attr.parse_args::<PropAttr>();
        }
    }
    Ok(PropAttr::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_prop(tokens: &str) -> Result<PropAttr> {
        syn::parse_str::<PropAttr>(tokens)
    }

    #[test]
    fn test_prop_empty() {
        let attr = parse_prop("").unwrap();
        assert!(!attr.skip);
        assert!(!attr.readonly);
        assert_eq!(attr.rename, None);
    }

    #[test]
    fn test_prop_skip() {
        assert!(parse_prop("skip").unwrap().skip);
    }

    #[test]
    fn test_prop_flags_combine() {
        let attr = parse_prop("readonly, version").unwrap();
        assert!(attr.readonly);
        assert!(attr.version);
        assert!(!attr.flag);
    }

    #[test]
    fn test_prop_rename() {
        let attr = parse_prop(r#"flag, rename = "enabled""#).unwrap();
        assert!(attr.flag);
        assert_eq!(attr.rename, Some("enabled".to_string()));
    }

    #[test]
    fn test_prop_rename_rejects_dots() {
        let err = parse_prop(r#"rename = "a.b""#).unwrap_err();
        assert!(err.to_string().contains("without '.'"));
    }

    #[test]
    fn test_prop_nested_conflicts() {
        let err = parse_prop("nested, flag").unwrap_err();
        assert!(err.to_string().contains("nested cannot be combined"));
    }

    #[test]
    fn test_prop_unknown() {
        let err = parse_prop("writable").unwrap_err();
        assert!(err.to_string().contains("unknown prop attribute"));
    }
}
