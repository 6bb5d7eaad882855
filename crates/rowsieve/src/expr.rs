//! Backend filter expressions.
//!
//! [`Expr`] is what [`Filter::compile`](crate::Filter::compile) produces for
//! pushed-down tables. The core builds and forwards it; interpreting it is
//! the row source's job. The `Display` form is SQL-like and meant for logs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::PropertyPath;

/// Escape character used in generated `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// A compiled filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Always true.
    True,
    /// Always false.
    False,
    /// The property's string form equals `value`.
    Eq { path: PropertyPath, value: String },
    /// Case-insensitive `LIKE`, escaped with [`LIKE_ESCAPE`].
    ILike { path: PropertyPath, pattern: String },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Backend-specific fragment passed through untouched.
    Native(String),
}

impl Expr {
    /// Equality expression.
    pub fn equals(path: impl Into<PropertyPath>, value: impl Into<String>) -> Self {
        Expr::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    /// `ILIKE` expression with an already escaped pattern.
    pub fn ilike(path: impl Into<PropertyPath>, pattern: impl Into<String>) -> Self {
        Expr::ILike {
            path: path.into(),
            pattern: pattern.into(),
        }
    }

    /// Conjunction. `True` operands are dropped, a `False` operand absorbs
    /// the rest, and a single operand is returned unwrapped.
    pub fn all(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut parts = Vec::new();
        for expr in exprs {
            match expr {
                Expr::True => {}
                Expr::False => return Expr::False,
                Expr::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Expr::True,
            1 => parts.pop().unwrap_or(Expr::True),
            _ => Expr::And(parts),
        }
    }

    /// Disjunction, simplified like [`Expr::all`] with the roles of `True`
    /// and `False` swapped.
    pub fn any(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut parts = Vec::new();
        for expr in exprs {
            match expr {
                Expr::False => {}
                Expr::True => return Expr::True,
                Expr::Or(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Expr::False,
            1 => parts.pop().unwrap_or(Expr::False),
            _ => Expr::Or(parts),
        }
    }

    /// Negation, folding constants and double negation.
    pub fn negate(expr: Expr) -> Self {
        match expr {
            Expr::True => Expr::False,
            Expr::False => Expr::True,
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    /// Returns `true` for the constant `True`.
    pub fn is_true(&self) -> bool {
        matches!(self, Expr::True)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::True => f.write_str("TRUE"),
            Expr::False => f.write_str("FALSE"),
            Expr::Eq { path, value } => write!(f, "{} = '{}'", path, value.replace('\'', "''")),
            Expr::ILike { path, pattern } => {
                write!(f, "{} ILIKE '{}'", path, pattern.replace('\'', "''"))
            }
            Expr::And(parts) => join(f, parts, " AND "),
            Expr::Or(parts) => join(f, parts, " OR "),
            Expr::Not(inner) => write!(f, "NOT ({})", inner),
            Expr::Native(native) => f.write_str(native),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, parts: &[Expr], sep: &str) -> fmt::Result {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "({})", part)?;
    }
    Ok(())
}

/// Escapes `LIKE` wildcards and the escape character itself.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text.chars());
    out
}

fn push_escaped(out: &mut String, chars: impl Iterator<Item = char>) {
    for c in chars {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
}

/// Pattern for a case-insensitive containment search.
pub fn search_to_like(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

/// Approximates a regular expression as a `LIKE` pattern.
///
/// Only `.*` and `.` carry over, as `%` and `_`. Every other character is
/// taken literally.
pub fn regex_to_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '.' {
            if chars.next_if_eq(&'*').is_some() {
                out.push('%');
            } else {
                out.push('_');
            }
        } else {
            push_escaped(&mut out, std::iter::once(c));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjunction_simplifies() {
        assert_eq!(Expr::all(Vec::<Expr>::new()), Expr::True);
        assert_eq!(Expr::all([Expr::True, Expr::equals("a", "1")]), Expr::equals("a", "1"));
        assert_eq!(
            Expr::all([Expr::equals("a", "1"), Expr::False, Expr::equals("b", "2")]),
            Expr::False
        );
        assert_eq!(
            Expr::all([
                Expr::all([Expr::equals("a", "1"), Expr::equals("b", "2")]),
                Expr::equals("c", "3")
            ]),
            Expr::And(vec![
                Expr::equals("a", "1"),
                Expr::equals("b", "2"),
                Expr::equals("c", "3")
            ])
        );
    }

    #[test]
    fn disjunction_simplifies() {
        assert_eq!(Expr::any(Vec::<Expr>::new()), Expr::False);
        assert_eq!(Expr::any([Expr::equals("a", "1"), Expr::True]), Expr::True);
        assert_eq!(Expr::any([Expr::False, Expr::equals("a", "1")]), Expr::equals("a", "1"));
    }

    #[test]
    fn negation_folds() {
        assert_eq!(Expr::negate(Expr::True), Expr::False);
        assert_eq!(Expr::negate(Expr::negate(Expr::equals("a", "1"))), Expr::equals("a", "1"));
    }

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(search_to_like("rid"), "%rid%");
        assert_eq!(search_to_like("a%"), "%a\\%%");
    }

    #[test]
    fn regex_translation() {
        assert_eq!(regex_to_like("Rid.*"), "Rid%");
        assert_eq!(regex_to_like("a.c"), "a_c");
        assert_eq!(regex_to_like(".*x.*"), "%x%");
        assert_eq!(regex_to_like("100%"), "100\\%");
    }

    #[test]
    fn display_is_readable() {
        let expr = Expr::negate(Expr::any([
            Expr::equals("name", "O'Brien"),
            Expr::ilike("email", "%x%"),
        ]));
        assert_eq!(
            expr.to_string(),
            "NOT ((name = 'O''Brien') OR (email ILIKE '%x%'))"
        );
    }
}
