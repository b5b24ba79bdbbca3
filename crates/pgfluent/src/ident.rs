//! Safe SQL identifier handling.
//!
//! Every table and column name that reaches generated SQL goes through [`Ident`].
//! Parts are always rendered double-quoted, so mixed-case names (`"createdAt"`) keep their
//! case and reserved words (`"order"`, `"user"`) never collide with keywords.
//!
//! - Unquoted input parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted input parts allow any characters except NUL; `"` is escaped as `""`
//!
//! # Example
//! ```ignore
//! use pgfluent::Ident;
//!
//! assert_eq!(Ident::parse("createdAt")?.to_sql(), r#""createdAt""#);
//! assert_eq!(Ident::parse("public.videos")?.to_sql(), r#""public"."videos""#);
//! # Ok::<(), pgfluent::DbError>(())
//! ```

use crate::error::{DbError, DbResult};

/// A SQL identifier (column, table, or schema name).
///
/// Supports dotted notation (e.g., `schema.table`) and quoted parts
/// (e.g., `"Weird Name"."User"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Mixed: `public."User Table".id`
    pub fn parse(s: &str) -> DbResult<Self> {
        if s.is_empty() {
            return Err(DbError::invalid("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(DbError::invalid("identifier cannot contain NUL character"));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(DbError::invalid(format!(
                                "trailing '.' in identifier {s:?}"
                            )));
                        }
                    }
                    Some(c) => {
                        return Err(DbError::invalid(format!(
                            "expected '.' between identifier parts in {s:?}, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(DbError::invalid(format!(
                                "unclosed quoted identifier {s:?}"
                            )));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(DbError::invalid("empty quoted identifier"));
                }
                parts.push(name);
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(DbError::invalid(format!(
                        "invalid character '{c}' in identifier {s:?}"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(DbError::invalid(format!("empty identifier segment in {s:?}")));
            }
            parts.push(name);
        }

        Ok(Self { parts })
    }

    /// The unquoted name of the last part (the column or table itself).
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// Render the identifier as SQL, every part double-quoted.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(|p| p.len() + 3).sum();
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('"');
            for ch in part.chars() {
                if ch == '"' {
                    out.push_str("\"\"");
                } else {
                    out.push(ch);
                }
            }
            out.push('"');
        }
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> DbResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> DbResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> DbResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(self)
    }
}
