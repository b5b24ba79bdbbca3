//! Segment binding.
//!
//! Serverless Postgres drivers take statements as template segments: `k + 1` literal strings
//! interleaved with `k` values. [`bind`] turns positional SQL (`$1`, `$2`, ...) plus a value list
//! into that shape, and [`BoundStatement`] can render it back to positional SQL for drivers
//! that speak the extended protocol directly.

use crate::error::{DbError, DbResult};
use crate::value::Value;

/// One literal SQL fragment followed by the value that belongs after it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSegment {
    pub literal: String,
    pub value: Value,
}

/// A statement in segment form: `[ {literal, value} ] + tail`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundStatement {
    pub segments: Vec<BoundSegment>,
    pub tail: String,
}

impl BoundStatement {
    /// All literal fragments in order, including the trailing one (`param_count() + 1` items).
    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .map(|s| s.literal.as_str())
            .chain(std::iter::once(self.tail.as_str()))
    }

    /// Bound values in segment order. A repeated placeholder yields its value repeatedly.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.segments.iter().map(|s| &s.value)
    }

    pub fn param_count(&self) -> usize {
        self.segments.len()
    }

    /// Re-render with sequential placeholders `$1..$k`, one per segment.
    pub fn to_positional(&self) -> String {
        let cap = self.segments.iter().map(|s| s.literal.len() + 4).sum::<usize>()
            + self.tail.len();
        let mut sql = String::with_capacity(cap);
        for (i, seg) in self.segments.iter().enumerate() {
            sql.push_str(&seg.literal);
            sql.push('$');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(&self.tail);
        sql
    }

    /// Substitute every value as a SQL literal.
    ///
    /// For logs and diagnostics only; never send the result to a server.
    pub fn render_inline(&self) -> String {
        let mut sql = String::new();
        for seg in &self.segments {
            sql.push_str(&seg.literal);
            sql.push_str(&seg.value.to_sql_literal());
        }
        sql.push_str(&self.tail);
        sql
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    /// `E'...'`: backslash escapes are active
    EscapeQuoted,
    DoubleQuoted,
    /// `$tag$ ... $tag$`; the range points at the opening delimiter
    DollarQuoted { tag_start: usize, tag_end: usize },
    LineComment,
    BlockComment { depth: usize },
}

fn is_ident_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Length of the `$tag$` delimiter starting at `i`, if there is one.
fn dollar_tag_len(bytes: &[u8], i: usize) -> Option<usize> {
    let mut j = i + 1;
    match bytes.get(j) {
        Some(b'$') => return Some(2),
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return None,
    }
    while j < bytes.len() && is_ident_byte(bytes[j]) {
        j += 1;
    }
    (bytes.get(j) == Some(&b'$')).then_some(j + 1 - i)
}

/// Split positional SQL into literal segments and the values they refer to.
///
/// `$n` refers to `values[n - 1]`; the same index may appear more than once and indices need
/// not be increasing. `$` is ordinary text inside `'string'` and `E'escaped'` literals,
/// `"quoted"` identifiers, `$tag$` dollar-quoted bodies, `--` and `/* */` comments, and directly
/// after an identifier character.
pub fn bind(sql: &str, values: &[Value]) -> DbResult<BoundStatement> {
    let bytes = sql.as_bytes();
    let mut segments = Vec::new();
    let mut state = State::Normal;
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::SingleQuoted => {
                if b == b'\'' {
                    state = State::Normal;
                }
                i += 1;
            }
            State::EscapeQuoted => match (b, next) {
                (b'\\', Some(_)) | (b'\'', Some(b'\'')) => i += 2,
                (b'\'', _) => {
                    state = State::Normal;
                    i += 1;
                }
                _ => i += 1,
            },
            State::DoubleQuoted => {
                if b == b'"' {
                    state = State::Normal;
                }
                i += 1;
            }
            State::DollarQuoted { tag_start, tag_end } => {
                let tag = &bytes[tag_start..tag_end];
                if bytes[i..].starts_with(tag) {
                    state = State::Normal;
                    i += tag.len();
                } else {
                    i += 1;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
                i += 1;
            }
            State::BlockComment { depth } => match (b, next) {
                (b'*', Some(b'/')) => {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment { depth: depth - 1 }
                    };
                    i += 2;
                }
                (b'/', Some(b'*')) => {
                    state = State::BlockComment { depth: depth + 1 };
                    i += 2;
                }
                _ => i += 1,
            },
            State::Normal => {
                let after_ident = i > 0 && is_ident_byte(bytes[i - 1]);
                match (b, next) {
                    (b'\'', _) => {
                        state = State::SingleQuoted;
                        i += 1;
                    }
                    (b'e' | b'E', Some(b'\'')) if !after_ident => {
                        state = State::EscapeQuoted;
                        i += 2;
                    }
                    (b'"', _) => {
                        state = State::DoubleQuoted;
                        i += 1;
                    }
                    (b'-', Some(b'-')) => {
                        state = State::LineComment;
                        i += 2;
                    }
                    (b'/', Some(b'*')) => {
                        state = State::BlockComment { depth: 1 };
                        i += 2;
                    }
                    (b'$', Some(d)) if !after_ident && d.is_ascii_digit() => {
                        let digits_start = i + 1;
                        let mut end = digits_start;
                        while end < bytes.len() && bytes[end].is_ascii_digit() {
                            end += 1;
                        }
                        let index: usize = sql[digits_start..end].parse().map_err(|_| {
                            DbError::invalid(format!(
                                "placeholder ${} is out of range",
                                &sql[digits_start..end]
                            ))
                        })?;
                        if index == 0 || index > values.len() {
                            return Err(DbError::invalid(format!(
                                "placeholder ${index} has no value ({} provided)",
                                values.len()
                            )));
                        }
                        segments.push(BoundSegment {
                            literal: sql[literal_start..i].to_string(),
                            value: values[index - 1].clone(),
                        });
                        literal_start = end;
                        i = end;
                    }
                    (b'$', _) if !after_ident => match dollar_tag_len(bytes, i) {
                        Some(len) => {
                            state = State::DollarQuoted {
                                tag_start: i,
                                tag_end: i + len,
                            };
                            i += len;
                        }
                        None => i += 1,
                    },
                    _ => i += 1,
                }
            }
        }
    }

    Ok(BoundStatement {
        segments,
        tail: sql[literal_start..].to_string(),
    })
}
