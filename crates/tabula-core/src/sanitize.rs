//! Identifier sanitizing.
//!
//! Every caller-supplied table or column name passes through [`sanitize`]
//! before it reaches SQL. The result only contains `[A-Za-z0-9_]`, so it is
//! safe to splice into a statement once quoted with [`quote`].

/// Replace every character that is not an ASCII letter, digit or underscore
/// with `_`.
///
/// One output character per input character; consecutive replacements are
/// not collapsed.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Sanitize and double-quote a name for use as an SQL identifier.
pub fn quote(name: &str) -> String {
    format!("\"{}\"", sanitize(name))
}
