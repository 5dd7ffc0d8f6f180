//! Predicate encoding for the RFC_READ_TABLE `OPTIONS` parameter.
//!
//! The `OPTIONS` table holds the WHERE clause in lines of at most 72 bytes.
//! Lines are cut at fixed byte offsets: a cut may fall inside a token, which
//! the server tolerates because it concatenates the lines before parsing.

use super::MAX_OPTION_LENGTH;

/// Splits `text` into ordered lines of at most [`MAX_OPTION_LENGTH`] bytes.
///
/// Concatenating the lines reproduces `text` exactly. A cut never lands
/// inside a multi-byte character, so such a line may be a few bytes short.
///
/// # Example
/// ```rust
/// use gosaudit_core::rfc::wrap_predicate;
///
/// let text = "RELTYPE = 'ATTA' AND CREA_TIME > '20230101' AND OBJTYPE_B = 'PHIO' AND X = '1'";
/// let lines = wrap_predicate(text);
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines.concat(), text);
/// ```
pub fn wrap_predicate(text: &str) -> Vec<String> {
    let mut lines = Vec::with_capacity(text.len() / MAX_OPTION_LENGTH + 1);
    let mut rest = text;

    while !rest.is_empty() {
        let mut end = rest.len().min(MAX_OPTION_LENGTH);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (line, tail) = rest.split_at(end);
        lines.push(line.to_string());
        rest = tail;
    }

    tracing::trace!("Wrapped predicate into {} option lines", lines.len());
    lines
}

/// Quotes a value as an Open SQL string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Builds `field IN ('a','b',...)` for a list of identifiers.
pub fn in_list_predicate<S: AsRef<str>>(field: &str, values: &[S]) -> String {
    let list = values
        .iter()
        .map(|value| quote_literal(value.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    format!("{} IN ({})", field, list)
}
