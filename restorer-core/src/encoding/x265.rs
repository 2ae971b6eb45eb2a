//! Re-delimiting of libx265 parameter strings.
//!
//! Users write x265 parameters comma-separated (`aq-mode=3,psy-rd=2.0`), but
//! `-x265-params` wants colons between `key=value` pairs. Some values are
//! themselves comma lists (`deblock=-2,-2`), so a comma only becomes a colon
//! when the token after it is a `key=value` pair.

/// Replaces each comma that introduces a `key=value` token with a colon.
///
/// A comma is a separator if, after skipping spaces and tabs, the text up to
/// the next `,` or `:` (or the end) contains an `=`.
///
/// ```rust
/// use restorer_core::encoding::normalize_x265_params;
///
/// assert_eq!(
///     normalize_x265_params("aq-mode=3,psy-rd=2.0,deblock=-2,-2"),
///     "aq-mode=3:psy-rd=2.0:deblock=-2,-2"
/// );
/// ```
#[must_use]
pub fn normalize_x265_params(params: &str) -> String {
    let mut out = String::with_capacity(params.len());
    for (index, c) in params.char_indices() {
        if c == ',' && starts_key_value(&params[index + 1..]) {
            out.push(':');
        } else {
            out.push(c);
        }
    }
    out
}

fn starts_key_value(rest: &str) -> bool {
    rest.trim_start_matches([' ', '\t'])
        .chars()
        .take_while(|&c| c != ',' && c != ':')
        .any(|c| c == '=')
}
