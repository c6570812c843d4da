//! Identifier normalization for generated symbol names.
//!
//! Proto identifiers arrive in several casings (`USER_NOT_FOUND`,
//! `user_not_found`, `SayHello`). Generated Rust code needs two forms:
//!
//! - [`to_camel`] - type and variant names (`UserNotFound`)
//! - [`to_snake`] - function and method names (`say_hello`)
//!
//! ## Examples
//!
//! ```
//! use grain_define::naming::{to_camel, to_snake};
//!
//! assert_eq!(to_camel("USER_NOT_FOUND"), "UserNotFound");
//! assert_eq!(to_camel("FOO"), "Foo");
//! assert_eq!(to_snake("SayHello"), "say_hello");
//! ```

/// Separator recognized between identifier segments.
const SEPARATOR: char = '_';

/// Converts an identifier into its generated type-name form.
///
/// Without a separator, an all upper-case token is lower-cased first and the
/// result gets its first character upper-cased (`FOO` → `Foo`, `fooBar` →
/// `FooBar`). With separators, every segment is title-cased independently
/// and the segments are joined (`foo_bar` → `FooBar`, `FOO_BAR` → `FooBar`).
///
/// The function is idempotent on its own output as long as that output is not
/// entirely upper-case. An identifier made only of one-letter segments (`A_B`
/// → `AB`) is the exception: its output reads as an upper-case token.
///
/// ## Examples
///
/// ```
/// use grain_define::naming::to_camel;
///
/// assert_eq!(to_camel("foo_bar"), "FooBar");
/// assert_eq!(to_camel("FOO_BAR"), "FooBar");
/// assert_eq!(to_camel("FooBar"), "FooBar");
/// ```
pub fn to_camel(ident: &str) -> String {
    if !ident.contains(SEPARATOR) {
        let token = if is_all_upper(ident) {
            ident.to_lowercase()
        } else {
            ident.to_string()
        };
        return capitalize_first(&token);
    }

    ident.split(SEPARATOR).map(title_segment).collect()
}

/// Converts an identifier into its generated function-name form.
///
/// Word boundaries are taken from separators, lower-to-upper transitions,
/// and the end of an upper-case run followed by a lower-case letter
/// (`HTTPServer` → `http_server`).
///
/// ## Examples
///
/// ```
/// use grain_define::naming::to_snake;
///
/// assert_eq!(to_snake("Dowork"), "dowork");
/// assert_eq!(to_snake("GetHTTPStatus"), "get_http_status");
/// assert_eq!(to_snake("USER_NOT_FOUND"), "user_not_found");
/// ```
pub fn to_snake(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch == SEPARATOR {
            if !out.is_empty() && !out.ends_with(SEPARATOR) {
                out.push(SEPARATOR);
            }
            continue;
        }

        if ch.is_uppercase() && i > 0 && !out.is_empty() && !out.ends_with(SEPARATOR) {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push(SEPARATOR);
            }
        }

        out.extend(ch.to_lowercase());
    }

    while out.ends_with(SEPARATOR) {
        out.pop();
    }
    out
}

fn is_all_upper(token: &str) -> bool {
    token == token.to_uppercase()
}

fn capitalize_first(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
