//! Shell quoting for generated command text.
//!
//! Every configuration-supplied value that ends up on a cron line passes
//! through [`quote`]; nothing else in the crate concatenates raw field text
//! into command strings.

/// Quote a value for safe use in shell command text.
///
/// Values made purely of shell-inert characters pass through unchanged. The
/// inert set includes `*` and `?` so glob sources still expand at run time,
/// and `@` and `:` so `user@host:path` destinations stay readable. Anything
/// else is wrapped in single quotes with embedded single quotes escaped.
pub fn quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_owned();
    }
    if value.chars().all(is_inert) {
        return value.to_owned();
    }

    let mut quoted = String::from("'");
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

fn is_inert(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, '-' | '_' | '/' | '.' | ':' | '=' | '@' | '~' | '+' | ',' | '*' | '?')
}
