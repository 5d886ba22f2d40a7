//! Reserved column names and the provenance token format.
//!
//! A token is `escape(alias) + ":" + trace_id`. Escaping turns `\` into `\\`
//! and `:` into `\:`, so the first unescaped `:` always ends the alias.

/// Per-row trace identifier column.
pub const TRACE_COLUMN: &str = "_row_trace_id";

/// Per-row array of `alias:trace_id` tokens of the contributing upstream rows.
pub const PARENT_TRACE_COLUMN: &str = "_row_parent_trace_ids";

const TOKEN_SEPARATOR: char = ':';

pub fn is_reserved_column(name: &str) -> bool {
    name.eq_ignore_ascii_case(TRACE_COLUMN) || name.eq_ignore_ascii_case(PARENT_TRACE_COLUMN)
}

fn escape_alias(alias: &str) -> String {
    let mut escaped = String::with_capacity(alias.len());
    for c in alias.chars() {
        if c == '\\' || c == TOKEN_SEPARATOR {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Prefix every token emitted under `alias` starts with.
pub fn token_prefix(alias: &str) -> String {
    format!("{}{}", escape_alias(alias), TOKEN_SEPARATOR)
}

pub fn format_token(alias: &str, trace_id: &str) -> String {
    format!("{}{}", token_prefix(alias), trace_id)
}

/// Splits a token into its unescaped alias and its trace id.
///
/// Returns `None` when the token has no unescaped separator.
pub fn split_token(token: &str) -> Option<(String, &str)> {
    let mut alias = String::new();
    let mut chars = token.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => alias.push(escaped),
                None => alias.push('\\'),
            },
            TOKEN_SEPARATOR => return Some((alias, &token[idx + 1..])),
            _ => alias.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_aliases_are_not_escaped() {
        assert_eq!(format_token("orders", "u1"), "orders:u1");
        assert_eq!(token_prefix("stg_orders"), "stg_orders:");
    }

    #[test]
    fn colons_in_aliases_are_escaped() {
        let token = format_token("db:orders", "a:b");
        assert_eq!(token, "db\\:orders:a:b");
        assert_eq!(split_token(&token), Some(("db:orders".to_owned(), "a:b")));
    }

    #[test]
    fn backslashes_in_aliases_are_escaped() {
        let token = format_token("a\\", "u1");
        assert_eq!(token, "a\\\\:u1");
        assert_eq!(split_token(&token), Some(("a\\".to_owned(), "u1")));
    }

    #[test]
    fn split_token_without_separator() {
        assert_eq!(split_token("no-separator"), None);
        assert_eq!(split_token("escaped\\:only"), None);
    }

    #[test]
    fn reserved_column_names() {
        assert!(is_reserved_column("_row_trace_id"));
        assert!(is_reserved_column("_ROW_PARENT_TRACE_IDS"));
        assert!(!is_reserved_column("row_trace_id"));
    }
}
