//! Consumer side of the provenance tokens: turns a target row's
//! parent-tokens value into the trace ids of one upstream model.

use anyhow::anyhow;
use indexmap::IndexSet;
use serde_json::Value;

use crate::vocabulary::split_token;

/// Resolves tokens emitted under an upstream model name or any of its
/// aliases in the downstream SQL.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    model: String,
    aliases: Vec<String>,
}

impl TokenResolver {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_owned(),
            aliases: vec![model.to_owned()],
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for alias in aliases {
            let alias = alias.as_ref();
            if !self.aliases.iter().any(|known| known == alias) {
                self.aliases.push(alias.to_owned());
            }
        }
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Upstream trace ids contributed by this model, first occurrence first.
    /// Tokens without a separator are skipped.
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> IndexSet<String> {
        let mut trace_ids = IndexSet::new();
        for token in tokens {
            if let Some((alias, trace_id)) = split_token(token.as_ref())
                && self.aliases.contains(&alias)
            {
                trace_ids.insert(trace_id.to_owned());
            }
        }
        trace_ids
    }

    /// Like [`TokenResolver::resolve`], reading the tokens out of a fetched
    /// column value. A missing value resolves to nothing.
    pub fn resolve_value(&self, value: Option<&Value>) -> anyhow::Result<IndexSet<String>> {
        match value.map(parent_tokens_from_value).transpose()?.flatten() {
            Some(tokens) => Ok(self.resolve(&tokens)),
            None => Ok(IndexSet::new()),
        }
    }
}

/// Reads a parent-tokens column value as fetched from the warehouse.
///
/// Drivers hand the array back as a JSON array, as a string holding a JSON
/// array, or as a Postgres array literal `{a,b}`. `None` means no tokens.
pub fn parent_tokens_from_value(value: &Value) -> anyhow::Result<Option<Vec<String>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => Ok(Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect(),
        )),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(None)
            } else if text.starts_with('[') {
                let parsed: Value = serde_json::from_str(text)
                    .map_err(|err| anyhow!("Invalid JSON tokens array `{}`: {}", text, err))?;
                parent_tokens_from_value(&parsed)
            } else if text.starts_with('{') {
                parse_pg_array(text).map(Some)
            } else {
                Err(anyhow!("Unrecognized parent tokens value `{}`", text))
            }
        }
        other => Err(anyhow!("Unrecognized parent tokens value {}", other)),
    }
}

// One-dimensional text array literal: `{a,"b,c",NULL}`.
fn parse_pg_array(text: &str) -> anyhow::Result<Vec<String>> {
    let inner = text
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| anyhow!("Invalid array literal `{}`", text))?;

    let mut items = vec![];
    let mut chars = inner.chars().peekable();
    while chars.peek().is_some() {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let mut item = String::new();
        if chars.next_if_eq(&'"').is_some() {
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(c) => item.push(c),
                        None => return Err(anyhow!("Invalid array literal `{}`", text)),
                    },
                    Some('"') => break,
                    Some(c) => item.push(c),
                    None => return Err(anyhow!("Unterminated quoted element in `{}`", text)),
                }
            }
            items.push(item);
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                item.push(c);
            }
            let item = item.trim_end();
            if item.is_empty() {
                if chars.peek().is_some() {
                    return Err(anyhow!("Empty element in array literal `{}`", text));
                }
            } else if !item.eq_ignore_ascii_case("NULL") {
                items.push(item.to_owned());
            }
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') | None => {}
            Some(c) => {
                return Err(anyhow!(
                    "Unexpected `{}` after element in array literal `{}`",
                    c,
                    text
                ));
            }
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(ids: &[&str]) -> IndexSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn resolves_per_upstream_model() {
        let tokens = ["a:u1", "a:u2", "b:u3"];
        assert_eq!(TokenResolver::new("a").resolve(&tokens), set(&["u1", "u2"]));
        assert_eq!(TokenResolver::new("b").resolve(&tokens), set(&["u3"]));
        assert!(TokenResolver::new("c").resolve(&tokens).is_empty());
    }

    #[test]
    fn prefix_must_match_whole_alias() {
        let tokens = ["ab:u1", "a:u2"];
        assert_eq!(TokenResolver::new("a").resolve(&tokens), set(&["u2"]));
    }

    #[test]
    fn aliases_widen_the_match() {
        let tokens = ["o:u1", "orders:u2", "c:u3", "o:u1"];
        let resolver = TokenResolver::new("orders").with_aliases(["o"]);
        assert_eq!(resolver.resolve(&tokens), set(&["u2", "u1"]));
    }

    #[test]
    fn tokens_without_separator_are_skipped() {
        let tokens = ["a", "a\\:u1", "a:u2"];
        assert_eq!(TokenResolver::new("a").resolve(&tokens), set(&["u2"]));
    }

    #[test]
    fn escaped_aliases() {
        let tokens = [crate::vocabulary::format_token("db:a", "u1"), "db:u2".to_owned()];
        assert_eq!(TokenResolver::new("db:a").resolve(&tokens), set(&["u1"]));
        assert_eq!(TokenResolver::new("db").resolve(&tokens), set(&["u2"]));
    }

    #[test]
    fn missing_value_resolves_to_nothing() {
        let resolver = TokenResolver::new("a");
        assert!(resolver.resolve_value(None).unwrap().is_empty());
        assert!(resolver.resolve_value(Some(&Value::Null)).unwrap().is_empty());
        assert!(resolver.resolve_value(Some(&json!([]))).unwrap().is_empty());
    }

    #[test]
    fn value_shapes() {
        let expected = Some(vec!["a:u1".to_owned(), "b:u2".to_owned()]);
        assert_eq!(
            parent_tokens_from_value(&json!(["a:u1", "b:u2"])).unwrap(),
            expected
        );
        assert_eq!(
            parent_tokens_from_value(&json!("[\n  \"a:u1\",\n  \"b:u2\"\n]")).unwrap(),
            expected
        );
        assert_eq!(parent_tokens_from_value(&json!("{a:u1,b:u2}")).unwrap(), expected);
        assert_eq!(
            parent_tokens_from_value(&json!("{\"a:u,1\",NULL,\"b:\\\"q\"}")).unwrap(),
            Some(vec!["a:u,1".to_owned(), "b:\"q".to_owned()])
        );
        assert_eq!(parent_tokens_from_value(&json!("{}")).unwrap(), Some(vec![]));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parent_tokens_from_value(&json!("a:u1")).is_err());
        assert!(parent_tokens_from_value(&json!(42)).is_err());
        assert!(parent_tokens_from_value(&json!("{\"open")).is_err());
    }
}
