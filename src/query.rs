//! Query key construction
//!
//! Builds the request URL that doubles as the cache key. Parameters are
//! ordered by value (descending) so that the same parameter set always
//! produces the same key no matter how the caller assembled it.

use url::form_urlencoded::byte_serialize;

/// Builds a deterministic query URL from a base URL and a parameter mapping.
///
/// Pairs are sorted by value in descending order, with ties broken by name
/// (also descending). Names are used verbatim; values are form-encoded
/// (`' '` becomes `'+'`) and pairs are joined with `&`. An empty mapping
/// yields `"{base_url}?"`.
///
/// # Example
/// ```
/// let key = heifer::build_key("http://host/heifer1", [("where", "Index==4999")]);
/// assert_eq!(key, "http://host/heifer1?where=Index%3D%3D4999");
/// ```
pub fn build_key<I, K, V>(base_url: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToString,
{
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(name, value)| (name.as_ref().to_string(), value.to_string()))
        .collect();

    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let query = pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, encode_value(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", base_url, query)
}

/// Form-encodes a value with the same safe set as Python's `quote_plus`:
/// ASCII alphanumerics and `_.-~` pass through, everything else is escaped.
fn encode_value(s: &str) -> String {
    byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
        .replace("%7E", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    const BASE: &str = "http://think.cs.vt.edu:5000/heifer1";

    #[test]
    fn test_empty_params_yield_bare_question_mark() {
        let params: Vec<(&str, &str)> = Vec::new();
        assert_eq!(build_key(BASE, params), format!("{}?", BASE));
    }

    #[test]
    fn test_where_clause_is_encoded() {
        let key = build_key(BASE, [("where", "Index==4999")]);
        assert_eq!(key, format!("{}?where=Index%3D%3D4999", BASE));
    }

    #[test]
    fn test_spaces_become_plus() {
        let key = build_key(BASE, [("where", "Brd == 'AN'")]);
        assert_eq!(key, format!("{}?where=Brd+%3D%3D+%27AN%27", BASE));
    }

    #[test]
    fn test_names_are_not_encoded() {
        let key = build_key(BASE, [("max results", "5")]);
        assert_eq!(key, format!("{}?max results=5", BASE));
    }

    #[test]
    fn test_tilde_kept_and_star_escaped() {
        let key = build_key(BASE, [("where", "Loc~'a*b'")]);
        assert_eq!(key, format!("{}?where=Loc~%27a%2Ab%27", BASE));
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        let key = build_key(BASE, [("where", "a/b&c=d%")]);
        assert_eq!(key, format!("{}?where=a%2Fb%26c%3Dd%25", BASE));
    }

    #[test]
    fn test_sorted_by_value_descending_not_by_name() {
        let key = build_key(BASE, [("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(key, format!("{}?c=3&b=2&a=1", BASE));

        let key = build_key(BASE, [("z", "apple"), ("a", "pear")]);
        assert_eq!(key, format!("{}?a=pear&z=apple", BASE));
    }

    #[test]
    fn test_numeric_values_are_stringified() {
        let key = build_key(BASE, [("max_results", 25), ("page", 3)]);
        assert_eq!(key, format!("{}?page=3&max_results=25", BASE));
    }

    #[test]
    fn test_equal_values_break_ties_by_name() {
        let key = build_key(BASE, [("a", "x"), ("b", "x")]);
        assert_eq!(key, format!("{}?b=x&a=x", BASE));
        assert_eq!(key, build_key(BASE, [("b", "x"), ("a", "x")]));
    }

    #[test]
    fn test_key_is_independent_of_input_order() {
        let params = [("a", "1"), ("b", "2"), ("c", "2"), ("d", "where")];
        let expected = build_key(BASE, params);

        // Every rotation and the reversal of the input must agree
        for shift in 0..params.len() {
            let mut rotated = params.to_vec();
            rotated.rotate_left(shift);
            assert_eq!(build_key(BASE, rotated.clone()), expected);
            rotated.reverse();
            assert_eq!(build_key(BASE, rotated), expected);
        }

        let hashed: HashMap<&str, &str> = params.into_iter().collect();
        let ordered: BTreeMap<&str, &str> = params.into_iter().collect();
        assert_eq!(build_key(BASE, hashed), expected);
        assert_eq!(build_key(BASE, ordered), expected);
    }
}
