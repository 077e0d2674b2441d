//! Name/ID resolution for data sources.
//!
//! Every data source accepts either an `id` or a `name` (optionally with
//! `partial_match`). The selector enforces that exactly one of the two is
//! given; the matcher filters a listed collection client-side and fails
//! unless exactly one candidate survives. Ambiguity is a user error and is
//! never retried.

use serde_json::Value;

use crate::error::ProviderError;

/// How a data source identifies the object to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    id: Option<String>,
    name: Option<String>,
    partial: bool,
}

impl Selector {
    /// Parse `id` / `name` / `partial_match` out of a data source
    /// configuration. `what` names the looked-up object in error messages.
    pub fn from_config(what: &str, config: &Value) -> Result<Self, ProviderError> {
        let id = non_empty(config.get("id"));
        let name = non_empty(config.get("name"));
        let partial = config
            .get("partial_match")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if id.is_some() && name.is_some() {
            return Err(ProviderError::Validation(format!(
                "'id' and 'name' cannot be both specified at the same time when reading the {}",
                what
            )));
        }
        if id.is_none() && name.is_none() {
            return Err(ProviderError::Validation(format!(
                "please provide either the {} 'id' or 'name'",
                what
            )));
        }
        if partial && name.is_none() {
            return Err(ProviderError::Validation(
                "'partial_match' can only be used together with 'name'".to_string(),
            ));
        }

        Ok(Self { id, name, partial })
    }

    /// The requested id, when looking up by id.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The requested name, when looking up by name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether a candidate name satisfies this selector.
    ///
    /// Exact matching is case-insensitive equality; `partial_match` is a
    /// case-sensitive substring test.
    pub fn matches(&self, candidate: &str) -> bool {
        match self.name.as_deref() {
            Some(name) if self.partial => candidate.contains(name),
            Some(name) => candidate.eq_ignore_ascii_case(name),
            None => false,
        }
    }
}

/// Filter `items` by the selector's name and require exactly one survivor.
///
/// `name_of` extracts the candidate name; items without one never match.
pub fn exactly_one<T, F>(
    what: &str,
    selector: &Selector,
    items: Vec<T>,
    name_of: F,
) -> Result<T, ProviderError>
where
    F: Fn(&T) -> Option<&str>,
{
    let Some(name) = selector.name() else {
        return Err(ProviderError::Internal(format!(
            "{} lookup by name without a name in the selector",
            what
        )));
    };

    let mut matched: Vec<T> = items
        .into_iter()
        .filter(|item| name_of(item).is_some_and(|n| selector.matches(n)))
        .collect();

    match matched.len() {
        0 => Err(ProviderError::NotFound(format!(
            "no {} found with the specified criteria: name = '{}'",
            what, name
        ))),
        1 => Ok(matched.remove(0)),
        n => Err(ProviderError::Validation(format!(
            "more than one {} found with the specified criteria: name = '{}' ({} matches, use 'id' or a more specific name)",
            what, name, n
        ))),
    }
}

/// The error used when a lookup by id comes back 404.
pub fn not_found_by_id(what: &str, id: &str) -> ProviderError {
    ProviderError::NotFound(format!(
        "no {} found with the specified criteria: id = '{}'",
        what, id
    ))
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_validation(err: ProviderError, needle: &str) {
        match err {
            ProviderError::Validation(msg) => assert!(
                msg.contains(needle),
                "expected '{}' in '{}'",
                needle,
                msg
            ),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_selector_rejects_both_id_and_name() {
        let err = Selector::from_config("server", &json!({"id": "srv-1", "name": "web"}))
            .unwrap_err();
        assert_validation(err, "cannot be both specified");
    }

    #[test]
    fn test_selector_rejects_neither() {
        let err = Selector::from_config("server", &json!({})).unwrap_err();
        assert_validation(err, "please provide either the server 'id' or 'name'");
    }

    #[test]
    fn test_selector_treats_empty_strings_as_absent() {
        let err = Selector::from_config("server", &json!({"id": "", "name": ""})).unwrap_err();
        assert_validation(err, "please provide either");

        let selector =
            Selector::from_config("server", &json!({"id": "", "name": "web"})).unwrap();
        assert_eq!(selector.name(), Some("web"));
    }

    #[test]
    fn test_selector_partial_requires_name() {
        let err = Selector::from_config("server", &json!({"id": "srv-1", "partial_match": true}))
            .unwrap_err();
        assert_validation(err, "partial_match");
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let selector = Selector::from_config("server", &json!({"name": "Web-1"})).unwrap();
        assert!(selector.matches("web-1"));
        assert!(selector.matches("WEB-1"));
        assert!(!selector.matches("web-10"));
    }

    #[test]
    fn test_partial_match_is_substring() {
        let selector =
            Selector::from_config("server", &json!({"name": "web", "partial_match": true}))
                .unwrap();
        assert!(selector.matches("web-1"));
        assert!(selector.matches("prod-web-2"));
        // partial matching stays case-sensitive
        assert!(!selector.matches("WEB-1"));
    }

    #[test]
    fn test_exactly_one_returns_single_match() {
        let selector = Selector::from_config("server", &json!({"name": "web-1"})).unwrap();
        let items = vec![("srv-1", "web-1"), ("srv-2", "db-1")];

        let found = exactly_one("server", &selector, items, |(_, name)| Some(name)).unwrap();
        assert_eq!(found.0, "srv-1");
    }

    #[test]
    fn test_exactly_one_zero_matches() {
        let selector = Selector::from_config("server", &json!({"name": "missing"})).unwrap();
        let items = vec![("srv-1", "web-1")];

        let err = exactly_one("server", &selector, items, |(_, name)| Some(name)).unwrap_err();
        match err {
            ProviderError::NotFound(msg) => {
                assert!(msg.contains("no server found with the specified criteria"));
                assert!(msg.contains("missing"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_exactly_one_multiple_matches() {
        let selector =
            Selector::from_config("server", &json!({"name": "web", "partial_match": true}))
                .unwrap();
        let items = vec![("srv-1", "web-1"), ("srv-2", "web-2")];

        let err = exactly_one("server", &selector, items, |(_, name)| Some(name)).unwrap_err();
        assert_validation(err, "more than one server found with the specified criteria");
    }

    #[test]
    fn test_exactly_one_skips_unnamed_items() {
        let selector = Selector::from_config("server", &json!({"name": "web-1"})).unwrap();
        let items: Vec<(&str, Option<&str>)> = vec![("srv-0", None), ("srv-1", Some("web-1"))];

        let found = exactly_one("server", &selector, items, |(_, name)| *name).unwrap();
        assert_eq!(found.0, "srv-1");
    }

    #[test]
    fn test_not_found_by_id_message() {
        let err = not_found_by_id("lan", "lan-9");
        assert!(err
            .to_string()
            .contains("no lan found with the specified criteria: id = 'lan-9'"));
    }
}
