//! Ordered string parameters for authorize and token calls
//!
//! Providers see extras in the order the caller added them, so this is an
//! insertion-ordered list rather than a hash map. Inserting an existing key
//! replaces its value in place.

/// Insertion-ordered `key -> value` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

/// Per-call parameters for the authorization redirect.
pub type AuthorizeParams = Params;

/// Per-call parameters for the code exchange.
pub type TokenRequestParams = Params;

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, keeping its original position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder form of [`Params::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of a mandatory parameter; absent or empty values are errors.
    pub(crate) fn required(&self, key: &str) -> crate::Result<&str> {
        match self.get(key) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(crate::Error::Validation(format!("{key} is required"))),
        }
    }

    /// Caller entries other than `skip`, in insertion order.
    pub(crate) fn extras<'a>(
        &'a self,
        skip: &'a [&'a str],
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter().filter(move |(k, _)| !skip.contains(k))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let params = Params::from([("state", "s"), ("redirect_uri", "r"), ("scope", "user")]);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["state", "redirect_uri", "scope"]);
    }

    #[test]
    fn insert_replaces_value_in_place() {
        let mut params = Params::new().with("scope", "user").with("state", "a");
        params.insert("scope", "repo");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("scope"), Some("repo"));
        assert_eq!(params.iter().next(), Some(("scope", "repo")));
    }

    #[test]
    fn required_rejects_missing_and_empty() {
        let params = Params::from([("code", "")]);
        assert!(matches!(
            params.required("code"),
            Err(crate::Error::Validation(msg)) if msg == "code is required"
        ));
        assert!(params.required("redirect_uri").is_err());

        let params = Params::from([("code", "abc")]);
        assert_eq!(params.required("code").unwrap(), "abc");
    }

    #[test]
    fn extras_skip_named_keys() {
        let params = Params::from([("code", "c"), ("code_verifier", "v"), ("redirect_uri", "r")]);
        let extras: Vec<_> = params.extras(&["code", "redirect_uri"]).collect();
        assert_eq!(extras, vec![("code_verifier", "v")]);
    }
}
