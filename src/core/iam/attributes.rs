//! Request attributes consulted by rule conditions

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Multi-valued request attributes (headers, role claims)
///
/// Unknown keys yield an empty slice. Values are compared as opaque strings.
pub trait RequestAttributes {
    fn get(&self, key: &str) -> &[String];
}

impl<S: BuildHasher> RequestAttributes for HashMap<String, Vec<String>, S> {
    fn get(&self, key: &str) -> &[String] {
        HashMap::get(self, key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RequestAttributes for BTreeMap<String, Vec<String>> {
    fn get(&self, key: &str) -> &[String] {
        BTreeMap::get(self, key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Owned attribute bag with a builder-style API
///
/// # Examples
/// ```
/// use policy_gate::{Attributes, RequestAttributes};
///
/// let attrs = Attributes::new()
///     .with("roles", ["admin", "user"])
///     .with("x-tenant", ["acme"]);
///
/// assert_eq!(attrs.get("roles").len(), 2);
/// assert!(attrs.get("missing").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, Vec<String>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values of `key`
    pub fn with<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(key, values);
        self
    }

    /// Replace all values of `key`
    pub fn insert<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    /// Append one value to `key`
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Parse a `key=value` pair and append it
    ///
    /// Returns `None` when the pair has no `=` or an empty key.
    pub fn append_pair(&mut self, pair: &str) -> Option<()> {
        let (key, value) = pair.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.append(key, value);
        Some(())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl RequestAttributes for Attributes {
    fn get(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.append(key, value);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_is_empty() {
        let attrs = Attributes::new();
        assert!(attrs.get("roles").is_empty());

        let map: HashMap<String, Vec<String>> = HashMap::new();
        assert!(RequestAttributes::get(&map, "roles").is_empty());
    }

    #[test]
    fn test_multi_valued() {
        let attrs: Attributes = [("roles", "admin"), ("roles", "user"), ("x-tenant", "acme")]
            .into_iter()
            .collect();

        assert_eq!(attrs.get("roles"), ["admin".to_string(), "user".to_string()]);
        assert_eq!(attrs.get("x-tenant"), ["acme".to_string()]);
    }

    #[test]
    fn test_append_pair() {
        let mut attrs = Attributes::new();
        assert!(attrs.append_pair("roles=admin").is_some());
        assert!(attrs.append_pair("roles=a=b").is_some());
        assert!(attrs.append_pair("x-empty=").is_some());
        assert!(attrs.append_pair("novalue").is_none());
        assert!(attrs.append_pair("=admin").is_none());

        assert_eq!(attrs.get("roles"), ["admin".to_string(), "a=b".to_string()]);
        assert_eq!(attrs.get("x-empty"), [String::new()]);
    }

    #[test]
    fn test_with_replaces() {
        let attrs = Attributes::new()
            .with("roles", ["admin"])
            .with("roles", ["user"]);
        assert_eq!(attrs.get("roles"), ["user".to_string()]);
    }

    #[test]
    fn test_btreemap_attributes() {
        let mut map = BTreeMap::new();
        map.insert("roles".to_string(), vec!["admin".to_string()]);
        assert_eq!(RequestAttributes::get(&map, "roles").len(), 1);
    }
}
