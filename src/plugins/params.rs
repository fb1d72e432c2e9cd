use std::collections::HashSet;

use crate::error::{BillingError, Result};

/// Ordered multimap of request parameters.
///
/// Keys keep their first-insertion order and every value of a repeated key is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    entries: Vec<(String, Vec<String>)>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.append(key, value);
        }
        map
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Appends every value of `other`, key by key.
    pub fn extend_from(&mut self, other: &ParameterMap) {
        for (key, values) in &other.entries {
            for value in values {
                self.append(key.clone(), value.clone());
            }
        }
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses an `application/x-www-form-urlencoded` string (also used for query strings).
pub fn parse_urlencoded(input: &str) -> Result<ParameterMap> {
    let mut map = ParameterMap::new();
    for pair in input.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        if key.is_empty() {
            continue;
        }
        map.append(key, decode_component(value)?);
    }
    Ok(map)
}

fn decode_component(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| BillingError::encoding(format!("Malformed parameter '{}': {}", raw, e)))
}

/// Serializes the first value of each key as `key=value&...`, first occurrence of a key winning.
pub fn encode_first_values<'a, I>(sources: I) -> String
where
    I: IntoIterator<Item = &'a ParameterMap>,
{
    let mut seen = HashSet::new();
    let mut encoded = Vec::new();
    for source in sources {
        for (key, values) in source.iter() {
            let Some(first) = values.first() else {
                continue;
            };
            if seen.insert(key.to_string()) {
                encoded.push(format!(
                    "{}={}",
                    urlencoding::encode(key),
                    urlencoding::encode(first)
                ));
            }
        }
    }
    encoded.join("&")
}
