//! Intercepted requests and their normalized form.

use crate::error::{MockError, Result};
use crate::matcher::{placeholder_name, split_segments};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

/// An outbound request handed over by the interception layer.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    method: String,
    url: Url,
}

impl InterceptedRequest {
    /// Build from a method and an absolute URL.
    pub fn new(method: impl Into<String>, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| MockError::InvalidRequest(format!("{url}: {e}")))?;
        Ok(Self {
            method: method.into(),
            url,
        })
    }

    /// Build from the pieces a server-side socket sees: TLS flag, `Host`
    /// header and the origin-form request target (`/v2/pet/1?x=y`).
    pub fn from_parts(method: impl Into<String>, tls: bool, host: &str, target: &str) -> Result<Self> {
        if host.is_empty() {
            return Err(MockError::InvalidRequest("missing Host header".to_string()));
        }
        let scheme = if tls { "https" } else { "http" };
        Self::new(method, &format!("{scheme}://{host}{target}"))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Value of a query key: scalar on first occurrence, list once repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                *self = QueryValue::Multiple(vec![std::mem::take(first), value]);
            }
            QueryValue::Multiple(values) => values.push(value),
        }
    }

    /// Every value given for the key, in order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        match self {
            QueryValue::Single(value) => std::slice::from_ref(value).iter(),
            QueryValue::Multiple(values) => values.iter(),
        }
    }

    /// The first value given for the key.
    pub fn first(&self) -> &str {
        match self {
            QueryValue::Single(value) => value,
            QueryValue::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }
}

/// Normalized record of a resolved request.
#[derive(Debug, Clone)]
pub struct SerializedRequest {
    pub url: Url,
    /// Lower-cased HTTP method
    pub method: String,
    /// Placeholder name to raw path segment
    pub parameters: HashMap<String, String>,
    /// Query key to value(s), in order of first appearance
    pub query: IndexMap<String, QueryValue>,
}

impl SerializedRequest {
    /// Shorthand for a path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Extract path parameters and query values for a matched template.
///
/// Template segments are aligned with the trailing URL segments, which skips
/// any server base path in front of them.
pub fn serialize(template: &str, request: &InterceptedRequest) -> SerializedRequest {
    let url = request.url().clone();

    let parts = split_segments(template);
    let url_parts = split_segments(url.path());
    let offset = url_parts.len().saturating_sub(parts.len());

    let parameters = parts
        .iter()
        .zip(&url_parts[offset..])
        .filter_map(|(part, value)| {
            placeholder_name(part).map(|name| (name.to_string(), value.to_string()))
        })
        .collect();

    let mut query: IndexMap<String, QueryValue> = IndexMap::new();
    for (key, value) in url.query_pairs() {
        match query.get_mut(&*key) {
            Some(existing) => existing.push(value.into_owned()),
            None => {
                query.insert(key.into_owned(), QueryValue::Single(value.into_owned()));
            }
        }
    }

    SerializedRequest {
        url,
        method: request.method().to_lowercase(),
        parameters,
        query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parameter_behind_base_path() {
        let request = InterceptedRequest::from_parts("GET", true, "petstore.swagger.io", "/v2/pet/69").unwrap();
        let serialized = serialize("/pet/{petId}", &request);
        assert_eq!(serialized.param("petId"), Some("69"));
        assert_eq!(serialized.method, "get");
        assert_eq!(serialized.url.as_str(), "https://petstore.swagger.io/v2/pet/69");
    }

    #[test]
    fn test_parameter_value_is_raw() {
        let request = InterceptedRequest::new("get", "https://example.com/user/john%20doe").unwrap();
        let serialized = serialize("/user/{name}", &request);
        assert_eq!(serialized.param("name"), Some("john%20doe"));
    }

    #[test]
    fn test_multiple_parameters() {
        let request =
            InterceptedRequest::new("get", "https://example.com/api/owners/7/pets/3").unwrap();
        let serialized = serialize("/owners/{ownerId}/pets/{petId}", &request);
        assert_eq!(serialized.param("ownerId"), Some("7"));
        assert_eq!(serialized.param("petId"), Some("3"));
        assert_eq!(serialized.parameters.len(), 2);
    }

    #[test]
    fn test_query_promotes_repeated_keys() {
        let request = InterceptedRequest::new(
            "GET",
            "https://example.com/pet/findByStatus?status=available&status=sold&status=pending&limit=5&q=a+b",
        )
        .unwrap();
        let serialized = serialize("/pet/findByStatus", &request);
        assert_eq!(
            serialized.query["status"],
            QueryValue::Multiple(vec![
                "available".to_string(),
                "sold".to_string(),
                "pending".to_string()
            ])
        );
        assert_eq!(serialized.query["limit"], QueryValue::Single("5".to_string()));
        assert_eq!(serialized.query["q"].first(), "a b");
        assert_eq!(serialized.query.keys().collect::<Vec<_>>(), ["status", "limit", "q"]);
    }

    #[test]
    fn test_invalid_requests() {
        assert!(InterceptedRequest::new("GET", "/relative/only").is_err());
        assert!(InterceptedRequest::from_parts("GET", false, "", "/x").is_err());
    }
}
