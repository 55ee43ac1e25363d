//! Request resolution.
//!
//! Resolves an incoming request to exactly one operation of a registered
//! document by matching servers, path templates, and method in turn.

use crate::document::{Document, Operation};
use tracing::debug;
use url::Url;

/// Percent-decode a path, leaving it untouched if it does not decode to UTF-8.
pub fn decode_path(path: &str) -> String {
    urlencoding::decode(path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Split a path into its non-empty segments.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Split a raw path on `/`, then percent-decode each segment.
///
/// An encoded slash (`%2F`) stays inside its segment.
pub fn decode_segments(path: &str) -> Vec<String> {
    split_segments(path).into_iter().map(decode_path).collect()
}

/// Name of the placeholder in a template segment (`{petId}` -> `petId`).
///
/// Anything between the first `{` and the last `}` counts, so `{id}.json`
/// is a placeholder segment too.
pub fn placeholder_name(segment: &str) -> Option<&str> {
    let open = segment.find('{')?;
    let close = segment.rfind('}')?;
    if close > open + 1 {
        Some(&segment[open + 1..close])
    } else {
        None
    }
}

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment {
    Literal(String),
    Placeholder(String),
}

/// A parsed (and decoded) path template such as `/pet/{petId}`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    segments: Vec<TemplateSegment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Self {
        let segments = decode_segments(template)
            .into_iter()
            .map(|segment| match placeholder_name(&segment) {
                Some(name) => TemplateSegment::Placeholder(name.to_string()),
                None => TemplateSegment::Literal(segment),
            })
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[TemplateSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Match against already-decoded URL segments.
    pub fn matches<S: AsRef<str>>(&self, url_segments: &[S]) -> bool {
        self.segments.len() == url_segments.len()
            && self
                .segments
                .iter()
                .zip(url_segments)
                .all(|(segment, actual)| match segment {
                    TemplateSegment::Literal(lit) => lit.as_str() == actual.as_ref(),
                    TemplateSegment::Placeholder(_) => !actual.as_ref().is_empty(),
                })
    }
}

/// A server URL broken into the parts requests are matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub scheme: String,
    pub host: String,
    /// Decoded base path segments, e.g. `["v2"]`
    pub base_path: Vec<String>,
}

impl ServerEntry {
    /// Parse an absolute server URL. Relative or templated URLs yield `None`.
    pub fn parse(server_url: &str) -> Option<Self> {
        let url = Url::parse(server_url).ok()?;
        Some(Self {
            scheme: url.scheme().to_string(),
            host: url.host_str()?.to_string(),
            base_path: decode_segments(url.path()),
        })
    }

    /// The decoded request segments below this server's base path, or
    /// `None` if the request is not served by this server.
    pub fn strip<'a>(&self, url: &Url, segments: &'a [String]) -> Option<&'a [String]> {
        if url.scheme() != self.scheme || url.host_str() != Some(self.host.as_str()) {
            return None;
        }
        segments
            .starts_with(&self.base_path)
            .then(|| &segments[self.base_path.len()..])
    }
}

/// The unique operation a request resolved to.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    /// Path template key as written in the document
    pub template: &'a str,
    pub operation: &'a Operation,
}

/// Outcome of resolving a request against one document.
#[derive(Debug)]
pub enum Resolution<'a> {
    Matched(MatchResult<'a>),
    NoMatch,
    /// More than one operation fits; treated exactly like `NoMatch`
    Ambiguous(usize),
}

impl<'a> Resolution<'a> {
    pub fn matched(self) -> Option<MatchResult<'a>> {
        match self {
            Resolution::Matched(result) => Some(result),
            _ => None,
        }
    }
}

/// Resolve a request against a single document.
pub fn resolve_document<'a>(document: &'a Document, method: &str, url: &Url) -> Resolution<'a> {
    if !document.is_openapi() {
        return Resolution::NoMatch;
    }

    let segments = decode_segments(url.path());
    let servers: Vec<ServerEntry> = document
        .servers
        .iter()
        .filter_map(|server| {
            let entry = ServerEntry::parse(&server.url);
            if entry.is_none() {
                debug!(server = %server.url, "Skipping server without absolute URL");
            }
            entry
        })
        .filter(|entry| entry.strip(url, &segments).is_some())
        .collect();
    if servers.is_empty() {
        return Resolution::NoMatch;
    }

    let method = method.to_lowercase();
    let mut candidates: Vec<MatchResult<'a>> = document
        .paths
        .iter()
        .filter(|(template, _)| {
            let template = PathTemplate::parse(template);
            servers.iter().any(|server| {
                server
                    .strip(url, &segments)
                    .is_some_and(|rest| template.matches(rest))
            })
        })
        .filter_map(|(template, item)| {
            item.operation(&method)
                .filter(|operation| !operation.deprecated)
                .map(|operation| MatchResult { template, operation })
        })
        .collect();

    match candidates.len() {
        0 => Resolution::NoMatch,
        1 => candidates.pop().map_or(Resolution::NoMatch, Resolution::Matched),
        n => {
            debug!(candidates = n, url = %url, "Ambiguous operation match");
            Resolution::Ambiguous(n)
        }
    }
}

/// Resolve a request across documents in registration order.
///
/// Returns the index of the first document that resolves the request.
pub fn resolve<'a, I>(documents: I, method: &str, url: &Url) -> Option<(usize, MatchResult<'a>)>
where
    I: IntoIterator<Item = &'a Document>,
{
    documents
        .into_iter()
        .enumerate()
        .find_map(|(idx, doc)| resolve_document(doc, method, url).matched().map(|m| (idx, m)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn petstore() -> Document {
        serde_yaml::from_str(
            r#"
openapi: 3.0.0
servers:
  - url: https://petstore.swagger.io/v2
  - url: "{scheme}://templated/v1"
paths:
  /pet/{petId}:
    get:
      responses:
        "200":
          description: ok
    delete:
      deprecated: true
      responses:
        "200":
          description: ok
  /pet/findByStatus:
    get:
      responses:
        "200":
          description: ok
  /store order:
    get:
      responses:
        "200":
          description: ok
  /user%20list:
    get:
      responses:
        "200":
          description: ok
"#,
        )
        .unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_template_parsing() {
        let template = PathTemplate::parse("/pet/{petId}/photo-{photoId}.png");
        assert_eq!(
            template.segments(),
            &[
                TemplateSegment::Literal("pet".to_string()),
                TemplateSegment::Placeholder("petId".to_string()),
                TemplateSegment::Placeholder("photoId".to_string()),
            ]
        );
        assert_eq!(placeholder_name("{}"), None);
        assert_eq!(placeholder_name("plain"), None);
    }

    #[test]
    fn test_template_matching() {
        let template = PathTemplate::parse("/pet/{petId}");
        assert!(template.matches(&["pet", "69"]));
        assert!(!template.matches(&["pet"]));
        assert!(!template.matches(&["pet", "69", "extra"]));
        assert!(!template.matches(&["pets", "69"]));
    }

    #[test]
    fn test_server_entry() {
        let entry = ServerEntry::parse("https://petstore.swagger.io/v2").unwrap();
        assert_eq!(entry.scheme, "https");
        assert_eq!(entry.host, "petstore.swagger.io");
        assert_eq!(entry.base_path, ["v2"]);

        let segments = decode_segments("/v2/pet/1");
        let request = url("https://petstore.swagger.io/v2/pet/1");
        assert_eq!(
            entry.strip(&request, &segments),
            Some(&["pet".to_string(), "1".to_string()][..])
        );

        let http = url("http://petstore.swagger.io/v2/pet/1");
        assert_eq!(entry.strip(&http, &segments), None);

        // the base path is a segment prefix, not a text prefix
        let other = decode_segments("/v2x/pet/1");
        assert_eq!(entry.strip(&request, &other), None);

        assert!(ServerEntry::parse("/relative").is_none());
    }

    #[test]
    fn test_resolve_with_parameter() {
        let doc = petstore();
        let result = resolve_document(&doc, "GET", &url("https://petstore.swagger.io/v2/pet/69"))
            .matched()
            .unwrap();
        assert_eq!(result.template, "/pet/{petId}");
    }

    #[test]
    fn test_resolve_rejects_wrong_host_route_and_method() {
        let doc = petstore();
        assert!(resolve_document(&doc, "get", &url("https://swagger.io/v2/pet/69"))
            .matched()
            .is_none());
        assert!(resolve_document(&doc, "get", &url("https://petstore.swagger.io/v2/pets/69"))
            .matched()
            .is_none());
        assert!(resolve_document(&doc, "post", &url("https://petstore.swagger.io/v2/pet/69"))
            .matched()
            .is_none());
    }

    #[test]
    fn test_deprecated_operation_never_matches() {
        let doc = petstore();
        let resolution =
            resolve_document(&doc, "delete", &url("https://petstore.swagger.io/v2/pet/69"));
        assert!(matches!(resolution, Resolution::NoMatch));
    }

    #[test]
    fn test_ambiguous_match_is_not_a_match() {
        // `/pet/findByStatus` also fits `/pet/{petId}`
        let doc = petstore();
        let resolution =
            resolve_document(&doc, "get", &url("https://petstore.swagger.io/v2/pet/findByStatus"));
        assert!(matches!(resolution, Resolution::Ambiguous(2)));
        assert!(resolve([&doc], "get", &url("https://petstore.swagger.io/v2/pet/findByStatus"))
            .is_none());
    }

    #[test]
    fn test_spaces_match_after_decoding() {
        let doc = petstore();
        for target in [
            "https://petstore.swagger.io/v2/store order",
            "https://petstore.swagger.io/v2/store%20order",
            "https://petstore.swagger.io/v2/user list",
            "https://petstore.swagger.io/v2/user%20list",
        ] {
            assert!(
                resolve_document(&doc, "get", &url(target)).matched().is_some(),
                "{target} should match"
            );
        }
    }

    #[test]
    fn test_encoded_slash_stays_in_one_segment() {
        assert_eq!(decode_segments("/pet/a%2Fb"), ["pet", "a/b"]);

        let doc = petstore();
        let target = url("https://petstore.swagger.io/v2/pet/a%2Fb");
        let result = resolve_document(&doc, "get", &target).matched().unwrap();
        assert_eq!(result.template, "/pet/{petId}");

        let request = crate::request::InterceptedRequest::new("GET", target.as_str()).unwrap();
        let serialized = crate::request::serialize(result.template, &request);
        assert_eq!(serialized.param("petId"), Some("a%2Fb"));
    }

    #[test]
    fn test_first_document_wins() {
        let first = petstore();
        let second = petstore();
        let (idx, _) = resolve([&first, &second], "get", &url("https://petstore.swagger.io/v2/pet/1"))
            .unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_swagger_documents_never_match() {
        let mut doc = petstore();
        doc.openapi = None;
        doc.swagger = Some("2.0".to_string());
        assert!(resolve_document(&doc, "get", &url("https://petstore.swagger.io/v2/pet/1"))
            .matched()
            .is_none());
    }
}
