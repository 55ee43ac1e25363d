//! Log of served calls.

use crate::request::SerializedRequest;
use regex::Regex;
use serde_json::Value;

/// One served request.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub request: SerializedRequest,
    /// The synthesized value (`null` if none) when the response declares a
    /// content type and no transform rule applied; otherwise the body text
    pub response: Value,
    pub code: u16,
}

/// Pattern tested against the full request URL.
#[derive(Debug, Clone)]
pub enum PathPattern {
    Regex(Regex),
    Glob(globset::GlobMatcher),
}

impl PathPattern {
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(PathPattern::Regex)
    }

    pub fn glob(pattern: &str) -> Result<Self, globset::Error> {
        globset::Glob::new(pattern).map(|glob| PathPattern::Glob(glob.compile_matcher()))
    }

    pub fn is_match(&self, url: &str) -> bool {
        match self {
            PathPattern::Regex(regex) => regex.is_match(url),
            PathPattern::Glob(glob) => glob.is_match(url),
        }
    }
}

/// Criteria for [`CallRecorder::query`]; an empty filter matches every call.
#[derive(Debug, Clone, Default)]
pub struct CallFilter {
    /// Compared case-insensitively
    pub method: Option<String>,
    pub path: Option<PathPattern>,
}

impl CallFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn path(mut self, pattern: PathPattern) -> Self {
        self.path = Some(pattern);
        self
    }

    pub fn matches(&self, record: &CallRecord) -> bool {
        let method_ok = self
            .method
            .as_ref()
            .map_or(true, |m| m.eq_ignore_ascii_case(&record.request.method));
        let path_ok = self
            .path
            .as_ref()
            .map_or(true, |p| p.is_match(record.request.url.as_str()));
        method_ok && path_ok
    }
}

/// Append-only call log of one document.
#[derive(Debug, Default)]
pub struct CallRecorder {
    calls: Vec<CallRecord>,
}

impl CallRecorder {
    pub fn record(&mut self, record: CallRecord) {
        self.calls.push(record);
    }

    /// The first call, in service order, that passes the filter.
    pub fn query(&self, filter: &CallFilter) -> Option<&CallRecord> {
        self.calls.iter().find(|record| filter.matches(record))
    }

    pub fn count(&self) -> usize {
        self.calls.len()
    }

    pub fn all(&self) -> &[CallRecord] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}
