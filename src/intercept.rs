//! Contract with the layer that captures outbound connections.

use serde::Serialize;

/// Where a mocked response is written.
///
/// [`SpecRegistry::handle`](crate::SpecRegistry::handle) sets the status,
/// at most one `Content-Type` header, and then calls `end` exactly once.
pub trait ResponseSink {
    fn set_status(&mut self, status: u16);
    fn set_header(&mut self, name: &str, value: &str);
    fn end(&mut self, body: String);
}

/// A fully buffered response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl ResponseSink for MockResponse {
    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("content-type") {
            self.content_type = Some(value.to_string());
        }
    }

    fn end(&mut self, body: String) {
        self.body = body;
    }
}
