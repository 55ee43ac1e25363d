//! Template engine for response overrides.
//!
//! Uses Handlebars with the serialized request and the body produced so far.

use crate::request::{QueryValue, SerializedRequest};
use handlebars::{handlebars_helper, Handlebars};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Template engine for rendering override bodies.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

/// Context for template rendering.
#[derive(Debug, Serialize)]
pub struct TemplateContext<'a> {
    /// Lower-cased request method
    pub method: &'a str,
    /// Full request URL
    pub url: &'a str,
    /// Path parameters
    pub path: &'a HashMap<String, String>,
    /// Query parameters
    pub query: &'a IndexMap<String, QueryValue>,
    /// Body before this template ran
    pub body: &'a str,
}

impl<'a> TemplateContext<'a> {
    pub fn new(request: &'a SerializedRequest, body: &'a str) -> Self {
        Self {
            method: &request.method,
            url: request.url.as_str(),
            path: &request.parameters,
            query: &request.query,
            body,
        }
    }
}

handlebars_helper!(upper_helper: |s: str| s.to_uppercase());
handlebars_helper!(lower_helper: |s: str| s.to_lowercase());
handlebars_helper!(json_helper: |v: Json| v.to_string());
handlebars_helper!(default_helper: |v: Json, fallback: str| match v {
    Value::Null => fallback.to_string(),
    Value::String(s) if s.is_empty() => fallback.to_string(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
});

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.register_helper("upper", Box::new(upper_helper));
        handlebars.register_helper("lower", Box::new(lower_helper));
        handlebars.register_helper("json", Box::new(json_helper));
        handlebars.register_helper("default", Box::new(default_helper));

        // Bodies are JSON, XML or plain text, never HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render a template string for a request.
    pub fn render(
        &self,
        template: &str,
        request: &SerializedRequest,
        body: &str,
    ) -> Result<String, handlebars::RenderError> {
        self.handlebars
            .render_template(template, &TemplateContext::new(request, body))
    }

    /// Check that a template parses.
    pub fn validate(template: &str) -> Result<(), handlebars::TemplateError> {
        handlebars::Template::compile(template).map(|_| ())
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
