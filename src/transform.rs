//! Caller-registered post-processing of rendered bodies.

use crate::error::{MockError, Result};
use crate::generator::Generator;
use crate::request::SerializedRequest;
use crate::template::TemplateEngine;
use std::fmt;
use std::sync::Arc;

/// Decides whether a rule applies to a request.
pub type RequestPredicate = Arc<dyn Fn(&SerializedRequest) -> bool + Send + Sync>;

/// Computes a new body from the previous one.
pub type ReplaceFn = Arc<dyn Fn(&str, &SerializedRequest, &dyn Generator) -> String + Send + Sync>;

/// What a matching rule does to the body.
#[derive(Clone)]
pub enum Replacement {
    /// Discard the previous body
    Literal(String),
    /// `f(previous, request, generator)`
    Function(ReplaceFn),
    /// Handlebars template over the request and `body` (the previous body)
    Template(String),
}

impl Replacement {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&str, &SerializedRequest, &dyn Generator) -> String + Send + Sync + 'static,
    {
        Replacement::Function(Arc::new(f))
    }
}

impl From<&str> for Replacement {
    fn from(text: &str) -> Self {
        Replacement::Literal(text.to_string())
    }
}

impl From<String> for Replacement {
    fn from(text: String) -> Self {
        Replacement::Literal(text)
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Replacement::Function(_) => f.write_str("Function(..)"),
            Replacement::Template(template) => f.debug_tuple("Template").field(template).finish(),
        }
    }
}

/// A predicate-guarded body replacement.
#[derive(Clone)]
pub struct TransformRule {
    predicate: RequestPredicate,
    replacement: Replacement,
    /// Persistent rules survive `reset()`
    pub persist: bool,
}

impl TransformRule {
    pub fn new<P>(predicate: P, replacement: impl Into<Replacement>) -> Self
    where
        P: Fn(&SerializedRequest) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            replacement: replacement.into(),
            persist: false,
        }
    }

    /// Keep the rule across resets.
    pub fn persistent(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn applies_to(&self, request: &SerializedRequest) -> bool {
        (self.predicate)(request)
    }

    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }
}

impl fmt::Debug for TransformRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRule")
            .field("replacement", &self.replacement)
            .field("persist", &self.persist)
            .finish_non_exhaustive()
    }
}

/// Result of running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub body: String,
    /// Number of rules whose predicate held
    pub applied: usize,
}

/// Fold the matching rules over the body, in registration order.
pub fn apply(
    initial: String,
    request: &SerializedRequest,
    rules: &[TransformRule],
    generator: &dyn Generator,
    templates: &TemplateEngine,
) -> Result<Transformed> {
    let mut body = initial;
    let mut applied = 0;
    for rule in rules.iter().filter(|rule| rule.applies_to(request)) {
        applied += 1;
        body = match &rule.replacement {
            Replacement::Literal(text) => text.clone(),
            Replacement::Function(f) => f(&body, request, generator),
            Replacement::Template(template) => templates
                .render(template, request, &body)
                .map_err(|e| MockError::Template(e.to_string()))?,
        };
    }
    Ok(Transformed { body, applied })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::RandomGenerator;
    use crate::request::{serialize, InterceptedRequest};

    fn request(url: &str) -> SerializedRequest {
        serialize("/store/order/{orderId}", &InterceptedRequest::new("GET", url).unwrap())
    }

    fn run(rules: &[TransformRule], req: &SerializedRequest) -> Transformed {
        apply(
            "original".to_string(),
            req,
            rules,
            &RandomGenerator::seeded(0),
            &TemplateEngine::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_no_matching_rule_keeps_body() {
        let rules = vec![TransformRule::new(|_| false, "nope")];
        let out = run(&rules, &request("https://example.com/store/order/1"));
        assert_eq!(out.body, "original");
        assert_eq!(out.applied, 0);
    }

    #[test]
    fn test_fold_in_registration_order() {
        let rules = vec![
            TransformRule::new(|r| r.url.path().contains("/store/order"), "Something went wrong"),
            TransformRule::new(|_| false, "skipped"),
            TransformRule::new(
                |_| true,
                Replacement::function(|prev, req, _| {
                    format!("{prev} (order {})", req.param("orderId").unwrap_or("?"))
                }),
            ),
        ];
        let out = run(&rules, &request("https://example.com/store/order/69"));
        assert_eq!(out.body, "Something went wrong (order 69)");
        assert_eq!(out.applied, 2);
    }

    #[test]
    fn test_function_receives_generator() {
        let rules = vec![TransformRule::new(
            |_| true,
            Replacement::function(|_, _, generator| generator.integer_between(3, 3).to_string()),
        )];
        let out = run(&rules, &request("https://example.com/store/order/1"));
        assert_eq!(out.body, "3");
    }

    #[test]
    fn test_template_replacement() {
        let rules = vec![TransformRule::new(
            |_| true,
            Replacement::Template("{{body}}#{{path.orderId}}".to_string()),
        )];
        let out = run(&rules, &request("https://example.com/store/order/5"));
        assert_eq!(out.body, "original#5");
    }

    #[test]
    fn test_persistent_builder() {
        let rule = TransformRule::new(|_| true, "x").persistent(true);
        assert!(rule.persist);
        assert!(!TransformRule::new(|_| true, "x").persist);
    }
}
