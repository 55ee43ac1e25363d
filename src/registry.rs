//! Registered documents and the request dispatcher.

use crate::api::MockedApi;
use crate::config::GlobalSettings;
use crate::document::Document;
use crate::error::{MockError, Result, SpecLoadError};
use crate::generator::{Generator, RandomGenerator};
use crate::intercept::{MockResponse, ResponseSink};
use crate::loader::{FileSpecLoader, SpecLoader};
use crate::matcher;
use crate::recorder::CallRecord;
use crate::render;
use crate::request::{self, InterceptedRequest};
use crate::status;
use crate::synth;
use crate::template::TemplateEngine;
use crate::transform;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Holds registered documents and answers intercepted requests from them.
///
/// Documents are tried in registration order; the first one that resolves a
/// request serves it.
pub struct SpecRegistry {
    loader: Box<dyn SpecLoader>,
    generator: Arc<dyn Generator>,
    templates: TemplateEngine,
    settings: GlobalSettings,
    apis: RwLock<Vec<Arc<MockedApi>>>,
    /// Total requests handled.
    requests_total: AtomicU64,
    /// Requests resolved to an operation.
    requests_matched: AtomicU64,
    /// Requests no document could resolve.
    requests_unmatched: AtomicU64,
}

impl Default for SpecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecRegistry {
    /// A registry reading documents from disk with an entropy-seeded generator.
    pub fn new() -> Self {
        Self {
            loader: Box::new(FileSpecLoader),
            generator: Arc::new(RandomGenerator::new()),
            templates: TemplateEngine::new(),
            settings: GlobalSettings::default(),
            apis: RwLock::new(Vec::new()),
            requests_total: AtomicU64::new(0),
            requests_matched: AtomicU64::new(0),
            requests_unmatched: AtomicU64::new(0),
        }
    }

    pub fn with_loader(mut self, loader: impl SpecLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_settings(mut self, settings: GlobalSettings) -> Self {
        if let Some(seed) = settings.seed {
            self.generator = Arc::new(RandomGenerator::seeded(seed));
        }
        self.settings = settings;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<MockedApi>>> {
        self.apis.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<MockedApi>>> {
        self.apis.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load and register the document at an absolute path.
    ///
    /// Registering the same file twice returns the first instance.
    pub async fn register(&self, path: impl AsRef<Path>) -> std::result::Result<Arc<MockedApi>, SpecLoadError> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(SpecLoadError::NotAbsolute(path.to_path_buf()));
        }
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|source| SpecLoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if let Some(existing) = self.get(&canonical) {
            return Ok(existing);
        }

        let document = self.loader.load(&canonical).await?;
        Ok(self.register_document(canonical, document))
    }

    /// Register an already loaded document under `key`.
    pub fn register_document(&self, key: PathBuf, document: Document) -> Arc<MockedApi> {
        let mut apis = self.write();
        if let Some(existing) = apis.iter().find(|api| api.path() == key) {
            return Arc::clone(existing);
        }

        info!(
            path = %key.display(),
            servers = document.servers.len(),
            paths = document.paths.len(),
            openapi = document.is_openapi(),
            "Registered API document"
        );
        let api = Arc::new(MockedApi::new(key, document));
        apis.push(Arc::clone(&api));
        api
    }

    /// Remove a document and wipe its state. Returns whether it was registered.
    pub fn unregister(&self, api: &MockedApi) -> bool {
        let mut apis = self.write();
        let before = apis.len();
        apis.retain(|registered| registered.path() != api.path());
        let removed = apis.len() != before;
        if removed {
            api.clear();
            info!(path = %api.path().display(), "Unregistered API document");
        }
        removed
    }

    /// The document registered under a canonical path.
    pub fn get(&self, path: &Path) -> Option<Arc<MockedApi>> {
        self.read().iter().find(|api| api.path() == path).cloned()
    }

    /// Registered documents in registration order.
    pub fn apis(&self) -> Vec<Arc<MockedApi>> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Get total requests handled.
    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Get total requests resolved to an operation.
    pub fn total_matched(&self) -> u64 {
        self.requests_matched.load(Ordering::Relaxed)
    }

    /// Get total requests nothing matched.
    pub fn total_unmatched(&self) -> u64 {
        self.requests_unmatched.load(Ordering::Relaxed)
    }

    /// Answer one intercepted request.
    ///
    /// The sink is always ended, with a 500 and the error text if anything
    /// fails. The request is consumed.
    pub fn handle(&self, request: InterceptedRequest, sink: &mut dyn ResponseSink) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        match self.serve(&request) {
            Ok(response) => {
                sink.set_status(response.status);
                if let Some(content_type) = &response.content_type {
                    sink.set_header("Content-Type", content_type);
                }
                sink.end(response.body);
            }
            Err(err) => {
                if matches!(err, MockError::NoMatch { .. }) {
                    self.requests_unmatched.fetch_add(1, Ordering::Relaxed);
                    if self.settings.log_unmatched {
                        warn!(method = %request.method(), url = %request.url(), "No matching operation found");
                    }
                } else {
                    warn!(
                        method = %request.method(),
                        url = %request.url(),
                        error = %err,
                        "Failed to serve request"
                    );
                }
                sink.set_status(500);
                sink.end(err.to_string());
            }
        }
    }

    /// Answer one intercepted request into a buffered response.
    pub fn respond(&self, request: InterceptedRequest) -> MockResponse {
        let mut response = MockResponse::default();
        self.handle(request, &mut response);
        response
    }

    fn serve(&self, request: &InterceptedRequest) -> Result<MockResponse> {
        let apis = self.apis();
        let (idx, matched) = matcher::resolve(
            apis.iter().map(|api| api.document()),
            request.method(),
            request.url(),
        )
        .ok_or_else(|| MockError::NoMatch {
            method: request.method().to_string(),
            url: request.url().to_string(),
        })?;
        let api = &apis[idx];
        self.requests_matched.fetch_add(1, Ordering::Relaxed);

        if self.settings.log_matches {
            info!(
                document = %api.path().display(),
                template = %matched.template,
                method = %request.method(),
                url = %request.url(),
                "Request matched operation"
            );
        }

        let serialized = request::serialize(matched.template, request);
        let overrides = api.overrides();
        let generator = self.generator.as_ref();

        let selected = status::select(&overrides.status, matched.operation, &serialized, generator)?
            .ok_or_else(|| {
                MockError::Synthesis(format!("operation {} declares no responses", matched.template))
            })?;
        let response = selected.response(matched.operation);
        debug!(
            code = selected.code,
            key = %selected.key,
            declared = response.is_some(),
            "Selected response status"
        );

        let content = response.and_then(|r| r.first_content());
        let content_type = content.map(|(name, _)| name.to_string());
        let value = match content {
            Some((_, media)) => synth::synthesize(media, generator)?,
            None => None,
        };
        let description = response.map(|r| r.description.as_str()).unwrap_or_default();
        let rendered = render::render(value.as_ref(), content_type.as_deref(), description);

        let transformed = transform::apply(rendered, &serialized, &overrides.transforms, generator, &self.templates)?;

        let recorded = if content_type.is_some() && transformed.applied == 0 {
            value.unwrap_or(Value::Null)
        } else {
            Value::String(transformed.body.clone())
        };
        api.record(
            CallRecord {
                request: serialized,
                response: recorded,
                code: selected.code,
            },
            overrides.generation,
        );

        Ok(MockResponse {
            status: selected.code,
            content_type,
            body: transformed.body,
        })
    }
}
