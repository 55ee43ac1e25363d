//! OpenAPI Mock
//!
//! Answers intercepted HTTP requests from OpenAPI documents, so client code
//! can be exercised against a spec-conformant fake server without a network.
//!
//! # Features
//!
//! - **Request Resolution**: Match server, path template and method to one operation
//! - **Response Synthesis**: Bodies from `examples`, `example`, or the response schema
//! - **JSON and XML**: Bodies rendered per the declared content type
//! - **Status Overrides**: Fixed or computed status codes per document
//! - **Body Transforms**: Literal, functional or Handlebars replacements
//! - **Call Recording**: Query served calls for assertions
//!
//! # Example
//!
//! ```no_run
//! use openapi_mock::{InterceptedRequest, SpecRegistry};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = SpecRegistry::new();
//! let petstore = registry.register("/abs/path/to/petstore.yaml").await?;
//! petstore.set_status(200);
//!
//! let request = InterceptedRequest::new("GET", "https://petstore.swagger.io/v2/pet/69")?;
//! let response = registry.respond(request);
//! assert_eq!(response.status, 200);
//! assert_eq!(petstore.count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod generator;
pub mod intercept;
pub mod loader;
pub mod matcher;
pub mod recorder;
pub mod registry;
pub mod render;
pub mod request;
pub mod status;
pub mod synth;
pub mod template;
pub mod transform;

pub use api::MockedApi;
pub use config::MockConfig;
pub use error::{MockError, SpecLoadError};
pub use generator::{Generator, RandomGenerator};
pub use intercept::{MockResponse, ResponseSink};
pub use recorder::{CallFilter, CallRecord, PathPattern};
pub use registry::SpecRegistry;
pub use request::{InterceptedRequest, QueryValue, SerializedRequest};
pub use status::StatusPolicy;
pub use transform::{Replacement, TransformRule};
