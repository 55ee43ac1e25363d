//! Declarative configuration.
//!
//! Lists the documents to register together with fixed statuses and
//! transform rules, so a mock can be set up without writing code.

use crate::api::MockedApi;
use crate::matcher::decode_path;
use crate::registry::SpecRegistry;
use crate::request::SerializedRequest;
use crate::template::TemplateEngine;
use crate::transform::{Replacement, TransformRule};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockConfig {
    /// Documents to register, in order
    #[serde(default)]
    pub specs: Vec<SpecDefinition>,

    /// Global settings
    #[serde(default)]
    pub settings: GlobalSettings,
}

impl MockConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, spec) in self.specs.iter().enumerate() {
            spec.validate()
                .map_err(|e| anyhow::anyhow!("Spec {}: {}", i, e))?;
        }
        Ok(())
    }

    /// A registry honouring the global settings.
    pub fn build_registry(&self) -> SpecRegistry {
        SpecRegistry::new().with_settings(self.settings.clone())
    }

    /// Register every listed document, resolving relative paths against
    /// `base_dir`, and install its status and transform rules.
    pub async fn apply(
        &self,
        registry: &SpecRegistry,
        base_dir: &Path,
    ) -> anyhow::Result<Vec<Arc<MockedApi>>> {
        let mut apis = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let path = base_dir.join(&spec.path);
            let api = registry.register(&path).await?;
            if let Some(status) = spec.status {
                api.set_status(status);
            }
            for transform in &spec.transforms {
                api.add_transform(transform.to_rule()?);
            }
            apis.push(api);
        }
        Ok(apis)
    }
}

/// A document to register.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecDefinition {
    /// Path to the OpenAPI document
    pub path: PathBuf,

    /// Fixed response status
    #[serde(default)]
    pub status: Option<u16>,

    /// Body transform rules, applied in order
    #[serde(default)]
    pub transforms: Vec<TransformDefinition>,
}

impl SpecDefinition {
    /// Check path, status range and transforms.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.path.as_os_str().is_empty() {
            anyhow::bail!("Spec path cannot be empty");
        }
        if let Some(status) = self.status {
            if !(100..=599).contains(&status) {
                anyhow::bail!("Invalid status code: {}", status);
            }
        }
        for (i, transform) in self.transforms.iter().enumerate() {
            transform
                .validate()
                .map_err(|e| anyhow::anyhow!("Transform {}: {}", i, e))?;
        }
        Ok(())
    }
}

/// A declarative transform rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformDefinition {
    /// Which requests the rule applies to (default: all)
    #[serde(default)]
    pub when: RequestMatcher,

    /// The new body
    pub replace: ReplacementDefinition,

    /// Keep the rule across resets
    #[serde(default)]
    pub persist: bool,
}

impl TransformDefinition {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.when.compile()?;
        if let ReplacementDefinition::Template { template } = &self.replace {
            TemplateEngine::validate(template)
                .map_err(|e| anyhow::anyhow!("Invalid template: {}", e))?;
        }
        Ok(())
    }

    /// Build the runtime rule.
    pub fn to_rule(&self) -> anyhow::Result<TransformRule> {
        let predicate = self.when.compile()?;
        let replacement = match &self.replace {
            ReplacementDefinition::Text { content } => Replacement::Literal(content.clone()),
            ReplacementDefinition::Template { template } => Replacement::Template(template.clone()),
        };
        Ok(TransformRule::new(move |request| predicate.matches(request), replacement).persistent(self.persist))
    }
}

/// Replacement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplacementDefinition {
    /// Fixed text
    Text { content: String },
    /// Handlebars template
    Template { template: String },
}

/// Request matching configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestMatcher {
    /// HTTP method(s) to match (empty = any)
    #[serde(default)]
    pub method: Vec<String>,

    /// Match on the decoded URL path
    #[serde(default)]
    pub path: Option<PathMatcher>,

    /// Query parameter matching
    #[serde(default)]
    pub query: HashMap<String, QueryMatcher>,
}

impl RequestMatcher {
    /// Compile patterns once, up front.
    pub fn compile(&self) -> anyhow::Result<CompiledMatcher> {
        let path = self.path.as_ref().map(PathMatcher::compile).transpose()?;
        let query = self
            .query
            .iter()
            .map(|(name, matcher)| matcher.compile().map(|compiled| (name.clone(), compiled)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(CompiledMatcher {
            methods: self.method.iter().map(|m| m.to_lowercase()).collect(),
            path,
            query,
        })
    }
}

/// Path matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathMatcher {
    /// Exact path match
    Exact { value: String },
    /// Path prefix match
    Prefix { value: String },
    /// Regex pattern match
    Regex { pattern: String },
    /// Glob pattern match
    Glob { pattern: String },
}

impl PathMatcher {
    fn compile(&self) -> anyhow::Result<CompiledPath> {
        Ok(match self {
            PathMatcher::Exact { value } => CompiledPath::Exact(value.clone()),
            PathMatcher::Prefix { value } => CompiledPath::Prefix(value.clone()),
            PathMatcher::Regex { pattern } => CompiledPath::Regex(
                Regex::new(pattern).map_err(|e| anyhow::anyhow!("Invalid regex: {}", e))?,
            ),
            PathMatcher::Glob { pattern } => CompiledPath::Glob(
                globset::Glob::new(pattern)
                    .map_err(|e| anyhow::anyhow!("Invalid glob: {}", e))?
                    .compile_matcher(),
            ),
        })
    }
}

/// Query parameter matching; repeated keys match if any value does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryMatcher {
    /// Exact value match
    Exact { value: String },
    /// Regex pattern match
    Regex { pattern: String },
    /// Parameter must be present (any value)
    Present,
    /// Parameter must be absent
    Absent,
}

impl QueryMatcher {
    fn compile(&self) -> anyhow::Result<CompiledQuery> {
        Ok(match self {
            QueryMatcher::Exact { value } => CompiledQuery::Exact(value.clone()),
            QueryMatcher::Regex { pattern } => CompiledQuery::Regex(
                Regex::new(pattern).map_err(|e| anyhow::anyhow!("Invalid regex: {}", e))?,
            ),
            QueryMatcher::Present => CompiledQuery::Present,
            QueryMatcher::Absent => CompiledQuery::Absent,
        })
    }
}

enum CompiledPath {
    Exact(String),
    Prefix(String),
    Regex(Regex),
    Glob(globset::GlobMatcher),
}

enum CompiledQuery {
    Exact(String),
    Regex(Regex),
    Present,
    Absent,
}

/// A [`RequestMatcher`] ready to test serialized requests.
pub struct CompiledMatcher {
    methods: Vec<String>,
    path: Option<CompiledPath>,
    query: Vec<(String, CompiledQuery)>,
}

impl CompiledMatcher {
    pub fn matches(&self, request: &SerializedRequest) -> bool {
        if !self.methods.is_empty() && !self.methods.contains(&request.method) {
            return false;
        }

        if let Some(path_matcher) = &self.path {
            let path = decode_path(request.url.path());
            let path_ok = match path_matcher {
                CompiledPath::Exact(value) => path == *value,
                CompiledPath::Prefix(value) => path.starts_with(value.as_str()),
                CompiledPath::Regex(regex) => regex.is_match(&path),
                CompiledPath::Glob(glob) => glob.is_match(&path),
            };
            if !path_ok {
                return false;
            }
        }

        self.query.iter().all(|(name, matcher)| {
            let values = request.query.get(name);
            match matcher {
                CompiledQuery::Exact(expected) => {
                    values.is_some_and(|v| v.iter().any(|actual| actual == expected))
                }
                CompiledQuery::Regex(regex) => {
                    values.is_some_and(|v| v.iter().any(|actual| regex.is_match(actual)))
                }
                CompiledQuery::Present => values.is_some(),
                CompiledQuery::Absent => values.is_none(),
            }
        })
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Seed for the fake value generator (random if unset)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Log all matched requests
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log unmatched requests
    #[serde(default = "default_true")]
    pub log_unmatched: bool,
}

fn default_true() -> bool {
    true
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            seed: None,
            log_matches: true,
            log_unmatched: true,
        }
    }
}
