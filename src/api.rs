//! Per-document mock handle.

use crate::document::Document;
use crate::recorder::{CallFilter, CallRecord, CallRecorder};
use crate::status::StatusPolicy;
use crate::transform::TransformRule;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Mutable state of a registered document.
#[derive(Debug, Default)]
struct ApiState {
    status: StatusPolicy,
    transforms: Vec<TransformRule>,
    calls: CallRecorder,
    /// Bumped by every reset; records from an older generation are dropped
    generation: u64,
}

/// Status policy and transform rules as of one point in time.
pub(crate) struct Overrides {
    pub status: StatusPolicy,
    pub transforms: Vec<TransformRule>,
    pub generation: u64,
}

/// A registered document together with its status policy, transform rules
/// and call log.
///
/// All state sits behind one lock, so concurrent requests against the same
/// document each append exactly one record.
#[derive(Debug)]
pub struct MockedApi {
    path: PathBuf,
    document: Document,
    state: Mutex<ApiState>,
}

impl MockedApi {
    pub(crate) fn new(path: PathBuf, document: Document) -> Self {
        Self {
            path,
            document,
            state: Mutex::new(ApiState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ApiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Canonical path the document was registered under.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_openapi(&self) -> bool {
        self.document.is_openapi()
    }

    /// Override status selection until the next `reset()`.
    pub fn set_status(&self, policy: impl Into<StatusPolicy>) {
        let policy = policy.into();
        debug!(document = %self.path.display(), policy = ?policy, "Status policy set");
        self.state().status = policy;
    }

    /// Register a transform rule; rules run in registration order.
    pub fn add_transform(&self, rule: TransformRule) {
        self.state().transforms.push(rule);
    }

    /// Drop every transform rule, persistent ones included.
    pub fn clear_transforms(&self) {
        self.state().transforms.clear();
    }

    /// Number of served calls.
    pub fn count(&self) -> usize {
        self.state().calls.count()
    }

    /// The first served call passing `filter`.
    pub fn query(&self, filter: &CallFilter) -> Option<CallRecord> {
        self.state().calls.query(filter).cloned()
    }

    /// The first served call.
    pub fn first(&self) -> Option<CallRecord> {
        self.query(&CallFilter::default())
    }

    /// Every served call, in service order.
    pub fn all(&self) -> Vec<CallRecord> {
        self.state().calls.all().to_vec()
    }

    /// Clear the call log, restore default status selection and drop
    /// non-persistent transform rules.
    ///
    /// A request still in flight under the old settings is not recorded.
    pub fn reset(&self) {
        let mut state = self.state();
        state.calls.clear();
        state.status = StatusPolicy::Default;
        state.transforms.retain(|rule| rule.persist);
        state.generation += 1;
    }

    /// Wipe everything, persistent rules included.
    pub(crate) fn clear(&self) {
        let mut state = self.state();
        let generation = state.generation + 1;
        *state = ApiState {
            generation,
            ..ApiState::default()
        };
    }

    /// Status policy and transform rules as of now.
    pub(crate) fn overrides(&self) -> Overrides {
        let state = self.state();
        Overrides {
            status: state.status.clone(),
            transforms: state.transforms.clone(),
            generation: state.generation,
        }
    }

    /// Append a call served under the overrides of `generation`. Returns
    /// false if a reset happened since.
    pub(crate) fn record(&self, record: CallRecord, generation: u64) -> bool {
        let mut state = self.state();
        if state.generation != generation {
            debug!(
                document = %self.path.display(),
                url = %record.request.url,
                "Dropping call served before reset"
            );
            return false;
        }
        state.calls.record(record);
        true
    }
}
