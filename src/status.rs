//! Response status selection.

use crate::document::{Operation, ResponseSpec};
use crate::error::{MockError, Result};
use crate::generator::Generator;
use crate::request::SerializedRequest;
use std::fmt;
use std::sync::Arc;

/// Computes a status code from the request being served.
pub type StatusFn = Arc<dyn Fn(&SerializedRequest) -> u16 + Send + Sync>;

/// How a document picks the status of its responses.
#[derive(Clone, Default)]
pub enum StatusPolicy {
    /// Uniformly random among the operation's declared codes
    #[default]
    Default,
    /// Always this code, declared or not
    Fixed(u16),
    /// Computed per request
    Predicate(StatusFn),
}

impl StatusPolicy {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&SerializedRequest) -> u16 + Send + Sync + 'static,
    {
        StatusPolicy::Predicate(Arc::new(f))
    }
}

impl From<u16> for StatusPolicy {
    fn from(code: u16) -> Self {
        StatusPolicy::Fixed(code)
    }
}

impl fmt::Debug for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPolicy::Default => f.write_str("Default"),
            StatusPolicy::Fixed(code) => f.debug_tuple("Fixed").field(code).finish(),
            StatusPolicy::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A chosen status: the key it was chosen by and the code put on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStatus {
    pub key: String,
    pub code: u16,
}

impl SelectedStatus {
    fn from_code(code: u16) -> Self {
        Self {
            key: code.to_string(),
            code,
        }
    }

    /// Turn a declared response key into a wire code: `default` serves 500,
    /// a range key like `4XX` serves its first code.
    fn from_key(key: &str) -> Self {
        let code = key.parse().unwrap_or_else(|_| {
            match key.chars().next().and_then(|c| c.to_digit(10)) {
                Some(class) if key.len() == 3 && key[1..].eq_ignore_ascii_case("xx") => {
                    class as u16 * 100
                }
                _ => 500,
            }
        });
        Self {
            key: key.to_string(),
            code,
        }
    }

    /// Find the declared response for this status: exact key, then range
    /// key, then `default`.
    pub fn response<'a>(&self, operation: &'a Operation) -> Option<&'a ResponseSpec> {
        let range = format!("{}XX", self.code / 100);
        operation
            .responses
            .get(&self.key)
            .or_else(|| {
                operation
                    .responses
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(&range))
                    .map(|(_, response)| response)
            })
            .or_else(|| operation.responses.get("default"))
    }
}

/// Choose the status for a request.
///
/// Returns `Ok(None)` only when the policy is `Default` and the operation
/// declares no responses at all.
pub fn select(
    policy: &StatusPolicy,
    operation: &Operation,
    request: &SerializedRequest,
    generator: &dyn Generator,
) -> Result<Option<SelectedStatus>> {
    let selected = match policy {
        StatusPolicy::Default => {
            let len = operation.responses.len();
            if len == 0 {
                return Ok(None);
            }
            let (key, _) = operation
                .responses
                .get_index(generator.index(len))
                .ok_or_else(|| MockError::Synthesis("generator index out of range".to_string()))?;
            SelectedStatus::from_key(key)
        }
        StatusPolicy::Fixed(code) => SelectedStatus::from_code(*code),
        StatusPolicy::Predicate(f) => SelectedStatus::from_code(f(request)),
    };
    Ok(Some(selected))
}
