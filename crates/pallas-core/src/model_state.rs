//! Per-request binding and validation state.
//!
//! The [`ModelStateDictionary`] collects everything binding and validation
//! learned about the request: attempted values, errors, and the validation
//! state of every key. It never aborts a request by itself. Filters and
//! actions read it to decide what to do.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default cap on the number of errors a dictionary accepts.
pub const DEFAULT_MAX_ALLOWED_ERRORS: usize = 200;

/// Message recorded once the error cap is hit.
pub const TOO_MANY_ERRORS_MESSAGE: &str = "The maximum number of allowed model errors has been reached.";

/// Validation state of a single key (or of the whole dictionary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    /// Nothing has validated this key yet.
    #[default]
    Unvalidated,
    /// At least one error was recorded.
    Invalid,
    /// Validation ran and found no errors.
    Valid,
    /// Validation was intentionally skipped.
    Skipped,
}

/// What produced a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelErrorKind {
    /// A plain message from a binder or validator.
    Message,
    /// The request body content type had no matching input formatter.
    UnsupportedContentType,
    /// A binder or formatter failed while reading input.
    InputFormat,
    /// The error cap was reached.
    TooManyErrors,
}

/// A single binding or validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelError {
    /// Human-readable message.
    pub message: String,
    /// Classification of the error.
    pub kind: ModelErrorKind,
}

impl ModelError {
    /// Creates a message error.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ModelErrorKind::Message,
        }
    }

    /// Creates an error of a specific kind.
    #[must_use]
    pub fn with_kind(message: impl Into<String>, kind: ModelErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

/// State recorded for one key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStateEntry {
    /// The raw value produced by binding, if any.
    pub raw_value: Option<serde_json::Value>,
    /// The textual value the client sent, if any.
    pub attempted_value: Option<String>,
    /// Errors recorded for this key.
    pub errors: Vec<ModelError>,
    /// Validation state of this key.
    pub validation_state: ValidationState,
}

/// Ordered map of model-state keys to entries.
///
/// # Example
///
/// ```
/// use pallas_core::{ModelStateDictionary, ValidationState};
///
/// let mut state = ModelStateDictionary::new();
/// state.add_model_error("order.Total", "The field Total must be positive.");
/// assert!(!state.is_valid());
/// assert_eq!(state.validation_state_of("order.Total"), ValidationState::Invalid);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStateDictionary {
    entries: IndexMap<String, ModelStateEntry>,
    max_allowed_errors: usize,
    error_count: usize,
    has_recorded_max_error: bool,
}

impl Default for ModelStateDictionary {
    fn default() -> Self {
        Self::with_max_errors(DEFAULT_MAX_ALLOWED_ERRORS)
    }
}

impl ModelStateDictionary {
    /// Creates a dictionary with the default error cap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dictionary with a specific error cap.
    ///
    /// A cap of zero is treated as one so the "too many errors" marker
    /// always fits.
    #[must_use]
    pub fn with_max_errors(max_allowed_errors: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_allowed_errors: max_allowed_errors.max(1),
            error_count: 0,
            has_recorded_max_error: false,
        }
    }

    /// Returns the configured error cap.
    #[must_use]
    pub fn max_allowed_errors(&self) -> usize {
        self.max_allowed_errors
    }

    /// Returns the number of errors recorded, including the cap marker.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Returns `true` once the cap has been reached.
    #[must_use]
    pub fn has_reached_max_errors(&self) -> bool {
        self.has_recorded_max_error
    }

    /// Records a message error for `key`.
    ///
    /// Returns `false` if the error was dropped because the cap was reached.
    pub fn add_model_error(&mut self, key: impl Into<String>, message: impl Into<String>) -> bool {
        self.try_add_error(key.into(), ModelError::message(message))
    }

    /// Records an error of any kind for `key`.
    pub fn try_add_error(&mut self, key: String, error: ModelError) -> bool {
        if self.error_count + 1 >= self.max_allowed_errors {
            self.record_max_errors_reached();
            return false;
        }
        self.error_count += 1;
        let entry = self.entries.entry(key).or_default();
        entry.validation_state = ValidationState::Invalid;
        entry.errors.push(error);
        true
    }

    fn record_max_errors_reached(&mut self) {
        if self.has_recorded_max_error {
            return;
        }
        tracing::warn!(
            max_allowed_errors = self.max_allowed_errors,
            "model state error cap reached"
        );
        self.has_recorded_max_error = true;
        self.error_count += 1;
        let entry = self.entries.entry(String::new()).or_default();
        entry.validation_state = ValidationState::Invalid;
        entry.errors.push(ModelError::with_kind(
            TOO_MANY_ERRORS_MESSAGE,
            ModelErrorKind::TooManyErrors,
        ));
    }

    /// Records the value binding produced for `key`.
    pub fn set_model_value(
        &mut self,
        key: impl Into<String>,
        raw_value: Option<serde_json::Value>,
        attempted_value: Option<String>,
    ) {
        let entry = self.entries.entry(key.into()).or_default();
        entry.raw_value = raw_value;
        entry.attempted_value = attempted_value;
    }

    /// Marks `key` valid unless it already holds errors.
    pub fn mark_field_valid(&mut self, key: impl Into<String>) {
        let entry = self.entries.entry(key.into()).or_default();
        if entry.validation_state != ValidationState::Invalid {
            entry.validation_state = ValidationState::Valid;
        }
    }

    /// Marks `key` skipped unless it already holds errors.
    pub fn mark_field_skipped(&mut self, key: impl Into<String>) {
        let entry = self.entries.entry(key.into()).or_default();
        if entry.validation_state != ValidationState::Invalid {
            entry.validation_state = ValidationState::Skipped;
        }
    }

    /// Marks `key` and every existing key nested under it skipped, leaving
    /// invalid entries alone.
    pub fn mark_skipped_under(&mut self, key: &str) {
        for (k, entry) in &mut self.entries {
            if crate::keys::is_prefix_of(key, k) && entry.validation_state != ValidationState::Invalid {
                entry.validation_state = ValidationState::Skipped;
            }
        }
    }

    /// Returns the entry for an exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ModelStateEntry> {
        self.entries.get(key)
    }

    /// Returns the validation state of an exact key.
    #[must_use]
    pub fn validation_state_of(&self, key: &str) -> ValidationState {
        self.entries
            .get(key)
            .map_or(ValidationState::Unvalidated, |e| e.validation_state)
    }

    /// Returns the combined state of `key` and every key nested under it.
    #[must_use]
    pub fn field_validation_state(&self, key: &str) -> ValidationState {
        combine(
            self.entries
                .iter()
                .filter(|(k, _)| crate::keys::is_prefix_of(key, k))
                .map(|(_, e)| e.validation_state),
        )
    }

    /// Returns `true` if `key` or a key nested under it holds errors.
    #[must_use]
    pub fn has_errors_under(&self, key: &str) -> bool {
        self.entries
            .iter()
            .any(|(k, e)| !e.errors.is_empty() && crate::keys::is_prefix_of(key, k))
    }

    /// Returns the combined validation state of the dictionary.
    #[must_use]
    pub fn validation_state(&self) -> ValidationState {
        combine(self.entries.values().map(|e| e.validation_state))
    }

    /// Returns `true` if every entry is valid or skipped.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(
            self.validation_state(),
            ValidationState::Valid | ValidationState::Skipped
        )
    }

    /// Returns `true` if any error of `kind` was recorded.
    #[must_use]
    pub fn has_error_kind(&self, kind: ModelErrorKind) -> bool {
        self.entries
            .values()
            .flat_map(|e| e.errors.iter())
            .any(|e| e.kind == kind)
    }

    /// Removes `key` and every key nested under it.
    pub fn clear_under(&mut self, key: &str) {
        let before: usize = self.entries.values().map(|e| e.errors.len()).sum();
        self.entries
            .retain(|k, _| !crate::keys::is_prefix_of(key, k));
        let after: usize = self.entries.values().map(|e| e.errors.len()).sum();
        self.error_count = self.error_count.saturating_sub(before - after);
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelStateEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no keys were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Projects the errors into `key → [messages]`, skipping error-free keys.
    ///
    /// This is the body written by the bad-request result.
    #[must_use]
    pub fn to_error_map(&self) -> IndexMap<String, Vec<String>> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.errors.is_empty())
            .map(|(k, e)| {
                (
                    k.clone(),
                    e.errors.iter().map(|err| err.message.clone()).collect(),
                )
            })
            .collect()
    }
}

fn combine(states: impl Iterator<Item = ValidationState>) -> ValidationState {
    let mut combined = ValidationState::Valid;
    let mut all_skipped = true;
    let mut any = false;
    for state in states {
        any = true;
        match state {
            ValidationState::Invalid => return ValidationState::Invalid,
            ValidationState::Unvalidated => combined = ValidationState::Unvalidated,
            ValidationState::Valid => all_skipped = false,
            ValidationState::Skipped => {}
        }
    }
    if combined == ValidationState::Unvalidated {
        return combined;
    }
    if any && all_skipped {
        ValidationState::Skipped
    } else {
        ValidationState::Valid
    }
}
