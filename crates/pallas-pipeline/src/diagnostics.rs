//! Named events emitted around every pipeline stage and filter.
//!
//! Listeners are asked [`DiagnosticListener::is_enabled`] first; an event
//! nobody listens to is never built.

use crate::descriptor::ActionDescriptor;
use pallas_core::RequestId;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Event names.
pub mod events {
    /// Before the pipeline starts.
    pub const BEFORE_ACTION: &str = "Pallas.BeforeAction";
    /// After the pipeline finished, successfully or not.
    pub const AFTER_ACTION: &str = "Pallas.AfterAction";
    /// Before an authorization filter.
    pub const BEFORE_ON_AUTHORIZATION: &str = "Pallas.BeforeOnAuthorization";
    /// After an authorization filter.
    pub const AFTER_ON_AUTHORIZATION: &str = "Pallas.AfterOnAuthorization";
    /// Before a resource filter.
    pub const BEFORE_ON_RESOURCE_EXECUTION: &str = "Pallas.BeforeOnResourceExecution";
    /// After a resource filter.
    pub const AFTER_ON_RESOURCE_EXECUTION: &str = "Pallas.AfterOnResourceExecution";
    /// Before parameters are bound.
    pub const BEFORE_MODEL_BINDING: &str = "Pallas.BeforeModelBinding";
    /// After parameters were bound.
    pub const AFTER_MODEL_BINDING: &str = "Pallas.AfterModelBinding";
    /// Before an action filter.
    pub const BEFORE_ON_ACTION_EXECUTION: &str = "Pallas.BeforeOnActionExecution";
    /// After an action filter.
    pub const AFTER_ON_ACTION_EXECUTION: &str = "Pallas.AfterOnActionExecution";
    /// Before the action method.
    pub const BEFORE_ACTION_METHOD: &str = "Pallas.BeforeActionMethod";
    /// After the action method.
    pub const AFTER_ACTION_METHOD: &str = "Pallas.AfterActionMethod";
    /// Before an exception filter.
    pub const BEFORE_ON_EXCEPTION: &str = "Pallas.BeforeOnException";
    /// After an exception filter.
    pub const AFTER_ON_EXCEPTION: &str = "Pallas.AfterOnException";
    /// Before a result filter.
    pub const BEFORE_ON_RESULT_EXECUTION: &str = "Pallas.BeforeOnResultExecution";
    /// After a result filter.
    pub const AFTER_ON_RESULT_EXECUTION: &str = "Pallas.AfterOnResultExecution";
    /// Before a result executes.
    pub const BEFORE_ACTION_RESULT: &str = "Pallas.BeforeActionResult";
    /// After a result executed.
    pub const AFTER_ACTION_RESULT: &str = "Pallas.AfterActionResult";
}

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// The whole invocation.
    Action,
    /// Authorization filters.
    Authorization,
    /// Resource filters.
    Resource,
    /// Parameter binding and validation.
    ModelBinding,
    /// Action filters.
    ActionFilter,
    /// The action method.
    ActionMethod,
    /// Exception filters.
    Exception,
    /// Result filters.
    ResultFilter,
    /// Result execution.
    ActionResult,
}

impl PipelineStage {
    /// Lowercase name for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Authorization => "authorization",
            Self::Resource => "resource",
            Self::ModelBinding => "model_binding",
            Self::ActionFilter => "action_filter",
            Self::ActionMethod => "action_method",
            Self::Exception => "exception",
            Self::ResultFilter => "result_filter",
            Self::ActionResult => "action_result",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-specific part of an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    /// Nothing beyond the stage.
    None,
    /// The filter ended the pipeline early.
    ShortCircuited,
    /// An error is travelling through the stage.
    Failed {
        /// Error message.
        error: String,
    },
    /// An exception filter handled the error.
    Handled,
    /// The pipeline finished and wrote a response.
    Finished {
        /// Response status code.
        status: u16,
        /// Time spent in the pipeline.
        elapsed: Duration,
    },
    /// The pipeline returned an error to the host.
    Unhandled {
        /// Error message.
        error: String,
        /// Time spent in the pipeline.
        elapsed: Duration,
    },
}

/// One diagnostic event.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent<'a> {
    /// Event name, one of [`events`].
    pub name: &'static str,
    /// Stage the event belongs to.
    pub stage: PipelineStage,
    /// The action being invoked.
    pub action: &'a ActionDescriptor,
    /// The request id.
    pub request_id: RequestId,
    /// The filter, for filter events.
    pub filter: Option<&'a str>,
    /// Stage-specific detail.
    pub detail: EventDetail,
}

/// Receives diagnostic events.
pub trait DiagnosticListener: Send + Sync {
    /// Whether the listener wants events named `name`.
    fn is_enabled(&self, name: &str) -> bool {
        let _ = name;
        true
    }

    /// Handles one event.
    fn on_event(&self, event: &DiagnosticEvent<'_>);
}

/// The set of registered listeners.
#[derive(Clone, Default)]
pub struct Diagnostics {
    listeners: Vec<Arc<dyn DiagnosticListener>>,
}

impl Diagnostics {
    /// No listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener.
    #[must_use]
    pub fn with(mut self, listener: Arc<dyn DiagnosticListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Adds a listener.
    pub fn add(&mut self, listener: Arc<dyn DiagnosticListener>) {
        self.listeners.push(listener);
    }

    /// Returns `true` if any listener wants `name`.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.listeners.iter().any(|listener| listener.is_enabled(name))
    }

    /// Builds the event only if a listener wants it, then delivers it.
    pub fn emit<'a>(&self, name: &'static str, build: impl FnOnce() -> DiagnosticEvent<'a>) {
        if !self.is_enabled(name) {
            return;
        }
        let event = build();
        for listener in &self.listeners {
            if listener.is_enabled(name) {
                listener.on_event(&event);
            }
        }
    }

    /// Number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if nothing listens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControllerTypeInfo;
    use crate::descriptor::ActionMethod;
    use crate::results::EmptyResult;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct OnlyActions(Mutex<Vec<&'static str>>);

    impl DiagnosticListener for OnlyActions {
        fn is_enabled(&self, name: &str) -> bool {
            name.ends_with("Action")
        }

        fn on_event(&self, event: &DiagnosticEvent<'_>) {
            self.0.lock().push(event.name);
        }
    }

    #[test]
    fn test_disabled_events_are_not_built() {
        let diagnostics = Diagnostics::new();
        assert!(!diagnostics.is_enabled(events::BEFORE_ACTION));
        diagnostics.emit(events::BEFORE_ACTION, || {
            unreachable!("event built with no listeners")
        });
    }

    #[test]
    fn test_listener_filters_by_name() {
        let listener = Arc::new(OnlyActions::default());
        let diagnostics = Diagnostics::new().with(listener.clone());
        let descriptor = ActionDescriptor::new(
            ControllerTypeInfo::unit("HomeController"),
            "Index",
            ActionMethod::from_fn(|_| async { Ok(EmptyResult) }),
        );
        let event = |name| DiagnosticEvent {
            name,
            stage: PipelineStage::Action,
            action: &descriptor,
            request_id: RequestId::new(),
            filter: None,
            detail: EventDetail::None,
        };

        diagnostics.emit(events::BEFORE_ACTION, || event(events::BEFORE_ACTION));
        diagnostics.emit(events::BEFORE_MODEL_BINDING, || {
            event(events::BEFORE_MODEL_BINDING)
        });
        diagnostics.emit(events::AFTER_ACTION, || event(events::AFTER_ACTION));

        assert_eq!(
            *listener.0.lock(),
            [events::BEFORE_ACTION, events::AFTER_ACTION]
        );
    }
}
