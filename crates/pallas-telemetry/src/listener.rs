//! Diagnostic events as structured `tracing` events.

use pallas_pipeline::{DiagnosticEvent, DiagnosticListener, EventDetail};

/// Logs every diagnostic event.
///
/// Stage boundaries go out at `trace`, short-circuits and handled errors at
/// `debug`, finished invocations at `info`, failures travelling through a
/// stage at `warn` and errors returned to the host at `error`.
///
/// # Example
///
/// ```
/// use pallas_pipeline::Diagnostics;
/// use pallas_telemetry::TracingDiagnosticListener;
/// use std::sync::Arc;
///
/// let diagnostics = Diagnostics::new().with(Arc::new(TracingDiagnosticListener::new()));
/// assert_eq!(diagnostics.len(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TracingDiagnosticListener {
    stage_events: bool,
}

impl Default for TracingDiagnosticListener {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingDiagnosticListener {
    /// A listener that logs every event.
    #[must_use]
    pub fn new() -> Self {
        Self { stage_events: true }
    }

    /// Skips the plain `Before*`/`After*` stage boundaries and keeps only
    /// events that carry an outcome.
    #[must_use]
    pub fn outcomes_only(mut self) -> Self {
        self.stage_events = false;
        self
    }
}

impl DiagnosticListener for TracingDiagnosticListener {
    fn is_enabled(&self, name: &str) -> bool {
        self.stage_events || name.starts_with("Pallas.After")
    }

    fn on_event(&self, event: &DiagnosticEvent<'_>) {
        let action_id = event.action.id.as_str();
        let request_id = event.request_id;
        let stage = event.stage.as_str();
        let filter = event.filter.unwrap_or_default();
        match &event.detail {
            EventDetail::None => {
                if self.stage_events {
                    tracing::trace!(%request_id, action_id, stage, filter, event = event.name);
                }
            }
            EventDetail::ShortCircuited => {
                tracing::debug!(
                    %request_id,
                    action_id,
                    stage,
                    filter,
                    event = event.name,
                    "filter short-circuited the pipeline"
                );
            }
            EventDetail::Handled => {
                tracing::debug!(
                    %request_id,
                    action_id,
                    filter,
                    event = event.name,
                    "exception filter handled the error"
                );
            }
            EventDetail::Failed { error } => {
                tracing::warn!(
                    %request_id,
                    action_id,
                    stage,
                    filter,
                    error = %error,
                    event = event.name,
                    "pipeline stage failed"
                );
            }
            EventDetail::Finished { status, elapsed } => {
                tracing::info!(
                    %request_id,
                    action_id,
                    status,
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    "action executed"
                );
            }
            EventDetail::Unhandled { error, elapsed } => {
                tracing::error!(
                    %request_id,
                    action_id,
                    error = %error,
                    duration_ms = elapsed.as_secs_f64() * 1000.0,
                    "action failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pallas_core::RequestId;
    use pallas_pipeline::diagnostics::events;
    use pallas_pipeline::{
        ActionDescriptor, ActionMethod, ControllerTypeInfo, EmptyResult, PipelineStage,
    };
    use std::time::Duration;

    #[test]
    fn test_outcomes_only_skips_before_events() {
        let listener = TracingDiagnosticListener::new().outcomes_only();
        assert!(!listener.is_enabled(events::BEFORE_ACTION_METHOD));
        assert!(listener.is_enabled(events::AFTER_ACTION));
        assert!(TracingDiagnosticListener::default().is_enabled(events::BEFORE_ACTION_METHOD));
    }

    #[test]
    fn test_every_detail_logs_without_subscriber() {
        let action = ActionDescriptor::new(
            ControllerTypeInfo::unit("HomeController"),
            "Index",
            ActionMethod::from_fn(|_| async { Ok(EmptyResult) }),
        );
        let details = [
            EventDetail::None,
            EventDetail::ShortCircuited,
            EventDetail::Handled,
            EventDetail::Failed {
                error: "boom".to_string(),
            },
            EventDetail::Finished {
                status: 200,
                elapsed: Duration::from_millis(2),
            },
            EventDetail::Unhandled {
                error: "boom".to_string(),
                elapsed: Duration::from_millis(2),
            },
        ];
        let listener = TracingDiagnosticListener::new();
        for detail in details {
            listener.on_event(&DiagnosticEvent {
                name: events::AFTER_ACTION,
                stage: PipelineStage::Action,
                action: &action,
                request_id: RequestId::new(),
                filter: Some("Logging"),
                detail,
            });
        }
    }
}
