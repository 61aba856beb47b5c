//! Pipeline metrics through the `metrics` facade.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `pallas_actions_total` | Counter | `action`, `status` | Finished invocations |
//! | `pallas_action_duration_seconds` | Histogram | `action` | Invocation latency |
//! | `pallas_filter_short_circuits_total` | Counter | `action`, `stage`, `filter` | Filters that ended the pipeline |
//! | `pallas_unhandled_exceptions_total` | Counter | `action` | Errors returned to the host |
//!
//! Nothing is exported from here; install any `metrics` recorder (a
//! Prometheus exporter, a statsd bridge) to collect the values.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use pallas_pipeline::diagnostics::events;
use pallas_pipeline::{DiagnosticEvent, DiagnosticListener, EventDetail};
use std::time::Duration;

/// Metric names.
pub mod names {
    /// Finished invocations.
    pub const ACTIONS_TOTAL: &str = "pallas_actions_total";
    /// Invocation latency.
    pub const ACTION_DURATION_SECONDS: &str = "pallas_action_duration_seconds";
    /// Filters that ended the pipeline early.
    pub const FILTER_SHORT_CIRCUITS_TOTAL: &str = "pallas_filter_short_circuits_total";
    /// Errors that reached the host.
    pub const UNHANDLED_EXCEPTIONS_TOTAL: &str = "pallas_unhandled_exceptions_total";
}

/// Registers descriptions for the pipeline metrics with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        names::ACTIONS_TOTAL,
        Unit::Count,
        "Total number of action invocations by final status"
    );
    describe_histogram!(
        names::ACTION_DURATION_SECONDS,
        Unit::Seconds,
        "Time spent in the action pipeline"
    );
    describe_counter!(
        names::FILTER_SHORT_CIRCUITS_TOTAL,
        Unit::Count,
        "Filters that short-circuited the pipeline"
    );
    describe_counter!(
        names::UNHANDLED_EXCEPTIONS_TOTAL,
        Unit::Count,
        "Pipeline errors no exception filter handled"
    );
}

/// Records a finished invocation.
pub fn record_action(action: &str, status: u16, elapsed: Duration) {
    counter!(
        names::ACTIONS_TOTAL,
        "action" => action.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(names::ACTION_DURATION_SECONDS, "action" => action.to_string())
        .record(elapsed.as_secs_f64());
}

/// Records an invocation that returned an error to the host.
pub fn record_unhandled(action: &str, elapsed: Duration) {
    counter!(
        names::ACTIONS_TOTAL,
        "action" => action.to_string(),
        "status" => "error"
    )
    .increment(1);
    counter!(names::UNHANDLED_EXCEPTIONS_TOTAL, "action" => action.to_string()).increment(1);
    histogram!(names::ACTION_DURATION_SECONDS, "action" => action.to_string())
        .record(elapsed.as_secs_f64());
}

/// Records a filter short-circuit.
pub fn record_short_circuit(action: &str, stage: &'static str, filter: &str) {
    counter!(
        names::FILTER_SHORT_CIRCUITS_TOTAL,
        "action" => action.to_string(),
        "stage" => stage,
        "filter" => filter.to_string()
    )
    .increment(1);
}

/// Turns diagnostic events into metrics.
///
/// Only `After*` events are observed: the final event of an invocation
/// feeds the counters and the latency histogram, and any filter event
/// reporting a short-circuit bumps the short-circuit counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsDiagnosticListener;

impl MetricsDiagnosticListener {
    /// Creates the listener.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticListener for MetricsDiagnosticListener {
    fn is_enabled(&self, name: &str) -> bool {
        name.starts_with("Pallas.After")
    }

    fn on_event(&self, event: &DiagnosticEvent<'_>) {
        let action = event.action.id.as_str();
        match (&event.detail, event.name) {
            (EventDetail::Finished { status, elapsed }, events::AFTER_ACTION) => {
                record_action(action, *status, *elapsed);
            }
            (EventDetail::Unhandled { elapsed, .. }, events::AFTER_ACTION) => {
                record_unhandled(action, *elapsed);
            }
            (EventDetail::ShortCircuited, _) => {
                record_short_circuit(action, event.stage.as_str(), event.filter.unwrap_or("-"));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{
        Counter, CounterFn, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder,
        SharedString,
    };
    use pallas_core::RequestId;
    use pallas_pipeline::{
        ActionDescriptor, ActionMethod, ControllerTypeInfo, EmptyResult, PipelineStage,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorded {
        key: String,
        log: Log,
    }

    impl CounterFn for Recorded {
        fn increment(&self, value: u64) {
            self.log.lock().push(format!("{} +{value}", self.key));
        }

        fn absolute(&self, value: u64) {
            self.log.lock().push(format!("{} ={value}", self.key));
        }
    }

    impl HistogramFn for Recorded {
        fn record(&self, _value: f64) {
            self.log.lock().push(format!("{} observed", self.key));
        }
    }

    #[derive(Default)]
    struct TestRecorder {
        log: Log,
    }

    impl TestRecorder {
        fn recorded(&self, key: &Key) -> Arc<Recorded> {
            let labels: Vec<_> = key
                .labels()
                .map(|label| format!("{}={}", label.key(), label.value()))
                .collect();
            Arc::new(Recorded {
                key: format!("{}{{{}}}", key.name(), labels.join(",")),
                log: self.log.clone(),
            })
        }
    }

    impl Recorder for TestRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            Counter::from_arc(self.recorded(key))
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::from_arc(self.recorded(key))
        }
    }

    fn descriptor() -> ActionDescriptor {
        let mut descriptor = ActionDescriptor::new(
            ControllerTypeInfo::unit("OrdersController"),
            "Get",
            ActionMethod::from_fn(|_| async { Ok(EmptyResult) }),
        );
        descriptor.id = "Orders.Get".to_string();
        descriptor
    }

    fn event<'a>(
        action: &'a ActionDescriptor,
        name: &'static str,
        stage: PipelineStage,
        filter: Option<&'a str>,
        detail: EventDetail,
    ) -> DiagnosticEvent<'a> {
        DiagnosticEvent {
            name,
            stage,
            action,
            request_id: RequestId::new(),
            filter,
            detail,
        }
    }

    #[test]
    fn test_listens_to_after_events_only() {
        let listener = MetricsDiagnosticListener::new();
        assert!(listener.is_enabled(events::AFTER_ACTION));
        assert!(listener.is_enabled(events::AFTER_ON_AUTHORIZATION));
        assert!(!listener.is_enabled(events::BEFORE_ACTION));
        assert!(!listener.is_enabled(events::BEFORE_MODEL_BINDING));
    }

    #[test]
    fn test_finished_action_records_count_and_latency() {
        let recorder = TestRecorder::default();
        let action = descriptor();
        metrics::with_local_recorder(&recorder, || {
            MetricsDiagnosticListener.on_event(&event(
                &action,
                events::AFTER_ACTION,
                PipelineStage::Action,
                None,
                EventDetail::Finished {
                    status: 200,
                    elapsed: Duration::from_millis(3),
                },
            ));
        });
        assert_eq!(
            *recorder.log.lock(),
            [
                "pallas_actions_total{action=Orders.Get,status=200} +1",
                "pallas_action_duration_seconds{action=Orders.Get} observed",
            ]
        );
    }

    #[test]
    fn test_unhandled_and_short_circuit() {
        let recorder = TestRecorder::default();
        let action = descriptor();
        metrics::with_local_recorder(&recorder, || {
            MetricsDiagnosticListener.on_event(&event(
                &action,
                events::AFTER_ON_AUTHORIZATION,
                PipelineStage::Authorization,
                Some("Deny"),
                EventDetail::ShortCircuited,
            ));
            MetricsDiagnosticListener.on_event(&event(
                &action,
                events::AFTER_ACTION,
                PipelineStage::Action,
                None,
                EventDetail::Unhandled {
                    error: "boom".to_string(),
                    elapsed: Duration::from_millis(1),
                },
            ));
        });
        assert_eq!(
            *recorder.log.lock(),
            [
                "pallas_filter_short_circuits_total{action=Orders.Get,stage=authorization,filter=Deny} +1",
                "pallas_actions_total{action=Orders.Get,status=error} +1",
                "pallas_unhandled_exceptions_total{action=Orders.Get} +1",
                "pallas_action_duration_seconds{action=Orders.Get} observed",
            ]
        );
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        record_action("Orders.Get", 204, Duration::ZERO);
        record_short_circuit("Orders.Get", "resource", "Cache");
    }
}
