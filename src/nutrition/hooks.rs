//! Invocation hooks
//!
//! Callers attach a hook around core calls instead of the core logging on its own.

use std::time::{Duration, Instant};

/// Observer notified around each core invocation
pub trait CoreHook: Send + Sync {
    fn on_start(&self, _operation: &'static str) {}

    fn on_finish(&self, _operation: &'static str, _elapsed: Duration) {}
}

/// Hook that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl CoreHook for NoopHook {}

/// Hook that emits `tracing` debug events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl CoreHook for TracingHook {
    fn on_start(&self, operation: &'static str) {
        tracing::debug!(operation, "core call started");
    }

    fn on_finish(&self, operation: &'static str, elapsed: Duration) {
        tracing::debug!(
            operation,
            elapsed_us = elapsed.as_micros() as u64,
            "core call finished"
        );
    }
}

/// Run `f` between the hook's start and finish notifications
pub fn observe<T>(hook: &dyn CoreHook, operation: &'static str, f: impl FnOnce() -> T) -> T {
    hook.on_start(operation);
    let started = Instant::now();
    let result = f();
    hook.on_finish(operation, started.elapsed());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl CoreHook for Recorder {
        fn on_start(&self, operation: &'static str) {
            self.events.lock().unwrap().push(format!("start:{}", operation));
        }

        fn on_finish(&self, operation: &'static str, _elapsed: Duration) {
            self.events.lock().unwrap().push(format!("finish:{}", operation));
        }
    }

    #[test]
    fn test_observe_wraps_call() {
        let recorder = Recorder::default();
        let value = observe(&recorder, "estimate", || 42);
        assert_eq!(value, 42);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start:estimate".to_string(), "finish:estimate".to_string()]
        );
    }

    #[test]
    fn test_noop_hook_passes_result_through() {
        assert_eq!(observe(&NoopHook, "recommend", || "ok"), "ok");
    }
}
