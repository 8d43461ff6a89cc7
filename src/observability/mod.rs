//! Observability subsystem for seriesguard
//!
//! Structured JSON line logging of typed lifecycle events.
//!
//! # Usage
//!
//! ```ignore
//! use seriesguard::observability::{log_event, Event};
//!
//! log_event(Event::SchemaWritten, &[("path", "sub-ref/anat/sub-ref_T1w.json")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Environment variable that lowers the log threshold to TRACE
pub const DEBUG_ENV_VAR: &str = "SERIESGUARD_DEBUG";

/// Default severity for an event
pub fn event_severity(event: Event) -> Severity {
    match event {
        Event::SeriesFailed | Event::Finding | Event::DoubleClaim => Severity::Error,
        Event::GroupingRejected | Event::FieldNameCollision => Severity::Warn,
        Event::ExemplarSynthesized | Event::SubjectSessionBegin | Event::SidecarValidated => {
            Severity::Trace
        }
        _ => Severity::Info,
    }
}

/// Log a lifecycle event with fields at its default severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event_severity(event), event.as_str(), fields);
}

/// Applies the verbosity switch: TRACE when `debug` is set or the
/// `SERIESGUARD_DEBUG` environment variable is non-empty, INFO otherwise.
pub fn init_verbosity(debug: bool) {
    let env_debug = std::env::var(DEBUG_ENV_VAR)
        .map(|v| !v.is_empty())
        .unwrap_or(false);
    if debug || env_debug {
        Logger::set_min_severity(Severity::Trace);
    } else {
        Logger::set_min_severity(Severity::Info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_severities() {
        assert_eq!(event_severity(Event::Finding), Severity::Error);
        assert_eq!(event_severity(Event::GroupingRejected), Severity::Warn);
        assert_eq!(event_severity(Event::SidecarValidated), Severity::Trace);
        assert_eq!(event_severity(Event::SchemaWritten), Severity::Info);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event(Event::ConfigLoaded, &[("modality", "mri")]);
    }
}
