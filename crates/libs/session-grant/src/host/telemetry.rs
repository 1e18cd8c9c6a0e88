use crate::telemetry::TelemetryEvent;

/// Fire-and-forget analytics.
pub trait TelemetrySink: Send + Sync {
    /// Participation id; `None` when the user opted out.
    fn telemetry_id(&self) -> Option<String>;

    fn emit(&self, event: TelemetryEvent);
}
