use std::time::Instant;

use tracing::{debug, warn};

/// Runs one remote call and emits a telemetry event for it.
pub fn timed<T>(
    op: &'static str,
    key: Option<u64>,
    call: impl FnOnce() -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let started = Instant::now();
    let result = call();
    let duration_ms = started.elapsed().as_millis() as u64;
    let key = key.map(|value| value.to_string());
    let key = key.as_deref().unwrap_or("-");

    match &result {
        Ok(_) => debug!(
            target: "tasklab_telemetry",
            op,
            key,
            duration_ms,
            status = "ok",
            "gitlab call finished"
        ),
        Err(error) => warn!(
            target: "tasklab_telemetry",
            op,
            key,
            duration_ms,
            status = "error",
            error = %format!("{error:#}"),
            "gitlab call failed"
        ),
    }

    result
}
