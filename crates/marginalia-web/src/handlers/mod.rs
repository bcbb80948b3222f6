pub mod notes;
pub mod qa;

/// Liveness probe. No side effects.
pub async fn health() -> &'static str {
    "ok"
}
