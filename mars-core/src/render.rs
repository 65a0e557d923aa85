//! Progress and diagnostic reporting hook
//!
//! The engine and strategies report progress through a [`Renderer`] rather
//! than printing directly, so terminal presentation (progress bars,
//! colors, panels) stays a pluggable concern. `mars-core` only ships
//! [`NullRenderer`] and [`TracingRenderer`]; `mars-cli` supplies the
//! interactive one.
//!
//! The renderer holds at most one active progress indicator at a time —
//! implementations must stop a previous scope before starting a new one.

/// Hook for progress and diagnostic events emitted during a debate run.
///
/// Every method takes `&self`; implementations that render to a terminal
/// use interior mutability (e.g. a `Mutex<ProgressBar>`) since the engine
/// holds a shared `Arc<dyn Renderer>` across concurrent provider calls.
pub trait Renderer: Send + Sync {
    fn round_started(&self, round: usize, total_rounds: usize) {
        let _ = (round, total_rounds);
    }

    fn round_completed(&self, round: usize, succeeded: &[String]) {
        let _ = (round, succeeded);
    }

    fn provider_failed(&self, provider: &str, round: usize, message: &str) {
        let _ = (provider, round, message);
    }

    fn text_delta(&self, provider: &str, delta: &str) {
        let _ = (provider, delta);
    }

    fn convergence(&self, reason: &str) {
        let _ = reason;
    }

    fn synthesis_attempt(&self, provider: &str) {
        let _ = provider;
    }

    fn synthesis_fallback(&self, failed_provider: &str, next_provider: &str, cause: &str) {
        let _ = (failed_provider, next_provider, cause);
    }

    fn run_failed(&self, message: &str) {
        let _ = message;
    }
}

/// Discards every event. Used in tests and non-interactive runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {}

/// Emits every event as a `tracing` call instead of drawing a terminal UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn round_started(&self, round: usize, total_rounds: usize) {
        tracing::info!(round, total_rounds, "round started");
    }

    fn round_completed(&self, round: usize, succeeded: &[String]) {
        tracing::info!(round, providers = ?succeeded, "round completed");
    }

    fn provider_failed(&self, provider: &str, round: usize, message: &str) {
        tracing::warn!(provider, round, message, "provider failed");
    }

    fn text_delta(&self, provider: &str, delta: &str) {
        tracing::debug!(provider, chars = delta.len(), "text delta");
    }

    fn convergence(&self, reason: &str) {
        tracing::info!(reason, "debate converged");
    }

    fn synthesis_attempt(&self, provider: &str) {
        tracing::info!(provider, "attempting synthesis");
    }

    fn synthesis_fallback(&self, failed_provider: &str, next_provider: &str, cause: &str) {
        tracing::warn!(failed_provider, next_provider, cause, "synthesis fallback");
    }

    fn run_failed(&self, message: &str) {
        tracing::error!(message, "run failed");
    }
}
