//! Terminal renderer
//!
//! Implements `mars_core::render::Renderer` with a single `indicatif`
//! spinner tracking round progress, styled with `console`. Only one
//! spinner is ever live at a time, matching the renderer's "at most one
//! active progress indicator" contract.

use std::sync::Mutex;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use mars_core::render::Renderer;

pub struct TerminalRenderer {
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self { spinner: Mutex::new(None) }
    }

    fn start_spinner(&self, message: String) {
        let mut guard = self.spinner.lock().unwrap();
        if let Some(previous) = guard.take() {
            previous.finish_and_clear();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar.set_message(message);
        *guard = Some(bar);
    }

    fn stop_spinner(&self) {
        if let Some(bar) = self.spinner.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn round_started(&self, round: usize, total_rounds: usize) {
        self.start_spinner(format!("round {round}/{total_rounds} in progress..."));
    }

    fn round_completed(&self, round: usize, succeeded: &[String]) {
        self.stop_spinner();
        println!("{} round {round} complete: {}", style("✓").green(), succeeded.join(", "));
    }

    fn provider_failed(&self, provider: &str, round: usize, message: &str) {
        eprintln!("{} {provider} failed in round {round}: {message}", style("✗").red());
    }

    fn text_delta(&self, provider: &str, delta: &str) {
        print!("{}", style(delta).dim());
        let _ = provider;
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }

    fn convergence(&self, reason: &str) {
        self.stop_spinner();
        println!("{} {reason}", style("converged").cyan().bold());
    }

    fn synthesis_attempt(&self, provider: &str) {
        self.start_spinner(format!("synthesizing with {provider}..."));
    }

    fn synthesis_fallback(&self, failed_provider: &str, next_provider: &str, cause: &str) {
        eprintln!("{} synthesis via {failed_provider} failed ({cause}); trying {next_provider}", style("⚠").yellow());
    }

    fn run_failed(&self, message: &str) {
        self.stop_spinner();
        eprintln!("{} {message}", style("run failed").red().bold());
    }
}
