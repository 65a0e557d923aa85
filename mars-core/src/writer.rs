//! Step-wise audit directory writer
//!
//! Each method writes exactly one file and returns once it has been
//! flushed, so a run interrupted mid-debate leaves a partial but
//! internally consistent audit trail — never a half-written file. The
//! writer is single-writer per run; callers must serialize writes even
//! when the debate itself fans out concurrently across providers.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::types::{AttributionReport, CostReport, DebateRound, RoundDiff};

pub struct AuditWriter {
    run_dir: PathBuf,
    audit_dir: PathBuf,
    lock: Mutex<()>,
}

impl AuditWriter {
    /// Create `<output_dir>/<timestamp>_<slug>/audit/`.
    pub async fn create(output_dir: &Path, timestamp: &str, slug: &str) -> std::io::Result<Self> {
        let run_dir = output_dir.join(format!("{timestamp}_{slug}"));
        let audit_dir = run_dir.join("audit");
        tokio::fs::create_dir_all(&audit_dir).await?;
        Ok(Self {
            run_dir,
            audit_dir,
            lock: Mutex::new(()),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub async fn write_prompt_and_context(&self, prompt: &str, context: &[String]) -> std::io::Result<()> {
        let mut body = format!("# Prompt\n\n{prompt}\n");
        for (i, block) in context.iter().enumerate() {
            body.push_str(&format!("\n## Context {}\n\n{block}\n", i + 1));
        }
        self.write_audit_file("00-prompt-and-context.md", &body).await
    }

    pub async fn write_round_responses(&self, round: &DebateRound) -> std::io::Result<()> {
        let mut body = format!("# Round {} Responses\n\n", round.round);
        for (provider, response) in &round.answers {
            body.push_str(&format!("## {provider}\n\n{}\n\n", response.content));
        }
        let name = format!("{:02}-round-{}-responses.md", round.round, round.round);
        self.write_audit_file(&name, &body).await
    }

    pub async fn write_round_critiques(&self, round: &DebateRound) -> std::io::Result<()> {
        if round.critiques.is_empty() {
            return Ok(());
        }
        let mut body = format!("# Round {} Critiques\n\n", round.round);
        for (provider, response) in &round.critiques {
            body.push_str(&format!("## {provider}\n\n{}\n\n", response.content));
        }
        let name = format!("{:02}-round-{}-critiques.md", round.round, round.round);
        self.write_audit_file(&name, &body).await
    }

    pub async fn write_convergence(&self, reason: &str) -> std::io::Result<()> {
        self.write_audit_file("convergence.md", &format!("# Convergence\n\n{reason}\n")).await
    }

    pub async fn write_resolution(&self, resolution: &str) -> std::io::Result<()> {
        self.write_audit_file("resolution.md", &format!("# Resolution\n\n{resolution}\n")).await
    }

    pub async fn write_attribution(&self, report: &AttributionReport) -> std::io::Result<()> {
        let mut body = String::from("# Attribution\n\n| Provider | Contribution | Survival | Influence | Novel |\n|---|---|---|---|---|\n");
        for a in &report.attributions {
            body.push_str(&format!(
                "| {} | {:.3} | {:.3} | {:.3} | {:.3} |\n",
                a.provider, a.contribution, a.survival, a.influence, a.novel_in_synthesis
            ));
        }
        body.push_str(&format!("\nnovel_in_synthesis (overall): {:.3}\n", report.novel_in_synthesis));
        self.write_audit_file("attribution.md", &body).await
    }

    pub async fn write_round_diffs(&self, diffs: &[RoundDiff]) -> std::io::Result<()> {
        let mut body = String::from("# Round Diffs\n\n| Provider | From | To | Similarity | Added | Removed | Unchanged |\n|---|---|---|---|---|---|---|\n");
        for d in diffs {
            body.push_str(&format!(
                "| {} | {} | {} | {:.3} | {} | {} | {} |\n",
                d.provider, d.from_round, d.to_round, d.similarity, d.sentences_added, d.sentences_removed, d.sentences_unchanged
            ));
        }
        self.write_audit_file("round-diffs.md", &body).await
    }

    pub async fn write_costs(&self, report: &CostReport) -> std::io::Result<()> {
        let mut body = String::from("# Costs\n\n| Provider | Input Tokens | Output Tokens | USD | Share |\n|---|---|---|---|---|\n");
        for p in &report.providers {
            body.push_str(&format!(
                "| {} | {} | {} | {:.4} | {:.3} |\n",
                p.provider, p.input_tokens, p.output_tokens, p.usd_cost, p.share_of_total
            ));
        }
        body.push_str(&format!("\nTotal: ${:.4}\n", report.total_usd_cost));
        for warning in &report.warnings {
            body.push_str(&format!("\nWarning: {warning}\n"));
        }
        self.write_audit_file("costs.md", &body).await
    }

    pub async fn write_final_answer(&self, final_answer: &str) -> std::io::Result<()> {
        let path = self.run_dir.join("final-answer.md");
        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(format!("# Final Answer\n\n{final_answer}\n").as_bytes()).await?;
        file.flush().await
    }

    async fn write_audit_file(&self, name: &str, body: &str) -> std::io::Result<()> {
        let path = self.audit_dir.join(name);
        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(body.as_bytes()).await?;
        file.flush().await
    }
}

/// A URL/filesystem-safe slug derived from the prompt, used in the run
/// directory name.
pub fn slugify(text: &str) -> String {
    let mut slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    let trimmed = slug.trim_matches('-');
    let truncated: String = trimmed.chars().take(40).collect();
    if truncated.is_empty() {
        "debate".to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LLMResponse, TokenUsage};

    #[test]
    fn slugify_collapses_punctuation_and_lowercases() {
        assert_eq!(slugify("What is the Capital of France?"), "what-is-the-capital-of-france");
    }

    #[test]
    fn slugify_falls_back_when_nothing_is_alphanumeric() {
        assert_eq!(slugify("???"), "debate");
    }

    #[tokio::test]
    async fn create_makes_run_and_audit_directories() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditWriter::create(dir.path(), "20260101T000000Z", "test-slug").await.unwrap();
        assert!(writer.run_dir().join("audit").is_dir());
    }

    #[tokio::test]
    async fn write_round_responses_creates_numbered_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditWriter::create(dir.path(), "20260101T000000Z", "test-slug").await.unwrap();
        let mut round = DebateRound::new(1);
        round.answers.insert("anthropic".into(), LLMResponse::new("anthropic", "claude", "hello", TokenUsage::default()));
        writer.write_round_responses(&round).await.unwrap();
        assert!(writer.run_dir().join("audit").join("01-round-1-responses.md").exists());
    }

    #[tokio::test]
    async fn write_round_critiques_is_skipped_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditWriter::create(dir.path(), "20260101T000000Z", "test-slug").await.unwrap();
        let round = DebateRound::new(1);
        writer.write_round_critiques(&round).await.unwrap();
        assert!(!writer.run_dir().join("audit").join("01-round-1-critiques.md").exists());
    }
}
