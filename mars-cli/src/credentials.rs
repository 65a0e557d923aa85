//! Interactive credential capture for `mars configure`
//!
//! Writes directly to the user-home config file MARS reads at the lowest
//! precedence tier (see `mars_core::config::Credentials::resolve`), so a
//! value set here is overridden by `.env` or the process environment.

use std::io::Write;
use std::path::PathBuf;

use rustyline::DefaultEditor;

const PROMPTS: &[(&str, &str)] = &[
    ("MARS_ANTHROPIC_API_KEY", "Anthropic API key"),
    ("MARS_OPENAI_API_KEY", "OpenAI API key"),
    ("MARS_GOOGLE_API_KEY", "Google API key"),
    ("MARS_OLLAMA_BASE_URL", "Ollama base URL (blank for http://localhost:11434)"),
];

pub fn run_interactive() -> anyhow::Result<PathBuf> {
    let mut editor = DefaultEditor::new()?;
    let mut values = Vec::new();

    for (key, label) in PROMPTS {
        let line = editor.readline(&format!("{label}: "))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            values.push((*key, trimmed.to_string()));
        }
    }

    let path = config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(&path)?;
    for (key, value) in &values {
        writeln!(file, "{key}={value}")?;
    }
    Ok(path)
}

fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;
    Ok(home.join(".config").join("mars").join("credentials.env"))
}
