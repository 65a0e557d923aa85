mod cli;
mod credentials;
mod error;
mod render;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands, ModeArg, ShowWhat};
use error::CliError;
use mars_core::config::Mode;
use mars_core::{Credentials, DebateConfig, Registry, RetryConfig};
use render::TerminalRenderer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Debate {
            prompt,
            context,
            providers,
            mode,
            rounds,
            judge_provider,
            synthesis_provider,
            model_overrides,
            threshold,
            max_tokens,
            temperature,
            verbose,
            output_dir,
            max_retries,
        } => run_debate(prompt, context, providers, mode, rounds, judge_provider, synthesis_provider, model_overrides, threshold, max_tokens, temperature, verbose, output_dir, max_retries).await,
        Commands::Providers => {
            list_providers();
            Ok(())
        }
        Commands::Configure => {
            let path = credentials::run_interactive().map_err(CliError::Other)?;
            println!("saved credentials to {}", path.display());
            Ok(())
        }
        Commands::Show { run_dir, what } => show_run(&run_dir, what),
        Commands::History { output_dir } => {
            list_history(&output_dir);
            Ok(())
        }
        Commands::Copy { run_dir } => {
            let content = std::fs::read_to_string(run_dir.join("final-answer.md"))?;
            print!("{content}");
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_debate(
    prompt_arg: String,
    context_args: Vec<String>,
    provider_args: Vec<String>,
    mode: ModeArg,
    rounds: usize,
    judge_provider: Option<String>,
    synthesis_provider: Option<String>,
    model_override_args: Vec<String>,
    threshold: f64,
    max_tokens: usize,
    temperature: Option<f32>,
    verbose: bool,
    output_dir: std::path::PathBuf,
    max_retries: usize,
) -> Result<(), CliError> {
    let prompt = cli::resolve_at_reference(&prompt_arg)?;
    let context = context_args.iter().map(|c| cli::resolve_at_reference(c)).collect::<Result<Vec<_>, _>>()?;

    let mut providers = Vec::new();
    let mut model_overrides = HashMap::new();
    for arg in &provider_args {
        let (name, model) = cli::split_name_model(arg);
        if let Some(model) = model {
            model_overrides.insert(name.clone(), model);
        }
        providers.push(name);
    }
    for arg in &model_override_args {
        let (name, model) = cli::split_name_model(arg);
        if let Some(model) = model {
            model_overrides.insert(name, model);
        }
    }

    let config = DebateConfig {
        providers: providers.clone(),
        model_overrides,
        mode: match mode {
            ModeArg::RoundRobin => Mode::RoundRobin,
            ModeArg::Judge => Mode::Judge,
        },
        rounds,
        judge_provider,
        synthesis_provider,
        threshold,
        max_tokens,
        temperature,
        max_retries,
        output_dir: output_dir.clone(),
        verbose,
    };
    config.validate()?;

    let credentials = Credentials::resolve();
    let retry = RetryConfig::new(max_retries);
    let registry = Registry::build(&providers, &credentials, retry)?;

    let renderer = Arc::new(TerminalRenderer::new());
    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let slug = mars_core::writer::slugify(&prompt);
    let writer = Arc::new(mars_core::writer::AuditWriter::create(&output_dir, &timestamp, &slug).await?);

    let outcome = mars_core::run(config, registry, renderer, writer.clone(), &prompt, &context).await?;

    println!("\n{}", outcome.result.final_answer);
    println!("\naudit trail written to {}", writer.run_dir().display());
    Ok(())
}

fn list_providers() {
    let credentials = Credentials::resolve();
    let entries = [
        ("anthropic", credentials.anthropic_api_key.is_some()),
        ("openai", credentials.openai_api_key.is_some()),
        ("google", credentials.google_api_key.is_some()),
        ("ollama", true),
    ];
    for (name, configured) in entries {
        println!("{name}: {}", if configured { "configured" } else { "missing credentials" });
    }
}

fn show_run(run_dir: &Path, what: ShowWhat) -> Result<(), CliError> {
    let path = match what {
        ShowWhat::Answer => run_dir.join("final-answer.md"),
        ShowWhat::Costs => run_dir.join("audit").join("costs.md"),
        ShowWhat::Attribution => run_dir.join("audit").join("attribution.md"),
        ShowWhat::Rounds => run_dir.join("audit").join("01-round-1-responses.md"),
    };
    let content = std::fs::read_to_string(&path).map_err(|e| CliError::Other(anyhow::anyhow!("could not read {}: {e}", path.display())))?;
    print!("{content}");
    Ok(())
}

fn list_history(output_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(output_dir) else {
        println!("no runs found under {}", output_dir.display());
        return;
    };
    let mut names: Vec<String> = entries.filter_map(|e| e.ok()).filter(|e| e.path().is_dir()).filter_map(|e| e.file_name().into_string().ok()).collect();
    names.sort();
    for name in names {
        println!("{name}");
    }
}
