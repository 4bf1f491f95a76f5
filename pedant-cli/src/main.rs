//! `pedant`: talk to the persona.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pedant_core::PedantConfig;
use pedant_core::config::SelectionStrategy;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use pedant_cli::{Delegate, Repl, Session, build_engine, colors, display, loader};

#[derive(Debug, Parser)]
#[command(name = "pedant")]
#[command(version, about = "Chat with an insufferably precise PhD student")]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, short = 'c', env = "PEDANT_CONFIG")]
    config: Option<PathBuf>,

    /// Corpus file or directory, overrides `corpus.path`
    #[arg(long, env = "PEDANT_CORPUS")]
    corpus: Option<PathBuf>,

    /// Synonym table (TOML), overrides `corpus.synonyms_path`
    #[arg(long)]
    synonyms: Option<PathBuf>,

    /// Character profile for generated replies
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Fixed RNG seed for reproducible conversations
    #[arg(long)]
    seed: Option<u64>,

    /// Always take the best-ranked record instead of a weighted draw
    #[arg(long)]
    greedy: bool,

    /// Enable generated replies
    #[arg(long, conflicts_with = "no_llm")]
    llm: bool,

    /// Disable generated replies
    #[arg(long)]
    no_llm: bool,

    /// Model for generated replies
    #[arg(long, env = "PEDANT_MODEL")]
    model: Option<String>,

    /// Base URL of the generation backend
    #[arg(long, env = "OLLAMA_URL")]
    llm_url: Option<String>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print corpus statistics and exit
    #[arg(long)]
    stats: bool,
}

impl Args {
    fn apply(&self, config: &mut PedantConfig) {
        if let Some(corpus) = &self.corpus {
            config.corpus.path = corpus.display().to_string();
        }
        if let Some(synonyms) = &self.synonyms {
            config.corpus.synonyms_path = Some(synonyms.display().to_string());
        }
        if let Some(profile) = &self.profile {
            config.corpus.profile_path = Some(profile.display().to_string());
        }
        if let Some(seed) = self.seed {
            config.session.seed = Some(seed);
        }
        if self.greedy {
            config.matching.strategy = SelectionStrategy::Greedy;
        }
        if self.llm {
            config.llm.enabled = true;
        }
        if self.no_llm {
            config.llm.enabled = false;
        }
        if let Some(model) = &self.model {
            config.llm.model.clone_from(model);
        }
        if let Some(url) = &self.llm_url {
            config.llm.base_url.clone_from(url);
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
    }
}

fn load_config(args: &Args) -> Result<PedantConfig> {
    let mut config = match &args.config {
        Some(path) => PedantConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PedantConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn connect(config: &PedantConfig, profile: Option<String>) -> Option<Delegate> {
    if !config.llm.enabled {
        return None;
    }
    let delegate = match Delegate::from_config(&config.llm, &config.general.persona_name, profile) {
        Ok(delegate) => delegate,
        Err(e) => {
            warn!(error = %e, "generation disabled");
            println!("{}", colors::warning(&format!("LLM disabled: {e}")));
            return None;
        }
    };
    match delegate.health_check().await {
        Ok(()) => {
            info!(model = %delegate.client().model(), "generation backend ready");
            println!(
                "{}",
                colors::dim(&format!("LLM ready: {}", delegate.client().model()))
            );
            Some(delegate)
        }
        Err(e) => {
            warn!(error = %e, "generation backend unavailable");
            println!(
                "{}",
                colors::dim(&format!("LLM unavailable ({e}); using corpus replies only"))
            );
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config.general.log_level);

    let (engine, canned) = build_engine(&config)?;

    if args.stats {
        println!("{}", display::corpus_stats(&engine.index().stats()));
        return Ok(());
    }

    let profile = loader::load_profile(config.corpus.profile_path.as_deref().map(Path::new))?;
    let delegate = connect(&config, profile).await;
    let session = Session::new(engine, canned, &config.session);
    info!(session = %session.id(), "starting conversation");

    let mut repl = Repl::new(
        session,
        delegate,
        config.general.persona_name.clone(),
        config.session.history_display,
    )?;
    repl.run().await
}
