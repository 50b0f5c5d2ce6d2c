//! CogniTranslate CLI - translate a PDF or a web article from the terminal.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand, ValueEnum};
use cognitranslate_core::{
    AppConfig, CogniTranslator, Lang, ProgressCallback, Source, TranslatorBackend,
    clear_translation_cache, download_stem, progress_message,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetOption {
    /// French
    Fr,
    /// Spanish
    Es,
    /// Portuguese
    Pt,
}

impl TargetOption {
    const fn code(self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::Es => "es",
            Self::Pt => "pt",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendOption {
    /// Pretrained opus-mt models on a Hugging Face style inference endpoint
    Marian,
    /// OpenAI-compatible chat completions endpoint
    Openai,
}

impl From<BackendOption> for TranslatorBackend {
    fn from(opt: BackendOption) -> Self {
        match opt {
            BackendOption::Marian => Self::Marian,
            BackendOption::Openai => Self::OpenAi,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate the text of a PDF file
    Pdf {
        /// Input PDF file
        file: PathBuf,
    },
    /// Translate the paragraphs of a web page
    Url {
        /// Page URL (http or https)
        url: String,
    },
    /// Remove every cached chunk translation from disk
    ClearCache,
}

#[derive(Parser, Debug)]
#[command(name = "cognitranslate")]
#[command(author, version, about = "Translate cognitive science papers and articles", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Target language (default: from config, otherwise fr)
    #[arg(short = 't', long, value_enum, global = true)]
    target: Option<TargetOption>,

    /// Output PDF file (default: translated_<name>.pdf)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Also write the translated text to this file
    #[arg(long, global = true)]
    text_output: Option<PathBuf>,

    /// Translation backend
    #[arg(long, value_enum, global = true)]
    backend: Option<BackendOption>,

    /// Inference API base URL
    #[arg(long, env = "COGNITRANSLATE_API_BASE", global = true)]
    api_base: Option<String>,

    /// Inference API token
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model name; `{source}` and `{target}` are replaced by language codes
    #[arg(long, global = true)]
    model: Option<String>,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable caching
    #[arg(long, global = true)]
    no_cache: bool,

    /// Do not print the translated text
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(target) = self.target {
            config.target_lang = Lang::new(target.code());
        }
        if let Some(backend) = self.backend {
            config.translator.backend = backend.into();
        }
        if let Some(ref api_base) = self.api_base {
            config.translator.api_base.clone_from(api_base);
        }
        if let Some(ref api_key) = self.api_key {
            config.translator.api_key = Some(api_key.clone());
        }
        if let Some(ref model) = self.model {
            config.translator.model_template.clone_from(model);
        }
        if self.no_cache {
            config.cache.memory_enabled = false;
            config.cache.disk_enabled = false;
        }
    }
}

fn load_source(command: &Command) -> Result<Source> {
    match command {
        Command::Pdf { file } => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("Failed to read PDF: {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("document.pdf")
                .to_string();
            Ok(Source::Pdf {
                filename,
                bytes: Bytes::from(bytes),
            })
        }
        Command::Url { url } => Ok(Source::Web { url: url.clone() }),
        Command::ClearCache => anyhow::bail!("clear-cache has no source"),
    }
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if matches!(args.command, Command::ClearCache) {
        let removed = clear_translation_cache().context("Failed to clear cache")?;
        #[allow(clippy::print_stdout)]
        {
            println!("Removed {removed} cached translations");
        }
        return Ok(());
    }

    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    args.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    let source = load_source(&args.command)?;
    let target = config.target_lang.clone();

    let translator =
        CogniTranslator::new(config).context("Failed to initialize translator")?;
    let info = translator.translator_info();
    info!(
        "Using {} ({})",
        info.name,
        translator.config().translator.api_base
    );
    if info.requires_api_key && !translator.is_available() {
        warn!("No API token set (HF_API_TOKEN); the endpoint may reject requests");
    }

    let pb = ProgressBar::new_spinner();
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(source.stage());
    pb.enable_steady_tick(Duration::from_millis(120));

    let bar = pb.clone();
    let stage = source.stage();
    #[allow(clippy::cast_possible_truncation)]
    let progress: ProgressCallback = Box::new(move |done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
        bar.set_message(progress_message(stage, done, total));
    });

    let outcome = match translator.run(&source, &target, Some(progress)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            pb.abandon();
            anyhow::bail!(e.user_message());
        }
    };
    pb.finish_with_message(format!(
        "{} ({} cached)",
        progress_message(source.stage(), outcome.chunk_count, outcome.chunk_count),
        outcome.cached_chunks
    ));

    let pdf = translator
        .export_pdf(&outcome.translated_text, outcome.title.as_deref())
        .context("Failed to build translated PDF")?;
    let output_path = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!("translated_{}.pdf", download_stem(&outcome.source_label)))
    });
    write_file(&output_path, pdf)?;

    if let Some(ref text_path) = args.text_output {
        write_file(text_path, &outcome.translated_text)?;
    }

    // CLI output is intentional
    #[allow(clippy::print_stdout, clippy::print_stderr)]
    {
        if !args.quiet {
            println!("{}", outcome.translated_text);
        }
        eprintln!("Translated PDF saved to: {}", output_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let args = Args::parse_from([
            "cognitranslate",
            "url",
            "https://neurosciencenews.com/",
            "--target",
            "pt",
            "--backend",
            "openai",
            "--model",
            "llama3",
            "--no-cache",
        ]);
        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.target_lang.as_str(), "pt");
        assert_eq!(config.translator.backend, TranslatorBackend::OpenAi);
        assert_eq!(config.translator.model_template, "llama3");
        assert!(!config.cache.memory_enabled);
        assert!(!config.cache.disk_enabled);
    }

    #[test]
    fn test_missing_flags_keep_config() {
        let args = Args::parse_from(["cognitranslate", "pdf", "paper.pdf"]);
        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.target_lang.as_str(), "fr");
        assert_eq!(config.translator.backend, TranslatorBackend::Marian);
        assert!(matches!(args.command, Command::Pdf { .. }));
    }
}
