use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Language codes following ISO 639-1
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Source language code. The opus-mt models used here all translate from English.
pub const DEFAULT_SOURCE_LANG: &str = "en";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "fr";
/// Default chunk window in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Which inference protocol the translator speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorBackend {
    /// Pretrained MarianMT (opus-mt) models behind a Hugging Face style
    /// inference endpoint: `POST {api_base}/{model}` with `{"inputs": ...}`.
    #[default]
    Marian,
    /// Any OpenAI-compatible chat completions endpoint.
    OpenAi,
}

impl std::fmt::Display for TranslatorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Marian => write!(f, "marian"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Translator backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub backend: TranslatorBackend,
    pub api_base: String,
    pub api_key: Option<String>,
    /// Model name; `{source}` and `{target}` are replaced by language codes.
    pub model_template: String,
    /// Chunk window in characters
    pub chunk_size: usize,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl TranslatorConfig {
    /// Create a new translator config with default chunking and retry settings
    pub fn new(
        backend: TranslatorBackend,
        api_base: impl Into<String>,
        api_key: Option<String>,
        model_template: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            api_base: api_base.into(),
            api_key,
            model_template: model_template.into(),
            ..Default::default()
        }
    }

    /// Resolve the model name for a language pair.
    pub fn model_for(&self, source: &Lang, target: &Lang) -> String {
        self.model_template
            .replace("{source}", source.as_str())
            .replace("{target}", target.as_str())
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            backend: TranslatorBackend::Marian,
            api_base: "https://api-inference.huggingface.co/models".to_string(),
            api_key: None,
            model_template: "Helsinki-NLP/opus-mt-{source}-{target}".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry_count: 3,
            retry_delay_ms: 1000,
            timeout_secs: 120,
        }
    }
}

/// Web page fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("cognitranslate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Layout of the exported PDF, in points. Defaults to US Letter with 1 inch margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    /// Baseline-to-baseline distance
    pub leading: f32,
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin: 72.0,
            font_size: 10.0,
            leading: 12.0,
            title: "Translated document".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable memory cache
    pub memory_enabled: bool,

    /// Memory cache budget in megabytes
    pub memory_max_mb: u64,

    /// Memory cache TTL in seconds (0 = no expiry)
    pub memory_ttl_seconds: u64,

    /// Enable disk cache
    pub disk_enabled: bool,

    /// Disk cache directory (defaults to $XDG_CACHE_HOME/cognitranslate)
    pub disk_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_enabled: true,
            memory_max_mb: 64,
            memory_ttl_seconds: 0,
            disk_enabled: true,
            disk_path: None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source_lang: Lang,
    pub target_lang: Lang,
    pub translator: TranslatorConfig,
    pub scraper: ScraperConfig,
    pub export: ExportConfig,
    pub cache: CacheConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: Lang::new(DEFAULT_SOURCE_LANG),
            target_lang: Lang::new(DEFAULT_TARGET_LANG),
            translator: TranslatorConfig::default(),
            scraper: ScraperConfig::default(),
            export: ExportConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Environment variable prefix for config overrides, e.g.
/// `COGNITRANSLATE__TRANSLATOR__CHUNK_SIZE=400`.
const ENV_PREFIX: &str = "COGNITRANSLATE";

impl AppConfig {
    /// Load configuration from a single TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load from default locations, later sources overriding earlier ones:
    /// `~/.config/cognitranslate/config.toml`, `./config.toml`, then
    /// `COGNITRANSLATE__*` environment variables.
    pub fn load() -> Self {
        let mut files = Vec::new();
        if let Some(config_dir) = crate::util::config_dir() {
            files.push(config_dir.join("cognitranslate").join("config.toml"));
        }
        files.push(PathBuf::from("config.toml"));

        match Self::load_layered(&files) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Merge the given TOML files (missing files are skipped) and the environment.
    pub fn load_layered(files: &[PathBuf]) -> Result<Self> {
        Self::merge_sources(files, config::Environment::with_prefix(ENV_PREFIX))
    }

    /// `env` is read with `__` as both prefix and key separator, so
    /// `COGNITRANSLATE__TRANSLATOR__CHUNK_SIZE` sets `translator.chunk_size`.
    fn merge_sources(files: &[PathBuf], env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        for file in files {
            if file.exists() {
                tracing::debug!("Loading config from {}", file.display());
            }
            builder = builder.add_source(
                config::File::from(file.as_path())
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        builder
            .add_source(env.prefix_separator("__").separator("__").try_parsing(true))
            .build()
            .and_then(|built| built.try_deserialize::<Self>())
            .map_err(|e| Error::ConfigLoad(e.to_string()))
    }

    /// Check values that would otherwise fail deep inside the pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.translator.chunk_size == 0 {
            return Err(Error::ConfigInvalid {
                field: "translator.chunk_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if !is_supported_target(self.target_lang.as_str()) {
            return Err(Error::ConfigInvalid {
                field: "target_lang".to_string(),
                reason: format!(
                    "'{}' is not one of {}",
                    self.target_lang,
                    supported_target_codes().join(", ")
                ),
            });
        }

        let export = &self.export;
        let usable_width = export.page_width - 2.0 * export.margin;
        let usable_height = export.page_height - 2.0 * export.margin;
        if export.font_size <= 0.0
            || export.leading <= 0.0
            || usable_width <= 0.0
            || usable_height < export.leading
        {
            return Err(Error::ConfigInvalid {
                field: "export".to_string(),
                reason: "page, margin and font sizes leave no room for text".to_string(),
            });
        }

        Ok(())
    }
}

/// A language option for UI dropdowns
#[derive(Debug, Clone)]
pub struct LanguageOption {
    /// ISO language code (e.g., "fr")
    pub code: &'static str,
    /// Display name (e.g., "French")
    pub name: &'static str,
    /// Flag emoji
    pub flag: &'static str,
}

/// Languages available as translation target, one opus-mt-en-* model each.
pub fn target_languages() -> Vec<LanguageOption> {
    vec![
        LanguageOption { code: "fr", name: "French", flag: "🇫🇷" },
        LanguageOption { code: "es", name: "Spanish", flag: "🇪🇸" },
        LanguageOption { code: "pt", name: "Portuguese", flag: "🇵🇹" },
    ]
}

fn supported_target_codes() -> Vec<&'static str> {
    target_languages().into_iter().map(|l| l.code).collect()
}

/// Whether `code` is one of [`target_languages`].
pub fn is_supported_target(code: &str) -> bool {
    target_languages().iter().any(|l| l.code == code)
}

/// Human-readable name for a language code.
pub fn language_name(code: &str) -> &'static str {
    match code {
        "en" => "English",
        "fr" => "French",
        "es" => "Spanish",
        "pt" => "Portuguese",
        _ => "the specified language",
    }
}
