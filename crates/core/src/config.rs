use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub scan: ScanConfig,
    pub metadata: MetadataConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "mediacat.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootLayout {
    /// Media files directly inside the root.
    #[default]
    Flat,
    /// One subdirectory per show, episodes inside it.
    Shows,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRoot {
    pub path: String,
    #[serde(default)]
    pub layout: RootLayout,
}

impl MediaRoot {
    pub fn flat(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            layout: RootLayout::Flat,
        }
    }

    pub fn shows(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            layout: RootLayout::Shows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub roots: Vec<MediaRoot>,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub include_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: ["m4a", "m4v", "mp3", "mp4"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude: Vec::new(),
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// `tmdb` or `none`.
    pub provider: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub image_base_url: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            api_key: None,
            base_url: providers::tmdb::DEFAULT_BASE_URL.to_string(),
            image_base_url: providers::tmdb::DEFAULT_IMAGE_BASE_URL.to_string(),
            language: "en-US".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8080".to_string(),
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("MEDIACAT")
            .prefix_separator("__")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
