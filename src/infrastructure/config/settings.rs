use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub fcm: FcmConfig,
    #[serde(default)]
    pub firestore: FirestoreConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub http: HttpClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Optional key required in `X-API-Key` for the operator queue API
    pub key: Option<String>,
}

/// Process-wide Firebase application context
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirebaseConfig {
    /// Project ID; falls back to the service account key's `project_id`
    pub project_id: Option<String>,
    /// Path to a service account key file. When unset, the
    /// `GOOGLE_APPLICATION_CREDENTIALS` variable is consulted, then the
    /// metadata server.
    pub credentials_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    #[serde(default = "default_fcm_endpoint")]
    pub endpoint: String,
    /// Ask FCM to validate messages without delivering them
    #[serde(default)]
    pub validate_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
    #[serde(default = "default_firestore_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Monitored queue collection
    #[serde(default = "default_collection")]
    pub collection: String,
    /// `host:port` of a local Firestore emulator; disables OAuth
    pub emulator_host: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Document store backend: "firestore" (default) or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
    /// Timeout for outbound requests in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
}

/// Console log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line, for log collectors
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_fcm_endpoint() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_firestore_endpoint() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_collection() -> String {
    "notification_queue".to_string()
}

fn default_store_backend() -> String {
    "firestore".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_pool_max_idle() -> usize {
    10
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "push-queue-dispatcher".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("store.backend", "firestore")?
            .set_default("firestore.collection", "notification_queue")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER__PORT, FIREBASE__PROJECT_ID, FIRESTORE__EMULATOR_HOST, etc.
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.apply_well_known_env();
        Ok(settings)
    }

    /// Honour the variables the Google client libraries recognise when the
    /// equivalent settings are not configured explicitly.
    fn apply_well_known_env(&mut self) {
        if self.firebase.credentials_path.is_none() {
            self.firebase.credentials_path = env::var("GOOGLE_APPLICATION_CREDENTIALS").ok();
        }
        if self.firebase.project_id.is_none() {
            self.firebase.project_id = env::var("GOOGLE_CLOUD_PROJECT")
                .or_else(|_| env::var("GCLOUD_PROJECT"))
                .ok();
        }
        if self.firestore.emulator_host.is_none() {
            self.firestore.emulator_host = env::var("FIRESTORE_EMULATOR_HOST").ok();
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_memory_store(&self) -> bool {
        self.store.backend.eq_ignore_ascii_case("memory")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_fcm_endpoint(),
            validate_only: false,
        }
    }
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_firestore_endpoint(),
            database: default_database(),
            collection: default_collection(),
            emulator_host: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            pool_max_idle_per_host: default_pool_max_idle(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            firebase: FirebaseConfig::default(),
            fcm: FcmConfig::default(),
            firestore: FirestoreConfig::default(),
            store: StoreConfig::default(),
            http: HttpClientConfig::default(),
            logging: LoggingConfig::default(),
            otel: OtelConfig::default(),
        }
    }
}
