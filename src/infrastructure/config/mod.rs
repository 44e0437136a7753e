mod settings;

pub use settings::{
    ApiConfig, FcmConfig, FirebaseConfig, FirestoreConfig, HttpClientConfig, LogFormat,
    LoggingConfig, OtelConfig, ServerConfig, Settings, StoreConfig,
};
