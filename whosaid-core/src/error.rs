use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone)]
pub enum FeedError {
    #[error("Handle not found on the remote feed: {handle}")]
    UnknownHandle { handle: String },

    #[error("Feed service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Feed authentication rejected")]
    Unauthorized,

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Feed server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Invalid feed response: {details}")]
    InvalidResponse { details: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Migration failed: {reason}")]
    MigrationFailed { reason: String },

    #[error("Embedding for post {post_id} has {actual} dimensions, store expects {expected}")]
    DimensionMismatch {
        post_id: i64,
        expected: usize,
        actual: usize,
    },

    #[error("Stored embedding for post {post_id} is corrupt: {details}")]
    CorruptEmbedding { post_id: i64, details: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug, Clone)]
pub enum EmbeddingError {
    #[error("Model loading failed for {model_name}: {reason}")]
    ModelLoadingFailed { model_name: String, reason: String },

    #[error("Unsupported embedding model: {model_name}")]
    ModelNotSupported { model_name: String },

    #[error("Cannot embed empty text")]
    EmptyInput,

    #[error("Model inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Cannot compare a user to themselves: {handle}")]
    SameUser { handle: String },

    #[error("Unknown user: {handle}")]
    UnknownUser { handle: String },

    #[error("Insufficient data for {handle}: at least one stored post is required")]
    InsufficientData { handle: String },

    #[error("Embedding dimensions disagree across the training set: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Failed to embed probe text: {0}")]
    ProbeEmbedding(#[from] EmbeddingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}
