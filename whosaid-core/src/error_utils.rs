use crate::error::*;
use std::time::Duration;
use tracing::{error, warn};

/// Classification helpers shared by the retry layer and the CLI surface.
pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for FeedError {
    fn log_error(&self) -> &Self {
        error!("FeedError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("FeedError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            FeedError::Unavailable { .. } => true,
            FeedError::RateLimitExceeded { .. } => true,
            FeedError::RequestTimeout => true,
            FeedError::ServerError { .. } => true,
            FeedError::UnknownHandle { .. } => false,
            FeedError::Unauthorized => false,
            FeedError::InvalidResponse { .. } => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            FeedError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            FeedError::UnknownHandle { handle } => {
                format!("No account named '{handle}' exists on the feed")
            }
            FeedError::Unavailable { .. } | FeedError::ServerError { .. } => {
                "The feed service is currently unavailable. Please try again later".to_string()
            }
            FeedError::Unauthorized => {
                "The feed rejected our credentials. Check the configured API token".to_string()
            }
            FeedError::RateLimitExceeded { retry_after } => {
                format!("The feed is rate limiting us. Try again in {retry_after} seconds")
            }
            FeedError::RequestTimeout => "The feed took too long to answer".to_string(),
            FeedError::InvalidResponse { .. } => {
                "The feed answered with something we could not understand".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        "FEED".to_string()
    }
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::Feed(e) => {
                error!("Feed error details: {:?}", e);
            }
            CoreError::Store(e) => {
                error!("Store error details: {:?}", e);
            }
            CoreError::Embedding(e) => {
                error!("Embedding error details: {:?}", e);
            }
            CoreError::Classifier(e) => {
                error!("Classifier error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Feed(e) => e.is_retryable(),
            CoreError::Store(StoreError::ConnectionFailed { .. }) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::Feed(e) => e.retry_after(),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::Feed(e) => e.user_friendly_message(),
            CoreError::Classifier(e) => e.to_string(),
            CoreError::Store(_) => "The local database reported an error".to_string(),
            CoreError::Embedding(_) => "The embedding model reported an error".to_string(),
            CoreError::Config(e) => e.to_string(),
            other => other.to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::Feed(_) => "FEED",
            CoreError::Store(_) => "STORE",
            CoreError::Embedding(_) => "EMBEDDING",
            CoreError::Classifier(_) => "CLASSIFIER",
            CoreError::Config(_) => "CONFIG",
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
        }
        .to_string()
    }
}
