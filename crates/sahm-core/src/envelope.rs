use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::ClientError;

/// Response envelope for every machine-readable `sahm` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub meta: EnvelopeMeta,
    #[serde(default)]
    pub errors: Vec<EnvelopeError>,
}

impl<T> Envelope<T> {
    pub fn success(meta: EnvelopeMeta, data: T) -> Self {
        Self {
            data,
            meta,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(meta: EnvelopeMeta, data: T, errors: Vec<EnvelopeError>) -> Self {
        Self { data, meta, errors }
    }

    pub fn push_error(&mut self, error: EnvelopeError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub cache: CacheStats,
    pub latency_ms: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl EnvelopeMeta {
    pub fn new(cache: CacheStats, latency_ms: u64) -> Self {
        Self {
            cache,
            latency_ms,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Structured error row carried in [`Envelope::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl EnvelopeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl From<&ClientError> for EnvelopeError {
    fn from(error: &ClientError) -> Self {
        Self::new(error.code(), error.message(), error.retryable())
    }
}
