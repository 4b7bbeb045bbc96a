use std::fmt;

/// Provider API key. Only ever carried inside a lookup request; never stored.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelLookupStatus {
    #[default]
    Idle,
    MissingApiKey,
    Loading,
    Loaded(Vec<String>),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelLookup {
    pub provider: Option<String>,
    pub status: ModelLookupStatus,
}
