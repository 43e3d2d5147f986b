/// Projection used when layer options name none.
pub const DEFAULT_PROJECTION: &str = "EPSG:3857";

/// Environment variable overriding [`DEFAULT_PROJECTION`].
pub const PROJECTION_ENV: &str = "ATLAS_DEFAULT_PROJECTION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub default_projection: String,
}

impl SyncConfig {
    pub fn new(default_projection: impl Into<String>) -> Self {
        Self {
            default_projection: default_projection.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(PROJECTION_ENV) {
            Some(p) if !p.trim().is_empty() => Self::new(p.trim()),
            _ => Self::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECTION)
    }
}
