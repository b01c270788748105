use std::time::Duration;

/// Knobs for one [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How long a single query waits for its reply.
    pub timeout: Duration,
    /// Nested lookups allowed below the top-level call before giving up.
    pub max_depth: usize,
    /// Destination port of every query.
    pub port: u16,
}

impl ResolverConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_DEPTH: usize = 32;
    pub const DEFAULT_PORT: u16 = 53;
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            port: Self::DEFAULT_PORT,
        }
    }
}
