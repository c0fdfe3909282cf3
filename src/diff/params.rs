//! Parameters of a scan and localization pass.

use std::time::Duration;

pub const DEFAULT_MAX_DEPTH: u32 = 7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffParams {
    /// Deepest perft the depth scan tries (inclusive)
    pub max_depth: u32,

    /// Wall-clock limit per engine query (None = unlimited)
    pub timeout: Option<Duration>,

    /// Query candidate and oracle concurrently
    pub parallel: bool,

    /// Record results whose total differs from the sum of their moves
    pub check_sums: bool,
}

impl Default for DiffParams {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            parallel: true,
            check_sums: true,
        }
    }
}

impl DiffParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum scan depth (at least 1)
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout in whole seconds, 0 disables it
    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout((secs > 0).then(|| Duration::from_secs(secs)))
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn check_sums(mut self, check: bool) -> Self {
        self.check_sums = check;
        self
    }
}
