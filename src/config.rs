//! Registry configuration.

/// Default capacity of the per-call argument buffer, in bytes.
pub const DEFAULT_ARGUMENT_CAPACITY: usize = 2048;

/// Default capacity of the per-call return buffer, in bytes.
pub const DEFAULT_RETURN_CAPACITY: usize = 256;

/// Limits applied when functions are registered.
///
/// A signature whose summed argument sizes exceed `argument_capacity`, or
/// whose return size exceeds `return_capacity`, is rejected at registration
/// rather than at call time. A capacity of zero is valid and only admits
/// signatures that need no bytes at all.
///
/// ```
/// use autobind::BridgeConfig;
///
/// let config = BridgeConfig::default().with_argument_capacity(64);
/// assert_eq!(config.argument_capacity, 64);
/// assert_eq!(config.return_capacity, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Maximum summed size of a function's arguments.
    pub argument_capacity: usize,
    /// Maximum size of a function's return value.
    pub return_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            argument_capacity: DEFAULT_ARGUMENT_CAPACITY,
            return_capacity: DEFAULT_RETURN_CAPACITY,
        }
    }
}

impl BridgeConfig {
    pub fn with_argument_capacity(mut self, bytes: usize) -> Self {
        self.argument_capacity = bytes;
        self
    }

    pub fn with_return_capacity(mut self, bytes: usize) -> Self {
        self.return_capacity = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.argument_capacity, 2048);
        assert_eq!(config.return_capacity, 256);
    }

    #[test]
    fn builders() {
        let config = BridgeConfig::default()
            .with_argument_capacity(0)
            .with_return_capacity(8);
        assert_eq!(config.argument_capacity, 0);
        assert_eq!(config.return_capacity, 8);
    }
}
