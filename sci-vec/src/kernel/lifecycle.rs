use super::ConfigError;

/// Constructor validation lifecycle shared by configurable components.
pub trait KernelLifecycle: Sized {
    /// Config type validated by [`KernelLifecycle::try_new`].
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}
