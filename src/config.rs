use crate::error::{Error, Result};
use crate::executor::PanicStrategy;

#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: Option<usize>,

    #[cfg(feature = "telemetry")]
    pub enable_telemetry: bool,

    pub pin_workers: bool,
    pub stack_size: Option<usize>,
    pub thread_name_prefix: String,
    pub panic_strategy: PanicStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,

            #[cfg(feature = "telemetry")]
            enable_telemetry: true,

            pin_workers: false,
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "waitpool-worker".to_string(),
            panic_strategy: PanicStrategy::default(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > 1024 {
                return Err(Error::config("num_threads too large (max 1024)"));
            }
        }

        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    #[cfg(feature = "telemetry")]
    pub fn enable_telemetry(mut self, enable: bool) -> Self {
        self.config.enable_telemetry = enable;
        self
    }

    pub fn pin_workers(mut self, pin: bool) -> Self {
        self.config.pin_workers = pin;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = Config::builder().num_threads(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = Config::builder()
            .num_threads(4)
            .stack_size(1024 * 1024)
            .thread_name_prefix("pool")
            .build()
            .unwrap();

        assert_eq!(config.num_threads, Some(4));
        assert_eq!(config.stack_size, Some(1024 * 1024));
        assert_eq!(config.thread_name_prefix, "pool");
        assert_eq!(config.worker_threads(), 4);
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let result = Config::builder().thread_name_prefix("").build();
        assert!(result.is_err());
    }
}
