pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::PanicStrategy;
pub use crate::scheduler::Priority;
pub use crate::task::{spawn, spawn_with_priority, Task};

pub use crate::{init, init_with_config, shutdown};

#[cfg(feature = "telemetry")]
pub use crate::telemetry::{Metrics, MetricsSnapshot};
