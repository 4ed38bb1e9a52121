pub use app_error::{AppError, AppResult};
pub use config::{MonitorConfig, NetworkConfig, SchedulerConfig, ServkitConfig};
pub use shutdown::Shutdown;
pub use tracing_config::setup_local_tracing;

mod app_error;
mod config;
mod shutdown;
mod tracing_config;
