#[allow(clippy::module_inception)]
mod config;
mod logging_config;
mod service_config;
mod storage_config;

pub(crate) use {
    config::Config, logging_config::LoggingConfig, service_config::ServiceConfig,
    storage_config::StorageConfig,
};

pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub(crate) const DEFAULT_LOG_FILTER: &str = "camlight=info,camlight_core=info";

pub(crate) fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
