use crate::domains::logger::{DomainLogger, FileLogger};
use std::sync::Arc;

/// Initialize the fast_log-backed file logger and hand back the port.
pub fn init_file_logger(path: &str) -> Result<Arc<dyn DomainLogger>, Box<dyn std::error::Error>> {
    FileLogger::init(path)?;
    Ok(Arc::new(FileLogger))
}
