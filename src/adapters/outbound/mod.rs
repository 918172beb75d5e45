pub mod alert_sink;
pub mod console_logger;
pub mod dispatch_data;
pub mod feeds;
pub mod file_logger;
pub mod multi_logger;
pub mod noop_logger;
pub mod providers;

pub use alert_sink::*;
pub use console_logger::*;
pub use dispatch_data::*;
pub use feeds::*;
pub use file_logger::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use providers::*;
