pub mod dispatch;
pub mod hos;
pub mod logger;
pub mod monitoring;

pub use dispatch::*;
pub use hos::*;
pub use logger::*;
pub use monitoring::*;
