pub mod monitoring_service;
pub mod planning_service;

pub use monitoring_service::*;
pub use planning_service::*;
