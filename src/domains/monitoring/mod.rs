pub mod dispatcher;
pub mod evaluator;
pub mod ledger;
pub mod scheduler;
pub mod telemetry;
pub mod triggers;

pub use dispatcher::*;
pub use evaluator::*;
pub use ledger::*;
pub use scheduler::*;
pub use telemetry::*;
pub use triggers::*;
