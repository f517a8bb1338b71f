//! Application services

pub mod dispatch;
pub mod input;
pub mod output;

pub use dispatch::DispatchService;
pub use input::InputResolver;
pub use output::OutputService;
