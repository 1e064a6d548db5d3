mod edit_session;
mod feed;
mod fences;
mod limiter;
mod orchestrator;
mod retry;
mod source;

#[cfg(test)]
#[path = "fakes_test.rs"]
pub mod fakes;

pub use edit_session::*;
pub use feed::*;
pub use fences::*;
pub use limiter::*;
pub use orchestrator::*;
pub use retry::*;
pub use source::*;
