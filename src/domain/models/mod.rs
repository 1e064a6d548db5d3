mod backend;
mod edit_session;
mod error;
mod event;
mod generation;
mod mode;
mod model;
mod round;
mod submission;

pub use backend::*;
pub use edit_session::*;
pub use error::*;
pub use event::*;
pub use generation::*;
pub use mode::*;
pub use model::*;
pub use round::*;
pub use submission::*;
