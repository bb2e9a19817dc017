pub mod auth;
pub mod error;
pub mod time_window;

pub use auth::{Identity, IdentityResolver, Role};
pub use error::{AppError, SchedulingError, ValidationKind};
pub use time_window::TimeWindow;
