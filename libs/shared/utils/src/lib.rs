pub mod clock;
pub mod extractor;
pub mod locks;
pub mod test_utils;
pub mod timezone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use extractor::{actor_middleware, Actor, ACTOR_HEADER};
pub use locks::ProviderLocks;
pub use timezone::{DisplayRange, TimezoneError, TimezoneTranslator};
