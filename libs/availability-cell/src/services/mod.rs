pub mod discretizer;
pub mod registry;

pub use discretizer::{BookedWindowSource, SlotDiscretizer, SlotIter, SlotSequence};
pub use registry::{authorize_slot_owner, AvailabilityRegistry};
