pub mod booking;
pub mod conflict;
pub mod lifecycle;

pub use booking::{authorize_booking, authorize_participant, BookingEngine};
pub use conflict::{check_conflicts, find_conflict, BookedAppointments};
pub use lifecycle::{allowed_transitions, can_transition, is_cancellable, AppointmentLifecycle};
