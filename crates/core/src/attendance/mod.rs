pub mod sequencer;
pub mod session;
pub mod store;

pub use sequencer::AttendanceSequencer;
pub use session::{
    AdvanceOutcome, AttendanceError, AttendancePrompt, AttendanceSession, AttendanceSummary,
    SessionKey,
};
pub use store::ConfirmedRosters;
