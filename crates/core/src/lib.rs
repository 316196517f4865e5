pub mod attendance;
pub mod balancer;
pub mod config;
pub mod errors;
pub mod roster;
pub mod teams;

pub use attendance::{
    AdvanceOutcome, AttendanceError, AttendancePrompt, AttendanceSequencer, AttendanceSession,
    AttendanceSummary, ConfirmedRosters, SessionKey,
};
pub use balancer::{
    Balancer, BalancerError, BalancerSettings, SelectionResult, SplitQuality, TeamSplit,
    SQUAD_SIZE, TEAM_SIZE,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use roster::{RatingTable, Roster, RosterError};
pub use teams::{TeamDesk, TeamError, TeamPolicy};
