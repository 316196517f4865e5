use thiserror::Error;

use crate::{
    attendance::AttendanceError, balancer::BalancerError, roster::RosterError, teams::TeamError,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Attendance(#[from] AttendanceError),
    #[error(transparent)]
    Teams(#[from] TeamError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<BalancerError> for DomainError {
    fn from(value: BalancerError) -> Self {
        Self::Teams(TeamError::Balancer(value))
    }
}

impl DomainError {
    /// Text shown to the participant whose signal was rejected.
    pub fn user_message(&self) -> String {
        match self {
            Self::Attendance(AttendanceError::AlreadyActive { .. }) => {
                "There is already an attendance check running in this channel for you.".to_owned()
            }
            Self::Attendance(AttendanceError::NoActiveSession { .. }) => {
                "No active attendance check here. Run `/futebol` to start one.".to_owned()
            }
            Self::Attendance(AttendanceError::Unauthorized { .. }) => {
                "Only the person who started the attendance check can answer here.".to_owned()
            }
            Self::Attendance(AttendanceError::StaleOrForeignPanel) => {
                "This panel is not the active one. Run `/futebol` again if needed.".to_owned()
            }
            Self::Attendance(AttendanceError::AlreadyFinished) => {
                "This attendance check is already finished.".to_owned()
            }
            Self::Teams(TeamError::NoConfirmedRoster { .. }) => {
                "No confirmed list found for this channel yet. Run `/futebol` first.".to_owned()
            }
            Self::Teams(TeamError::Balancer(BalancerError::InsufficientPlayers {
                confirmed,
                required,
            })) => format!(
                ":warning: You have *{confirmed}* confirmed players. You need *{required}* for fixed 5v5."
            ),
            Self::Teams(TeamError::Balancer(BalancerError::RankOutOfRange { available, .. })) => {
                format!("Only {available} distinct splits exist. Pick a rank between 0 and {}.", available.saturating_sub(1))
            }
            Self::Teams(TeamError::Balancer(error @ BalancerError::InvalidCount { .. })) => {
                format!("Team generation failed: {error}.")
            }
            Self::Roster(error) => format!("The configured roster is invalid: {error}."),
            Self::InvariantViolation(message) => format!("Something went wrong: {message}."),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. } => message,
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.user_message(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::attendance::AttendanceError;
    use crate::balancer::BalancerError;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::teams::TeamError;

    #[test]
    fn domain_error_maps_to_bad_request_with_participant_text() {
        let interface = ApplicationError::from(DomainError::from(AttendanceError::Unauthorized {
            owner_id: "U1".to_owned(),
            acting_id: "U2".to_owned(),
        }))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "Only the person who started the attendance check can answer here."
        );
    }

    #[test]
    fn insufficient_players_message_reports_counts() {
        let error = DomainError::from(BalancerError::InsufficientPlayers {
            confirmed: 9,
            required: 10,
        });
        assert!(error.user_message().contains("*9* confirmed players"));
        assert!(matches!(error, DomainError::Teams(TeamError::Balancer(_))));
    }

    #[test]
    fn integration_error_maps_to_service_unavailable() {
        let interface =
            ApplicationError::Integration("socket closed".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-3");
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("invalid app token".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
