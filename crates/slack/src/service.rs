//! Glue between Slack interactions and the attendance/team domain.

use std::sync::Arc;

use async_trait::async_trait;
use pelada_core::{
    AdvanceOutcome, ApplicationError, AttendanceSequencer, Balancer, ConfirmedRosters,
    DomainError, Roster, SessionKey, TeamDesk, TeamPolicy,
};
use tracing::{debug, info, warn};

use crate::blocks::{self, MessageTemplate, ATTENDANCE_NO_ACTION, ATTENDANCE_YES_ACTION};
use crate::commands::{CommandEnvelope, CommandRouteError, PeladaCommandService};
use crate::events::{BlockActionEvent, BlockActionService, EventContext, EventHandlerError};
use crate::sink::{MessageSink, NoopMessageSink, SinkError};

#[derive(Clone)]
pub struct PeladaService {
    sequencer: Arc<AttendanceSequencer>,
    desk: TeamDesk,
    sink: Arc<dyn MessageSink>,
}

impl PeladaService {
    pub fn new(
        sequencer: Arc<AttendanceSequencer>,
        desk: TeamDesk,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self { sequencer, desk, sink }
    }

    /// Wires a sequencer and a desk over one shared confirmed-roster store.
    pub fn from_parts(roster: Roster, balancer: Balancer, sink: Arc<dyn MessageSink>) -> Self {
        let confirmed = Arc::new(ConfirmedRosters::new());
        let sequencer = Arc::new(AttendanceSequencer::new(Arc::new(roster), Arc::clone(&confirmed)));
        Self::new(sequencer, TeamDesk::new(confirmed, balancer), sink)
    }

    pub fn sequencer(&self) -> &Arc<AttendanceSequencer> {
        &self.sequencer
    }

    pub fn desk(&self) -> &TeamDesk {
        &self.desk
    }
}

impl Default for PeladaService {
    fn default() -> Self {
        Self::from_parts(
            Roster::default(),
            Balancer::default(),
            Arc::new(NoopMessageSink::default()),
        )
    }
}

fn rejection(error: impl Into<DomainError>, correlation_id: &str) -> MessageTemplate {
    let interface = ApplicationError::from(error.into()).into_interface(correlation_id);
    blocks::error_message(interface.user_message(), interface.correlation_id())
}

fn integration_failure(error: SinkError, correlation_id: &str) -> MessageTemplate {
    let interface = ApplicationError::Integration(error.to_string()).into_interface(correlation_id);
    blocks::error_message(interface.user_message(), interface.correlation_id())
}

#[async_trait]
impl PeladaCommandService for PeladaService {
    async fn start_poll(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Option<MessageTemplate>, CommandRouteError> {
        let prompt = match self.sequencer.start(&envelope.user_id, &envelope.channel_id) {
            Ok(prompt) => prompt,
            Err(error) => {
                warn!(
                    event_name = "attendance.start_rejected",
                    correlation_id = %envelope.request_id,
                    channel_id = %envelope.channel_id,
                    user_id = %envelope.user_id,
                    error = %error,
                    "attendance check not started"
                );
                return Ok(Some(rejection(error, &envelope.request_id)));
            }
        };

        let key = prompt.key.clone();
        let panel = blocks::attendance_prompt_message(&prompt);
        let message_ts = match self.sink.post(&envelope.channel_id, &panel).await {
            Ok(message_ts) => message_ts,
            Err(error) => {
                self.sequencer.cancel(&key);
                warn!(
                    event_name = "attendance.panel_post_failed",
                    correlation_id = %envelope.request_id,
                    session = %key,
                    error = %error,
                    "could not post attendance panel; session cancelled"
                );
                return Ok(Some(integration_failure(error, &envelope.request_id)));
            }
        };

        if let Err(error) = self.sequencer.bind_panel(&key, &message_ts) {
            return Ok(Some(rejection(error, &envelope.request_id)));
        }

        info!(
            event_name = "attendance.started",
            correlation_id = %envelope.request_id,
            session = %key,
            message_ts = %message_ts,
            roster_size = prompt.total,
            "attendance check started"
        );
        Ok(None)
    }

    async fn generate_teams(
        &self,
        policy: TeamPolicy,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError> {
        let desk = self.desk.clone();
        let channel_id = envelope.channel_id.clone();
        // Exhaustive selection over 20 players is CPU-bound; keep it off the reactor.
        let outcome = tokio::task::spawn_blocking(move || desk.generate(&channel_id, policy))
            .await
            .map_err(|error| CommandRouteError::Service(format!("team generation panicked: {error}")))?;

        match outcome {
            Ok(result) => {
                info!(
                    event_name = "teams.generated",
                    correlation_id = %envelope.request_id,
                    channel_id = %envelope.channel_id,
                    policy = policy.label(),
                    quality = result.quality.label(),
                    score = result.score,
                    substitutes = result.substitutes.len(),
                    "teams generated"
                );
                Ok(blocks::team_split_message(&result, policy, self.desk.balancer().ratings()))
            }
            Err(error) => {
                warn!(
                    event_name = "teams.rejected",
                    correlation_id = %envelope.request_id,
                    channel_id = %envelope.channel_id,
                    policy = policy.label(),
                    error = %error,
                    "team generation rejected"
                );
                Ok(rejection(error, &envelope.request_id))
            }
        }
    }
}

#[async_trait]
impl BlockActionService for PeladaService {
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError> {
        let yes = match event.action_id.as_str() {
            ATTENDANCE_YES_ACTION => true,
            ATTENDANCE_NO_ACTION => false,
            other => {
                debug!(correlation_id = %ctx.correlation_id, action_id = other, "ignoring unknown action");
                return Ok(None);
            }
        };

        let owner = event.value.as_deref().filter(|value| !value.is_empty()).unwrap_or(&event.user_id);
        let key = SessionKey::new(owner, event.channel_id.as_str());

        let outcome = match self.sequencer.answer(&key, &event.user_id, &event.message_ts, yes) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    event_name = "attendance.signal_rejected",
                    correlation_id = %ctx.correlation_id,
                    session = %key,
                    user_id = %event.user_id,
                    error = %error,
                    "attendance signal rejected"
                );
                return Ok(Some(rejection(error, &ctx.correlation_id)));
            }
        };

        let panel = match &outcome {
            AdvanceOutcome::Continue(prompt) => {
                debug!(
                    event_name = "attendance.answer_recorded",
                    correlation_id = %ctx.correlation_id,
                    session = %key,
                    yes,
                    next_position = prompt.position,
                    "attendance answer recorded"
                );
                blocks::attendance_prompt_message(prompt)
            }
            AdvanceOutcome::Finished(summary) => {
                info!(
                    event_name = "attendance.finished",
                    correlation_id = %ctx.correlation_id,
                    session = %key,
                    confirmed = summary.confirmed.len(),
                    declined = summary.declined.len(),
                    "attendance check finished"
                );
                blocks::attendance_summary_message(summary)
            }
        };

        if let Err(error) = self.sink.update(&event.channel_id, &event.message_ts, &panel).await {
            warn!(
                event_name = "attendance.panel_update_failed",
                correlation_id = %ctx.correlation_id,
                session = %key,
                error = %error,
                "answer recorded but the panel could not be updated"
            );
            return Ok(Some(integration_failure(error, &ctx.correlation_id)));
        }

        Ok(None)
    }
}
