use async_trait::async_trait;
use pelada_core::TeamPolicy;
use thiserror::Error;

use crate::blocks::{self, MessageTemplate};

pub const SUPPORTED_COMMANDS: [&str; 4] = ["/futebol", "/teams", "/remake", "/pelada"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    pub trigger_ts: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEnvelope {
    /// Slash command without the leading `/`.
    pub command: String,
    pub verb: String,
    pub freeform_args: String,
    pub channel_id: String,
    pub user_id: String,
    pub trigger_ts: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeladaCommand {
    StartPoll,
    Teams { policy: TeamPolicy },
    Help,
    Usage { message: String },
    Unknown { verb: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("command service failed: {0}")]
    Service(String),
}

/// `/pelada <verb> ...` carries its verb in the text; the other commands are their own verb.
pub fn normalize_command(
    payload: SlashCommandPayload,
) -> Result<CommandEnvelope, CommandParseError> {
    let command = payload.command.trim().to_ascii_lowercase();
    if !SUPPORTED_COMMANDS.contains(&command.as_str()) {
        return Err(CommandParseError::UnsupportedCommand(payload.command));
    }
    let command = command.trim_start_matches('/').to_owned();

    let text = payload.text.trim();
    let (verb, freeform_args) = if command == "pelada" {
        let mut parts = text.split_whitespace();
        let verb = parts.next().unwrap_or("help").to_ascii_lowercase();
        (verb, parts.collect::<Vec<_>>().join(" "))
    } else {
        (command.clone(), text.split_whitespace().collect::<Vec<_>>().join(" "))
    };

    Ok(CommandEnvelope {
        command,
        verb,
        freeform_args,
        channel_id: payload.channel_id,
        user_id: payload.user_id,
        trigger_ts: payload.trigger_ts,
        request_id: payload.request_id,
    })
}

pub fn classify_command(verb: &str, freeform_args: &str) -> PeladaCommand {
    match verb {
        "futebol" | "poll" | "start" => PeladaCommand::StartPoll,
        "teams" => match parse_rank(freeform_args) {
            Ok(None | Some(0)) => PeladaCommand::Teams { policy: TeamPolicy::Optimal },
            Ok(Some(rank)) => PeladaCommand::Teams { policy: TeamPolicy::Ranked(rank) },
            Err(message) => PeladaCommand::Usage { message },
        },
        "remake" => PeladaCommand::Teams { policy: TeamPolicy::Random },
        "help" | "" => PeladaCommand::Help,
        other => PeladaCommand::Unknown { verb: other.to_owned() },
    }
}

fn parse_rank(freeform_args: &str) -> Result<Option<usize>, String> {
    let mut parts = freeform_args.split_whitespace();
    let Some(raw) = parts.next() else {
        return Ok(None);
    };
    if parts.next().is_some() {
        return Err("Usage: `/teams` or `/teams <rank>` with a single whole number.".to_owned());
    }
    raw.parse::<usize>().map(Some).map_err(|_| {
        format!("`{raw}` is not a rank. Usage: `/teams` or `/teams <rank>` with a whole number.")
    })
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: PeladaCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// `None` means the service already posted its output to the channel.
    pub async fn route(
        &self,
        envelope: CommandEnvelope,
    ) -> Result<Option<MessageTemplate>, CommandRouteError> {
        match classify_command(&envelope.verb, &envelope.freeform_args) {
            PeladaCommand::StartPoll => self.service.start_poll(&envelope).await,
            PeladaCommand::Teams { policy } => {
                self.service.generate_teams(policy, &envelope).await.map(Some)
            }
            PeladaCommand::Help => Ok(Some(blocks::help_message())),
            PeladaCommand::Usage { message } => {
                Ok(Some(blocks::error_message(&message, &envelope.request_id)))
            }
            PeladaCommand::Unknown { verb } => Ok(Some(blocks::error_message(
                &format!("Unsupported command `/{} {verb}`. Try `/pelada help`.", envelope.command),
                &envelope.request_id,
            ))),
        }
    }
}

#[async_trait]
pub trait PeladaCommandService: Send + Sync {
    async fn start_poll(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<Option<MessageTemplate>, CommandRouteError>;

    async fn generate_teams(
        &self,
        policy: TeamPolicy,
        envelope: &CommandEnvelope,
    ) -> Result<MessageTemplate, CommandRouteError>;
}
