use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roster::Roster;

/// One attendance check per participant per channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub participant_id: String,
    pub channel_id: String,
}

impl SessionKey {
    pub fn new(participant_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self { participant_id: participant_id.into(), channel_id: channel_id.into() }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.participant_id, self.channel_id)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AttendanceError {
    #[error("attendance check already running for `{participant_id}` in `{channel_id}`")]
    AlreadyActive { participant_id: String, channel_id: String },
    #[error("no active attendance check for `{participant_id}` in `{channel_id}`")]
    NoActiveSession { participant_id: String, channel_id: String },
    #[error("`{acting_id}` cannot answer an attendance check owned by `{owner_id}`")]
    Unauthorized { owner_id: String, acting_id: String },
    #[error("answer targets a panel that is not the active attendance panel")]
    StaleOrForeignPanel,
    #[error("attendance check already finished")]
    AlreadyFinished,
}

/// The next roster entry to poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendancePrompt {
    pub key: SessionKey,
    pub player: String,
    /// 1-based position of `player` in the roster.
    pub position: usize,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub key: SessionKey,
    pub confirmed: Vec<String>,
    pub declined: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceOutcome {
    Continue(AttendancePrompt),
    Finished(AttendanceSummary),
}

#[derive(Clone, Debug)]
pub struct AttendanceSession {
    key: SessionKey,
    roster: Arc<Roster>,
    cursor: usize,
    confirmed: Vec<String>,
    declined: Vec<String>,
    panel: Option<String>,
}

impl AttendanceSession {
    pub fn new(key: SessionKey, roster: Arc<Roster>) -> Self {
        Self { key, roster, cursor: 0, confirmed: Vec::new(), declined: Vec::new(), panel: None }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn panel(&self) -> Option<&str> {
        self.panel.as_deref()
    }

    pub fn current_player(&self) -> Option<&str> {
        self.roster.get(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.roster.len()
    }

    pub fn prompt(&self) -> Option<AttendancePrompt> {
        let player = self.current_player()?;
        Some(AttendancePrompt {
            key: self.key.clone(),
            player: player.to_owned(),
            position: self.cursor + 1,
            total: self.roster.len(),
        })
    }

    pub fn summary(&self) -> AttendanceSummary {
        AttendanceSummary {
            key: self.key.clone(),
            confirmed: self.confirmed.clone(),
            declined: self.declined.clone(),
        }
    }

    /// Binds the panel token once; later binds must repeat the same token.
    pub fn bind_panel(&mut self, token: &str) -> Result<(), AttendanceError> {
        match &self.panel {
            Some(bound) if bound == token => Ok(()),
            Some(_) => Err(AttendanceError::StaleOrForeignPanel),
            None => {
                self.panel = Some(token.to_owned());
                Ok(())
            }
        }
    }

    /// Records one yes/no answer. Any error leaves the session untouched.
    pub fn record(
        &mut self,
        acting_id: &str,
        token: &str,
        yes: bool,
    ) -> Result<AdvanceOutcome, AttendanceError> {
        if acting_id != self.key.participant_id {
            return Err(AttendanceError::Unauthorized {
                owner_id: self.key.participant_id.clone(),
                acting_id: acting_id.to_owned(),
            });
        }

        if self.panel.as_deref() != Some(token) {
            return Err(AttendanceError::StaleOrForeignPanel);
        }

        let Some(player) = self.current_player().map(str::to_owned) else {
            return Err(AttendanceError::AlreadyFinished);
        };

        if yes {
            self.confirmed.push(player);
        } else {
            self.declined.push(player);
        }
        self.cursor += 1;

        Ok(match self.prompt() {
            Some(prompt) => AdvanceOutcome::Continue(prompt),
            None => AdvanceOutcome::Finished(self.summary()),
        })
    }
}
