use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::attendance::session::{
    AdvanceOutcome, AttendanceError, AttendancePrompt, AttendanceSession, SessionKey,
};
use crate::attendance::store::ConfirmedRosters;
use crate::roster::Roster;

/// Registry of in-flight attendance checks.
///
/// Signals for different keys proceed independently. Signals for the same
/// key serialize on that session's lock, and a finished session commits its
/// confirmed list to [`ConfirmedRosters`] before it leaves the registry.
pub struct AttendanceSequencer {
    roster: Arc<Roster>,
    sessions: DashMap<SessionKey, Arc<Mutex<AttendanceSession>>>,
    confirmed: Arc<ConfirmedRosters>,
}

impl AttendanceSequencer {
    pub fn new(roster: Arc<Roster>, confirmed: Arc<ConfirmedRosters>) -> Self {
        Self { roster, sessions: DashMap::new(), confirmed }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn confirmed_rosters(&self) -> Arc<ConfirmedRosters> {
        Arc::clone(&self.confirmed)
    }

    pub fn start(
        &self,
        participant_id: &str,
        channel_id: &str,
    ) -> Result<AttendancePrompt, AttendanceError> {
        let key = SessionKey::new(participant_id, channel_id);
        match self.sessions.entry(key.clone()) {
            Entry::Occupied(_) => Err(AttendanceError::AlreadyActive {
                participant_id: key.participant_id,
                channel_id: key.channel_id,
            }),
            Entry::Vacant(slot) => {
                let session = AttendanceSession::new(key, Arc::clone(&self.roster));
                let prompt = session.prompt().ok_or(AttendanceError::AlreadyFinished)?;
                slot.insert(Arc::new(Mutex::new(session)));
                Ok(prompt)
            }
        }
    }

    pub fn bind_panel(&self, key: &SessionKey, token: &str) -> Result<(), AttendanceError> {
        let session = self.session(key)?;
        let mut guard = lock(&session);
        guard.bind_panel(token)
    }

    pub fn answer(
        &self,
        key: &SessionKey,
        acting_id: &str,
        token: &str,
        yes: bool,
    ) -> Result<AdvanceOutcome, AttendanceError> {
        let session = self.session(key)?;
        let outcome = {
            let mut guard = lock(&session);
            guard.record(acting_id, token, yes)?
        };

        if let AdvanceOutcome::Finished(summary) = &outcome {
            self.confirmed.commit(&key.channel_id, summary.confirmed.clone());
            self.sessions.remove_if(key, |_, current| Arc::ptr_eq(current, &session));
        }

        Ok(outcome)
    }

    /// Drops an unfinished session without committing anything.
    pub fn cancel(&self, key: &SessionKey) -> bool {
        self.sessions.remove(key).is_some()
    }

    pub fn is_active(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, key: &SessionKey) -> Result<Arc<Mutex<AttendanceSession>>, AttendanceError> {
        self.sessions.get(key).map(|entry| Arc::clone(entry.value())).ok_or_else(|| {
            AttendanceError::NoActiveSession {
                participant_id: key.participant_id.clone(),
                channel_id: key.channel_id.clone(),
            }
        })
    }
}

fn lock(session: &Mutex<AttendanceSession>) -> MutexGuard<'_, AttendanceSession> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::AttendanceSequencer;
    use crate::attendance::session::{AdvanceOutcome, AttendanceError, SessionKey};
    use crate::attendance::store::ConfirmedRosters;
    use crate::roster::Roster;

    fn sequencer(players: &[&str]) -> AttendanceSequencer {
        let roster = Roster::new(players.iter().copied()).expect("valid roster");
        AttendanceSequencer::new(Arc::new(roster), Arc::new(ConfirmedRosters::new()))
    }

    #[test]
    fn start_returns_first_roster_entry() {
        let sequencer = sequencer(&["Ana", "Rui"]);
        let prompt = sequencer.start("U1", "C1").expect("start");

        assert_eq!(prompt.player, "Ana");
        assert_eq!(prompt.position, 1);
        assert_eq!(prompt.total, 2);
        assert!(sequencer.is_active(&SessionKey::new("U1", "C1")));
    }

    #[test]
    fn duplicate_start_fails_until_session_finishes() {
        let sequencer = sequencer(&["Ana"]);
        let key = SessionKey::new("U1", "C1");
        sequencer.start("U1", "C1").expect("start");

        for _ in 0..3 {
            assert!(matches!(
                sequencer.start("U1", "C1"),
                Err(AttendanceError::AlreadyActive { .. })
            ));
        }

        sequencer.start("U1", "C2").expect("other channel is a different key");
        sequencer.start("U2", "C1").expect("other participant is a different key");

        sequencer.bind_panel(&key, "ts-1").expect("bind");
        sequencer.answer(&key, "U1", "ts-1", true).expect("answer");
        sequencer.start("U1", "C1").expect("restart after finish");
    }

    #[test]
    fn roster_of_size_r_finishes_after_r_answers() {
        let players = ["A", "B", "C", "D", "E", "F", "G"];
        let sequencer = sequencer(&players);
        let key = SessionKey::new("U1", "C1");
        sequencer.start("U1", "C1").expect("start");
        sequencer.bind_panel(&key, "ts-1").expect("bind");

        let mut finished = None;
        for (index, _) in players.iter().enumerate() {
            assert!(finished.is_none(), "finished early at answer {index}");
            match sequencer.answer(&key, "U1", "ts-1", index % 3 != 0).expect("answer") {
                AdvanceOutcome::Continue(_) => {}
                AdvanceOutcome::Finished(summary) => finished = Some(summary),
            }
        }

        let summary = finished.expect("session should finish after every entry is answered");
        assert_eq!(summary.confirmed.len() + summary.declined.len(), players.len());
        assert!(!sequencer.is_active(&key));
        assert_eq!(sequencer.active_sessions(), 0);
        assert_eq!(sequencer.confirmed_rosters().latest("C1"), Some(summary.confirmed));
    }

    #[test]
    fn failures_leave_registry_untouched() {
        let sequencer = sequencer(&["Ana", "Rui"]);
        let key = SessionKey::new("U1", "C1");
        sequencer.start("U1", "C1").expect("start");
        sequencer.bind_panel(&key, "ts-1").expect("bind");

        assert!(matches!(
            sequencer.answer(&key, "U2", "ts-1", true),
            Err(AttendanceError::Unauthorized { .. })
        ));
        assert_eq!(
            sequencer.answer(&key, "U1", "ts-old", true),
            Err(AttendanceError::StaleOrForeignPanel)
        );
        assert!(matches!(
            sequencer.answer(&SessionKey::new("U9", "C1"), "U9", "ts-1", true),
            Err(AttendanceError::NoActiveSession { .. })
        ));

        let outcome = sequencer.answer(&key, "U1", "ts-1", true).expect("retry succeeds");
        assert!(matches!(outcome, AdvanceOutcome::Continue(ref prompt) if prompt.player == "Rui"));
        assert_eq!(sequencer.confirmed_rosters().latest("C1"), None);
    }

    #[test]
    fn finishing_overwrites_channel_roster() {
        let sequencer = sequencer(&["Ana", "Rui"]);
        let key = SessionKey::new("U1", "C1");

        for answers in [[true, true], [false, true]] {
            sequencer.start("U1", "C1").expect("start");
            sequencer.bind_panel(&key, "ts-1").expect("bind");
            for yes in answers {
                sequencer.answer(&key, "U1", "ts-1", yes).expect("answer");
            }
        }

        assert_eq!(sequencer.confirmed_rosters().latest("C1"), Some(vec!["Rui".to_owned()]));
    }

    #[test]
    fn cancel_frees_the_key_without_committing() {
        let sequencer = sequencer(&["Ana", "Rui"]);
        let key = SessionKey::new("U1", "C1");
        sequencer.start("U1", "C1").expect("start");

        assert!(sequencer.cancel(&key));
        assert!(!sequencer.cancel(&key));
        assert_eq!(sequencer.confirmed_rosters().latest("C1"), None);
        sequencer.start("U1", "C1").expect("key is free again");
    }

    #[test]
    fn concurrent_starts_for_one_key_admit_a_single_session() {
        let sequencer = Arc::new(sequencer(&["Ana", "Rui"]));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let sequencer = Arc::clone(&sequencer);
                thread::spawn(move || sequencer.start("U1", "C1").is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread should not panic"))
            .filter(|started| *started)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(sequencer.active_sessions(), 1);
    }
}
