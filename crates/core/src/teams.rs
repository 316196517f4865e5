use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attendance::ConfirmedRosters;
use crate::balancer::{Balancer, BalancerError, SelectionResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "rank", rename_all = "snake_case")]
pub enum TeamPolicy {
    Optimal,
    /// k-th fairest partition of the selected ten (0 = optimal).
    Ranked(usize),
    Random,
}

impl TeamPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Ranked(_) => "ranked",
            Self::Random => "random",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TeamError {
    #[error("no confirmed roster recorded for channel `{channel_id}`")]
    NoConfirmedRoster { channel_id: String },
    #[error(transparent)]
    Balancer(#[from] BalancerError),
}

/// Serves team-generation requests from the latest committed roster of a channel.
#[derive(Clone)]
pub struct TeamDesk {
    rosters: Arc<ConfirmedRosters>,
    balancer: Balancer,
}

impl TeamDesk {
    pub fn new(rosters: Arc<ConfirmedRosters>, balancer: Balancer) -> Self {
        Self { rosters, balancer }
    }

    pub fn balancer(&self) -> &Balancer {
        &self.balancer
    }

    pub fn generate(&self, channel_id: &str, policy: TeamPolicy) -> Result<SelectionResult, TeamError> {
        self.generate_with_rng(channel_id, policy, &mut rand::thread_rng())
    }

    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        channel_id: &str,
        policy: TeamPolicy,
        rng: &mut R,
    ) -> Result<SelectionResult, TeamError> {
        let confirmed = self
            .rosters
            .latest(channel_id)
            .filter(|confirmed| !confirmed.is_empty())
            .ok_or_else(|| TeamError::NoConfirmedRoster { channel_id: channel_id.to_owned() })?;

        generate_for(&self.balancer, &confirmed, policy, rng)
    }
}

/// Applies `policy` to an explicit confirmed list.
pub fn generate_for<S, R>(
    balancer: &Balancer,
    confirmed: &[S],
    policy: TeamPolicy,
    rng: &mut R,
) -> Result<SelectionResult, TeamError>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    let result = match policy {
        TeamPolicy::Optimal => balancer.select_and_split_optimal_with_rng(confirmed, rng)?,
        TeamPolicy::Ranked(rank) => {
            let selection = balancer.select_and_split_optimal_with_rng(confirmed, rng)?;
            // Rank in confirmed order so rank 0 reproduces the optimal split.
            let ten: Vec<&str> = confirmed
                .iter()
                .map(AsRef::as_ref)
                .filter(|name| selection.split.players().any(|player| player == *name))
                .collect();
            let split = balancer.ranked_split(&ten, rank)?;
            SelectionResult {
                score: split.difference(),
                split,
                rank: Some(rank),
                ..selection
            }
        }
        TeamPolicy::Random => balancer.select_random_with_rng(confirmed, rng)?,
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{TeamDesk, TeamError, TeamPolicy};
    use crate::attendance::ConfirmedRosters;
    use crate::balancer::{Balancer, BalancerError, SplitQuality};
    use crate::roster::Roster;

    fn desk_with(channel: &str, players: usize) -> TeamDesk {
        let rosters = Arc::new(ConfirmedRosters::new());
        let roster = Roster::default();
        rosters.commit(channel, roster.players().iter().take(players).cloned().collect());
        TeamDesk::new(rosters, Balancer::default())
    }

    #[test]
    fn missing_roster_is_reported() {
        let desk = desk_with("C1", 12);
        assert_eq!(
            desk.generate("C2", TeamPolicy::Optimal),
            Err(TeamError::NoConfirmedRoster { channel_id: "C2".to_owned() })
        );
    }

    #[test]
    fn empty_committed_roster_counts_as_missing() {
        let desk = desk_with("C1", 0);
        assert!(matches!(
            desk.generate("C1", TeamPolicy::Random),
            Err(TeamError::NoConfirmedRoster { .. })
        ));
    }

    #[test]
    fn nine_confirmed_is_insufficient() {
        let desk = desk_with("C1", 9);
        assert_eq!(
            desk.generate("C1", TeamPolicy::Optimal),
            Err(TeamError::Balancer(BalancerError::InsufficientPlayers {
                confirmed: 9,
                required: 10
            }))
        );
    }

    #[test]
    fn ranked_policy_reorders_within_selected_ten() {
        let desk = desk_with("C1", 12);
        let optimal = desk.generate("C1", TeamPolicy::Optimal).expect("optimal");
        let ranked_zero = desk.generate("C1", TeamPolicy::Ranked(0)).expect("rank 0");
        let ranked_three = desk.generate("C1", TeamPolicy::Ranked(3)).expect("rank 3");

        assert_eq!(ranked_zero.split, optimal.split);
        assert_eq!(ranked_zero.rank, Some(0));
        assert_eq!(ranked_three.substitutes, optimal.substitutes);
        assert!(ranked_three.score >= optimal.score);

        let chosen: BTreeSet<&str> = optimal.split.players().collect();
        let reranked: BTreeSet<&str> = ranked_three.split.players().collect();
        assert_eq!(chosen, reranked);
    }

    #[test]
    fn ranked_policy_rejects_rank_past_last_partition() {
        let desk = desk_with("C1", 10);
        assert_eq!(
            desk.generate("C1", TeamPolicy::Ranked(126)),
            Err(TeamError::Balancer(BalancerError::RankOutOfRange { rank: 126, available: 126 }))
        );
    }

    #[test]
    fn policy_serializes_with_adjacent_rank() {
        let ranked = serde_json::to_value(TeamPolicy::Ranked(2)).expect("serialize ranked");
        assert_eq!(ranked, serde_json::json!({ "policy": "ranked", "rank": 2 }));
        let optimal = serde_json::to_value(TeamPolicy::Optimal).expect("serialize optimal");
        assert_eq!(optimal, serde_json::json!({ "policy": "optimal" }));
    }

    #[test]
    fn random_policy_is_flagged() {
        let desk = desk_with("C1", 14);
        let mut rng = StdRng::seed_from_u64(1);
        let result = desk.generate_with_rng("C1", TeamPolicy::Random, &mut rng).expect("random");

        assert_eq!(result.quality, SplitQuality::Random);
        assert_eq!(result.substitutes.len(), 4);
    }
}
