use std::sync::Arc;

use clap::ValueEnum;
use pelada_core::teams::generate_for;
use pelada_core::{
    Balancer, BalancerError, RatingTable, Roster, SelectionResult, TeamError, TeamPolicy,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use super::{load_offline_config, CommandResult, EXIT_BALANCER, EXIT_CONFIG};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SplitPolicyArg {
    Optimal,
    Ranked,
    Random,
}

impl SplitPolicyArg {
    fn into_policy(self, rank: Option<usize>) -> TeamPolicy {
        match self {
            Self::Optimal => TeamPolicy::Optimal,
            Self::Ranked => TeamPolicy::Ranked(rank.unwrap_or(0)),
            Self::Random => TeamPolicy::Random,
        }
    }
}

#[derive(Debug, Serialize)]
struct RatedPlayer {
    name: String,
    rating: f64,
}

#[derive(Debug, Serialize)]
struct TeamReport {
    players: Vec<RatedPlayer>,
    sum: f64,
}

#[derive(Debug, Serialize)]
struct SplitReport {
    policy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    rank: Option<usize>,
    quality: &'static str,
    team_a: TeamReport,
    team_b: TeamReport,
    difference: f64,
    substitutes: Vec<String>,
}

pub fn run(
    policy: SplitPolicyArg,
    rank: Option<usize>,
    seed: Option<u64>,
    players: &[String],
) -> CommandResult {
    let config = match load_offline_config() {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("split", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };

    if let Err(error) = Roster::new(players.iter().cloned()) {
        return CommandResult::failure("split", "invalid_players", error.to_string(), EXIT_BALANCER);
    }

    let balancer = Balancer::new(Arc::new(config.rating_table()), config.balancer);
    let policy = policy.into_policy(rank);
    let outcome = match seed {
        Some(seed) => generate_for(&balancer, players, policy, &mut StdRng::seed_from_u64(seed)),
        None => generate_for(&balancer, players, policy, &mut rand::thread_rng()),
    };

    match outcome {
        Ok(result) => {
            let report = build_report(&result, policy, balancer.ratings());
            let message = format!(
                "Team A ({:.1}) vs Team B ({:.1}), difference {:.2}",
                report.team_a.sum, report.team_b.sum, report.difference
            );
            CommandResult::success_with("split", message, serde_json::to_value(&report).ok())
        }
        Err(error) => {
            CommandResult::failure("split", error_class(&error), error.to_string(), EXIT_BALANCER)
        }
    }
}

fn build_report(result: &SelectionResult, policy: TeamPolicy, ratings: &RatingTable) -> SplitReport {
    let team = |names: &[String], sum: f64| TeamReport {
        players: names
            .iter()
            .map(|name| RatedPlayer { name: name.clone(), rating: ratings.rating_of(name) })
            .collect(),
        sum,
    };

    SplitReport {
        policy: policy.label(),
        rank: result.rank,
        quality: result.quality.label(),
        team_a: team(&result.split.team_a, result.split.sum_a),
        team_b: team(&result.split.team_b, result.split.sum_b),
        difference: result.split.difference(),
        substitutes: result.substitutes.clone(),
    }
}

fn error_class(error: &TeamError) -> &'static str {
    match error {
        TeamError::Balancer(BalancerError::InsufficientPlayers { .. }) => "insufficient_players",
        TeamError::Balancer(BalancerError::RankOutOfRange { .. }) => "rank_out_of_range",
        TeamError::Balancer(BalancerError::InvalidCount { .. }) => "invalid_count",
        TeamError::NoConfirmedRoster { .. } => "no_confirmed_roster",
    }
}
