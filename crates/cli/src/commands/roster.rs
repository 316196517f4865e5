use serde::Serialize;

use super::{escape_json, load_offline_config, CommandResult, EXIT_CONFIG, EXIT_OK};

#[derive(Debug, Serialize)]
struct RosterEntry<'a> {
    position: usize,
    name: &'a str,
    rating: f64,
    rated: bool,
}

#[derive(Debug, Serialize)]
struct RosterReport<'a> {
    default_rating: f64,
    players: Vec<RosterEntry<'a>>,
}

pub fn run(json_output: bool) -> CommandResult {
    let config = match load_offline_config() {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("roster", "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };

    let ratings = config.rating_table();
    let report = RosterReport {
        default_rating: ratings.default_rating(),
        players: config
            .roster
            .players
            .iter()
            .enumerate()
            .map(|(index, name)| RosterEntry {
                position: index + 1,
                name,
                rating: ratings.rating_of(name),
                rated: ratings.is_rated(name),
            })
            .collect(),
    };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!("{{\"error\":\"{}\"}}", escape_json(&error.to_string()))
        });
        return CommandResult::text(EXIT_OK, output);
    }

    let mut lines = vec![format!("poll order ({} players):", report.players.len())];
    for entry in &report.players {
        let marker = if entry.rated { "" } else { " (default)" };
        lines.push(format!("{:>3}. {} {:.1}{marker}", entry.position, entry.name, entry.rating));
    }
    CommandResult::text(EXIT_OK, lines.join("\n"))
}
