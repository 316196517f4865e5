use std::sync::Arc;

use pelada_core::config::{AppConfig, ConfigError, LoadOptions};
use pelada_core::{AttendanceSequencer, Balancer, TeamDesk};
use pelada_slack::events::dispatcher_for;
use pelada_slack::service::PeladaService;
use pelada_slack::sink::NoopMessageSink;
use pelada_slack::socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub sequencer: Arc<AttendanceSequencer>,
    pub desk: TeamDesk,
    pub slack_runner: SocketModeRunner,
    pub transport_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let roster = config.roster()?;
    let balancer = Balancer::new(Arc::new(config.rating_table()), config.balancer);
    let service = PeladaService::from_parts(roster, balancer, Arc::new(NoopMessageSink::default()));

    info!(
        event_name = "system.bootstrap.domain_ready",
        correlation_id = "bootstrap",
        roster_size = service.sequencer().roster().len(),
        exhaustive_limit = config.balancer.exhaustive_limit,
        "attendance and team services initialized"
    );

    let sequencer = Arc::clone(service.sequencer());
    let desk = service.desk().clone();
    let slack_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        dispatcher_for(service),
        ReconnectPolicy::default(),
    );

    Ok(Application { config, sequencer, desk, slack_runner, transport_mode: "noop" })
}
