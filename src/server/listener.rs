use tracing::info;

use crate::config::Config;
use crate::server::scheduler::Scheduler;

/// Binds the configured address and serves until the scheduler stops.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let responder = cfg.build_responder();
    let scheduler = Scheduler::bind(cfg, responder).await?;

    info!(
        addr = %scheduler.local_addr()?,
        responder = ?cfg.responder,
        "Server starting"
    );

    scheduler.run().await
}
