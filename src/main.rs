#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod keychain;
mod logger;
mod planner;
mod position_sync;
mod providers;
mod scheduling;
mod util;
mod visibility;

use crate::keychain::Keychain;
use crate::planner::{MetaTaskPlanner, PlanningOutput, PlanningRequest, PlanningStage};
use crate::position_sync::PositionChannel;
use crate::providers::ScenarioProvider;
use crate::util::{ConfigError, PlannerConfig};
use std::{env, process::ExitCode, sync::Arc};
use strum::IntoEnumIterator;

type RunError = Box<dyn std::error::Error>;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), RunError> {
    let scenario_path =
        env::var("MTP_SCENARIO").map_err(|_| ConfigError::Invalid("MTP_SCENARIO is not set".to_string()))?;
    let config = match env::var("MTP_CONFIG") {
        Ok(path) => PlannerConfig::load(&path)?,
        Err(_) => PlannerConfig::default(),
    };
    let provider = ScenarioProvider::load(&scenario_path)?;
    info!("Loaded scenario {scenario_path}");

    let request = PlanningRequest { observer_ids: provider.observer_ids(), target_ids: provider.target_ids() };
    let (channel, worker) = PositionChannel::spawn(Box::new(provider.clone()), &config.position_sync);
    let shared = Arc::new(provider);
    let keychain = Keychain::new(shared.clone(), shared, config);

    let cancel = keychain.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding position batches");
            cancel.cancel();
        }
    });

    let result = MetaTaskPlanner::new().run(&keychain, &request, &channel).await;
    match worker.shutdown(channel).await {
        Ok((_, stats)) => info!(
            "Position provider: {} requests, {} cache hits, mean call {:.3}s",
            stats.requests,
            stats.cache_hits,
            stats.mean_call_secs()
        ),
        Err(e) => error!("Position worker did not shut down cleanly: {e:?}"),
    }
    report(&result?)
}

fn report(output: &PlanningOutput) -> Result<(), RunError> {
    let meta = &output.metadata;
    for stage in PlanningStage::iter() {
        log!("{stage} took {:.1}ms", meta.timings.get(stage));
    }
    info!(
        "Cycle {} ({:.2}h), {} visible of {} tasks, {} positions collected",
        output.cycle.interval(),
        meta.planning_duration_hours,
        meta.visible_tasks,
        meta.total_tasks,
        meta.total_positions_collected
    );
    let json = serde_json::to_string_pretty(output)?;
    match env::var("MTP_OUTPUT") {
        Ok(path) => {
            std::fs::write(&path, json)?;
            info!("Wrote planning output to {path}");
        }
        Err(_) => println!("{json}"),
    }
    Ok(())
}
