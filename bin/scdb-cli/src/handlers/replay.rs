use anyhow::{Context, Result};
use futures::StreamExt;
use scdb::Scdb;
use scdb_params::prelude::ScdbParams;
use scdb_primitives::scripts::commitments::data_outputs;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    cli::ReplayArgs,
    params,
    trace::{self, TraceStep},
};

pub(crate) async fn handle_replay(args: ReplayArgs) -> Result<()> {
    let ReplayArgs {
        trace: trace_path,
        events,
        params,
    } = args;
    let params = params::load(&params)?;
    let steps = trace::from_path(&trace_path)?;

    let scdb = Scdb::new(params.clone())?;

    let printer = events.then(|| {
        let mut subscription = scdb.subscribe();
        tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => debug!(%e, %event, "could not serialize event"),
                }
            }
        })
    });

    info!(steps = steps.len(), "replaying trace");
    let result = replay_steps(&scdb, &params, steps);

    let summary = json!({
        "tip": scdb.tip(),
        "scdb_hash": scdb.scdb_hash(),
        "state": scdb.state(),
    });

    // the printer finishes once the last sender is gone
    drop(scdb);
    if let Some(printer) = printer {
        printer.await?;
    }

    result?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn replay_steps(scdb: &Scdb, params: &ScdbParams, steps: Vec<TraceStep>) -> Result<()> {
    for (idx, step) in steps.into_iter().enumerate() {
        let height = step.height();

        match step {
            TraceStep::Package { height, updates } => {
                let outcome = scdb.add_update_package(trace::package(height, updates));
                debug!(%idx, %height, ?outcome, "buffered package");
            }
            TraceStep::Block {
                height,
                commitment,
                proposals,
            } => {
                let outputs = data_outputs(
                    &params.commitment_tag,
                    &params.bundle_commit_tag,
                    commitment.as_ref(),
                    &proposals,
                );
                scdb.connect_block(height, &outputs)
                    .with_context(|| format!("step {idx} failed at height {height}"))?;
            }
            TraceStep::Mine {
                height,
                updates,
                proposals,
            } => {
                let package = trace::package(height, updates);
                let commitment = scdb.predict_commitment(&package);
                scdb.add_update_package(package);

                let outputs = data_outputs(
                    &params.commitment_tag,
                    &params.bundle_commit_tag,
                    Some(&commitment),
                    &proposals,
                );
                scdb.connect_block(height, &outputs)
                    .with_context(|| format!("step {idx} failed at height {height}"))?;
            }
        }

        debug!(%idx, %height, hash = %scdb.scdb_hash(), "applied step");
    }

    Ok(())
}
