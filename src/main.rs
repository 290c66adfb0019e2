//! MDP3 command-batch composer with a dry-run execution engine

use color_eyre::{eyre::eyre, Result};
use flume::bounded;
use tracing::info;

use mdp3::comp::param::Job;
use mdp3::pipeline::{self, DryRunEngine, EngineReservations, Submission};
use mdp3::{Config, MdpDevice};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("mdp3=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(platform), Some(job_path)) = (args.next(), args.next()) else {
        return Err(eyre!("usage: mdp3 <platform.toml> <job.toml>"));
    };

    info!("MDP3 Launching...");

    // Load configuration
    let config = Config::load(Some(&platform))?;
    let device = MdpDevice::new(&config)?;
    let job = Job::load(&job_path)?;

    let batch = pipeline::compose(&device, &job)?;
    for limitation in &batch.best_effort {
        info!("Best effort: {}", limitation);
    }
    let total = batch.commands.len();

    // Set up tx/rx
    let (tx, rx) = bounded::<Submission>(config.pipeline.submit_queue_depth);
    let engine = tokio::spawn(pipeline::serve(
        DryRunEngine::default(),
        device.events().clone(),
        rx,
    ));

    let reservations = EngineReservations::new();
    let reservation = reservations.reserve(batch.engine_mask).await;
    tx.send_async(Submission { batch, reservation })
        .await
        .map_err(|e| eyre!("engine stopped: {}", e))?;
    drop(tx);

    let engine = engine.await?;
    info!(
        "Composed {} commands, engine ran {} batches / {} commands",
        total, engine.batches, engine.commands
    );
    println!("{total}");

    Ok(())
}
