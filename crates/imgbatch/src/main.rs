use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;

use imgbatch::logging::init_logging;
use imgbatch::{
    load_with_env, Config, Database, ImgbatchError, JobRunner, JobService, Scheduler,
    StorageLayout, TickOutcome,
};

#[derive(Parser)]
#[command(name = "imgbatch")]
#[command(version, about = "Re-host and compress the product images listed in CSV uploads")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true, env = "IMGBATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process pending jobs until interrupted
    Run {
        /// Process the pending jobs once and exit
        #[arg(long)]
        once: bool,
    },

    /// Submit a CSV upload as a new job
    Submit {
        csv: PathBuf,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        webhook: Option<String>,
    },

    /// Print a job's status and last message
    Status { id: String },

    /// Print the download address of a finished job's output
    Download { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> imgbatch::Result<()> {
    let config = load_with_env(cli.config.as_deref())?;
    let db = Database::open(&config.database_path())?;

    match cli.command {
        Commands::Run { once } => run_scheduler(&config, db, once),
        Commands::Submit {
            csv,
            email,
            webhook,
        } => {
            let job = service(&config, db).submit_file(&csv, email, webhook)?;
            println!("{}", job.id);
            Ok(())
        }
        Commands::Status { id } => {
            let job = service(&config, db).job(&id)?;
            match job.message {
                Some(message) => println!("{}\t{}", job.status, message),
                None => println!("{}", job.status),
            }
            Ok(())
        }
        Commands::Download { id } => {
            let info = service(&config, db).download_info(&id)?;
            println!("{}\t{}", info.file_url, info.file_name);
            Ok(())
        }
    }
}

fn service(config: &Config, db: Database) -> JobService {
    JobService::new(
        db,
        StorageLayout::new(config.storage_root(), &config.public_base_url),
    )
}

fn run_scheduler(config: &Config, db: Database, once: bool) -> imgbatch::Result<()> {
    let runner = JobRunner::from_config(config, db.clone())?;
    let scheduler = Scheduler::new(runner, db, config.scheduler.interval());

    if once {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ImgbatchError::Io {
                context: "start runtime".to_string(),
                source: e,
            })?;
        match rt.block_on(scheduler.tick())? {
            TickOutcome::Ran { succeeded, failed } => {
                log::info!("{} jobs succeeded, {} failed", succeeded, failed)
            }
            outcome => log::info!("Nothing to do ({:?})", outcome),
        }
        return Ok(());
    }

    let (trigger_tx, trigger_rx) = broadcast::channel(16);
    let handle = scheduler.start(trigger_rx);

    let stopper = scheduler.clone();
    ctrlc::set_handler(move || {
        log::info!("Shutting down");
        stopper.stop();
        let _ = trigger_tx.send(());
    })
    .map_err(|e| ImgbatchError::Io {
        context: "install Ctrl-C handler".to_string(),
        source: std::io::Error::other(e),
    })?;

    log::info!(
        "Scheduler running every {}s, storage root {}",
        config.scheduler.interval_secs,
        config.storage_root().display()
    );

    if handle.join().is_err() {
        log::error!("Scheduler thread panicked");
    }
    Ok(())
}
