//  MAIN.rs
//    by Lut99
//
//  Created:
//    14 Feb 2023, 10:02:13
//  Last edited:
//    04 Apr 2023, 17:48:06
//  Auto updated?
//    Yes
//
//  Description:
//!   Entrypoint to the `nightshift-drv` service.
//

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use dotenvy::dotenv;
use log::{debug, error, info, warn, LevelFilter};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::signal;
use tokio::time::{self, Interval, MissedTickBehavior};

use nightshift_exe::{ExperimentManager, RunContext};

use nightshift_drv::console::{self, Command};
use nightshift_drv::deploy::Deployer;
use nightshift_drv::watcher::{self, DeployWatcher};


/***** ARGUMENTS *****/
/// Defines the arguments that may be given to the service.
#[derive(Parser)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
struct Opts {
    /// Print debug info
    #[clap(short, long, action, help = "If given, prints additional logging information.", env = "DEBUG")]
    debug      : bool,
    /// Run commands against the no-op executor.
    #[clap(long, action, help = "If given, does not execute any real commands but only logs what would have been executed.", env = "DRY_RUN")]
    dry_run    : bool,

    /// The directory watched for deployment artifacts.
    #[clap(short = 'w', long, default_value = "./deploy", help = "The directory to watch for dropped deployment artifacts (.zip or .experiment files).", env = "DEPLOY_DIR")]
    deploy_dir : PathBuf,
    /// The directory artifacts are staged in.
    #[clap(short, long, default_value = "./deploy/.unpack", help = "The directory under which deployment artifacts are unpacked before their experiments are loaded.", env = "UNPACK_DIR")]
    unpack_dir : PathBuf,
}





/***** ENTRYPOINT *****/
// The scheduler is strictly tick-driven, so a single-threaded runtime suffices
#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok();
    let opts = Opts::parse();

    // Configure logger.
    let mut logger = env_logger::builder();
    logger.format_module_path(false);
    if opts.debug {
        logger.filter_level(LevelFilter::Debug).init();
    } else {
        logger.filter_level(LevelFilter::Info).init();
    }
    info!("Initializing nightshift-drv v{}...", env!("CARGO_PKG_VERSION"));
    if opts.dry_run { warn!("Running in dry-run mode; no real commands will be executed."); }

    // Make sure the deployment directory exists before watching it
    if let Err(err) = fs::create_dir_all(&opts.deploy_dir) {
        error!("Failed to create deployment directory '{}': {}", opts.deploy_dir.display(), err);
        std::process::exit(1);
    }
    let mut watcher: DeployWatcher = match DeployWatcher::new(&opts.deploy_dir) {
        Ok(watcher) => watcher,
        Err(err)    => {
            error!("Failed to watch deployment directory '{}': {}", opts.deploy_dir.display(), err);
            std::process::exit(1);
        },
    };

    let deployer: Deployer = Deployer::new(&opts.unpack_dir, opts.dry_run);
    let mut manager: ExperimentManager = ExperimentManager::new();
    let mut ctx: RunContext = RunContext::new();

    // Artifacts already present at startup are ingested as if they were just dropped
    match fs::read_dir(&opts.deploy_dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path: PathBuf = entry.path();
                if path.is_file() && watcher::is_artifact(&path) {
                    if let Err(err) = deployer.ingest(&mut manager, &path) {
                        error!("{}", err);
                    }
                }
            }
        },
        Err(err) => { warn!("Failed to scan deployment directory '{}' for pre-existing artifacts: {}", opts.deploy_dir.display(), err); },
    }

    // Run the tick loop, interleaved with artifact drops and console input
    let mut stdin: Lines<BufReader<Stdin>> = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open: bool = true;
    let mut ticks: Interval = time::interval(Duration::from_secs(1));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Ready; watching '{}' for deployments.", opts.deploy_dir.display());
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                manager.tick(&mut ctx, Local::now());
            },

            artifact = watcher.next() => {
                match artifact {
                    Some(path) => {
                        if let Err(err) = deployer.ingest(&mut manager, &path) {
                            error!("{}", err);
                        }
                    },
                    None => {
                        error!("Deployment watcher stopped unexpectedly; shutting down.");
                        break;
                    },
                }
            },

            line = stdin.next_line(), if console_open => {
                match line {
                    Ok(Some(line)) => match console::parse(&line, Local::now()) {
                        Ok(Some(Command::Pause(until))) => { ctx.pause(until, Local::now()); },
                        Ok(Some(Command::Resume))       => { ctx.resume(); info!("Resumed."); },
                        Ok(Some(Command::Exit))         => { break; },
                        Ok(None)                        => {},
                        Err(err)                        => { error!("{}", err); },
                    },
                    // EOF on stdin just disables the console; the service keeps running
                    Ok(None) => { debug!("Standard input closed; console disabled."); console_open = false; },
                    Err(err) => { error!("Failed to read from standard input: {}", err); console_open = false; },
                }
            },

            _ = signal::ctrl_c() => {
                info!("Received interrupt; shutting down.");
                break;
            },
        }
    }

    info!("Shutting down nightshift-drv.");
}
