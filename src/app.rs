use crate::cli::{Cli, Commands, JobArgs, SettingsArgs};
use anyhow::{Context, Result, bail};
use ffspeed::config::Config;
use ffspeed::engine::{
    self, BatchEvent, BatchStatus, EncoderProfile, JobSettings, Session, ThreadCount,
};
use std::path::{Path, PathBuf};
use std::process::{self, Command};
use tracing::warn;

pub fn run(cli: Cli) {
    let config = Config::load().unwrap_or_else(|e| {
        warn!("{:#}; using built-in defaults", e);
        Config::default()
    });

    let result = match cli.command {
        Commands::CheckFfmpeg => handle_check_ffmpeg(&config),
        Commands::Probe { json } => handle_probe(&config, json),
        Commands::DryRun { job, output } => handle_dry_run(&config, job, output),
        Commands::Run { job, output } => handle_run(&config, job, output),
        Commands::Preview {
            file,
            settings,
            seconds,
            preview_dir,
            open,
        } => handle_preview(&config, file, settings, seconds, preview_dir, open),
        Commands::InitConfig => {
            handle_init_config();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Flags first, then config
fn job_settings(config: &Config, args: &SettingsArgs) -> JobSettings {
    let defaults = config.defaults.job_settings();
    JobSettings {
        speed: args.speed.unwrap_or(defaults.speed),
        frame_rate: args.fps.unwrap_or(defaults.frame_rate),
        quality: args.quality.unwrap_or(defaults.quality),
    }
}

fn threads(config: &Config, args: &SettingsArgs) -> ThreadCount {
    args.threads.unwrap_or(config.defaults.threads)
}

/// Flag, then config, then the best encoder the probe found
fn encoder(session: &Session, config: &Config, args: &SettingsArgs) -> EncoderProfile {
    args.encoder
        .or(config.defaults.encoder)
        .unwrap_or(session.hardware().selected)
}

/// Probe hardware and queue every input, scanning folders
fn build_session(config: &Config, job: &JobArgs) -> Result<Session> {
    let mut session = Session::new(config.transcoder.program.clone());
    session.probe_hardware();

    let settings = job_settings(config, &job.settings);
    for input in &job.inputs {
        if input.is_dir() {
            let added = session.add_folder(input, &settings)?;
            if added == 0 {
                warn!("No videos found in {}", input.display());
            }
        } else if input.is_file() {
            session.add_job(settings.job_for(input))?;
        } else {
            bail!("Input not found: {}", input.display());
        }
    }

    Ok(session)
}

fn output_dir(config: &Config, output: Option<PathBuf>) -> Option<PathBuf> {
    output.or_else(|| config.defaults.output_dir.clone())
}

fn handle_check_ffmpeg(config: &Config) -> Result<()> {
    let version = engine::ffmpeg_version(&config.transcoder.program)?;
    println!("{} found: {}", config.transcoder.program, version);
    Ok(())
}

fn handle_probe(config: &Config, json: bool) -> Result<()> {
    let mut session = Session::new(config.transcoder.program.clone());
    let hardware = session.probe_hardware();

    if json {
        let text =
            serde_json::to_string_pretty(hardware).context("Failed to serialize hardware")?;
        println!("{}", text);
        return Ok(());
    }

    println!("Encoders available:");
    for choice in hardware.choices() {
        let marker = if choice == hardware.selected { "*" } else { " " };
        println!(
            " {} {:<13} {} [{}]",
            marker,
            choice.id(),
            choice.display_name(),
            choice.encoder_name()
        );
    }
    Ok(())
}

fn handle_dry_run(config: &Config, job: JobArgs, output: Option<PathBuf>) -> Result<()> {
    let session = build_session(config, &job)?;
    let encoder = encoder(&session, config, &job.settings);
    let encoder = session.hardware().select(encoder)?.selected;
    let threads = threads(config, &job.settings);
    let dir = output_dir(config, output).unwrap_or_else(|| PathBuf::from("."));

    println!(
        "Dry run: {} job(s) with {} into {}",
        session.jobs().len(),
        encoder.display_name(),
        dir.display()
    );
    for spec in session.jobs() {
        let output_path = engine::output_path_for(&spec.source, spec.speed, &dir);
        match engine::build_command_plan(spec, encoder, threads, &output_path, None) {
            Ok(plan) => println!("{}", plan.display(session.program())),
            Err(e) => eprintln!("Skipping {}: {}", spec.display_name(), e),
        }
    }
    Ok(())
}

fn handle_run(config: &Config, job: JobArgs, output: Option<PathBuf>) -> Result<()> {
    let session = build_session(config, &job)?;
    let encoder = encoder(&session, config, &job.settings);
    let threads = threads(config, &job.settings);
    let dir = output_dir(config, output).unwrap_or_default();

    let handle = session.start_batch(dir, encoder, threads)?;

    let cancel = handle.cancel_token();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nStopping after the current video...");
        cancel.cancel();
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    for event in handle.events() {
        match event {
            BatchEvent::Progress {
                percent, message, ..
            } => println!("[{:>5.1}%] {}", percent, message),
            BatchEvent::JobCompleted { output, .. } => println!("  -> {}", output.display()),
            BatchEvent::JobFailed { file, message, .. } => {
                eprintln!("  failed {}: {}", file, message)
            }
            BatchEvent::Finished { message, .. } => println!("{}", message),
        }
    }

    let outcome = handle.wait()?;
    println!(
        "{} of {} video(s) processed, {} failed",
        outcome.succeeded(),
        outcome.total,
        outcome.failures.len()
    );

    if outcome.status == BatchStatus::Completed && !outcome.failures.is_empty() {
        bail!("{} video(s) failed", outcome.failures.len());
    }
    Ok(())
}

fn handle_preview(
    config: &Config,
    file: PathBuf,
    settings: SettingsArgs,
    seconds: Option<u32>,
    preview_dir: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    if !file.is_file() {
        bail!("Input not found: {}", file.display());
    }

    let mut session = Session::new(config.transcoder.program.clone());
    session.probe_hardware();
    session.add_job(job_settings(config, &settings).job_for(&file))?;

    let encoder = encoder(&session, config, &settings);
    let seconds = seconds.unwrap_or(config.defaults.preview_seconds);
    let dir = preview_dir.unwrap_or_else(engine::default_preview_dir);

    println!("Rendering {}s preview of {}...", seconds, file.display());
    let handle = session.preview(0, encoder, threads(config, &settings), seconds, &dir)?;
    let output = handle
        .join()
        .map_err(|_| engine::Error::WorkerPanicked)??;

    println!("Preview saved to {}", display_path(&output));
    if open {
        // The clip is already saved, so a missing viewer only warns
        if let Err(e) = viewer_command(&output).spawn() {
            warn!("Could not open {}: {}", output.display(), e);
        }
    }
    Ok(())
}

/// Command that hands a file to the platform's default viewer
fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn handle_init_config() {
    if Config::exists() {
        match Config::load() {
            Ok(cfg) => {
                match Config::config_path() {
                    Ok(path) => println!("Config loaded successfully from {}", path.display()),
                    Err(e) => println!("Config loaded, but config path unknown: {:#}", e),
                }
                println!("{:#?}", cfg);
                return;
            }
            Err(e) => {
                eprintln!("Config invalid: {:#}", e);
                process::exit(1);
            }
        }
    }

    println!("Creating default config...");
    if let Err(err) = Config::ensure_default() {
        eprintln!("Failed to save default config: {:#}", err);
        process::exit(1);
    }
    match Config::config_path() {
        Ok(path) => println!("Default config saved to {}", path.display()),
        Err(e) => println!("Default config saved (path unknown): {:#}", e),
    }
}
