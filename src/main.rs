//! Environment entry point — CLI wiring and a config-driven episode runner.

use std::path::{Path, PathBuf};
use std::process;

use anm_sim::case;
use anm_sim::config::EnvConfig;
use anm_sim::env::{Action, Anm6, Environment, TraceModel};
use anm_sim::render::RenderMode;
use anm_sim::render::summary::HistorySummary;

/// Steps in one day at the default 15-minute cadence.
const DEFAULT_STEPS: usize = 96;

/// Parsed CLI arguments.
struct CliArgs {
    mode: RenderMode,
    history: Option<PathBuf>,
    steps: usize,
    config_path: Option<PathBuf>,
    seed_override: Option<u64>,
    sleep_override: Option<f64>,
    summary: bool,
}

fn print_help() {
    eprintln!("anm-sim — six-bus active-network-management environment");
    eprintln!();
    eprintln!("Usage: anm-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --mode <human|replay|save>   Rendering mode (default: save)");
    eprintln!("  --history <path>             History file to write (save) or read (replay)");
    eprintln!("  --steps <n>                  Episode length in steps (default: {DEFAULT_STEPS})");
    eprintln!("  --config <path>              Load environment config from TOML file");
    eprintln!("  --seed <u64>                 Override the random seed");
    eprintln!("  --sleep <seconds>            Override the pause between rendered frames");
    eprintln!("  --summary                    Print an episode summary from the history");
    eprintln!("  --help                       Show this help message");
    eprintln!();
    eprintln!("Save mode requires --history; replay mode reads the file it names.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        mode: RenderMode::Save,
        history: None,
        steps: DEFAULT_STEPS,
        config_path: None,
        seed_override: None,
        sleep_override: None,
        summary: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--mode" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --mode requires a value (human, replay, or save)");
                    process::exit(1);
                }
                match args[i].parse::<RenderMode>() {
                    Ok(mode) => cli.mode = mode,
                    Err(e) => {
                        eprintln!("error: {e}");
                        process::exit(1);
                    }
                }
            }
            "--history" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --history requires a path argument");
                    process::exit(1);
                }
                cli.history = Some(PathBuf::from(&args[i]));
            }
            "--steps" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --steps requires a number");
                    process::exit(1);
                }
                if let Ok(n) = args[i].parse::<usize>() {
                    cli.steps = n;
                } else {
                    eprintln!("error: --steps value \"{}\" is not a valid number", args[i]);
                    process::exit(1);
                }
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(PathBuf::from(&args[i]));
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--sleep" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --sleep requires a number of seconds");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<f64>() {
                    cli.sleep_override = Some(s);
                } else {
                    eprintln!("error: --sleep value \"{}\" is not a valid number", args[i]);
                    process::exit(1);
                }
            }
            "--summary" => {
                cli.summary = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Runs one scripted episode, rendering every step in the chosen mode.
fn run_episode(
    env: &mut Anm6<TraceModel>,
    mode: RenderMode,
    steps: usize,
    history: Option<&Path>,
) -> Option<anm_sim::render::history::RenderHistory> {
    env.reset();
    let action = Action::zeros(env.case());

    if let Err(e) = env.render(mode) {
        eprintln!("error: {e}");
        process::exit(1);
    }
    if let Some(addr) = env.vis_address() {
        eprintln!("Visualization at http://{addr}");
    }

    for _ in 0..steps {
        env.step(&action);
        if let Err(e) = env.render(mode) {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }

    match env.close(history) {
        Ok(history) => history,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    let cli = parse_args();

    // Load config: --config takes priority, then the built-in defaults.
    let mut config = if let Some(ref path) = cli.config_path {
        match EnvConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        EnvConfig::default()
    };

    if let Some(seed) = cli.seed_override {
        config.env.seed = seed;
    }
    if let Some(sleep) = cli.sleep_override {
        config.render.sleep_time_s = sleep;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if cli.mode == RenderMode::Save && cli.history.is_none() {
        eprintln!("error: save mode requires --history <path>");
        process::exit(1);
    }

    let model = TraceModel::new(&case::anm6(), config.env.timestep_minutes, config.env.seed);
    let mut env = Anm6::new(model, &config);

    let history = match cli.mode {
        RenderMode::Replay => {
            let Some(ref path) = cli.history else {
                eprintln!("error: replay mode requires --history <path>");
                process::exit(1);
            };
            if let Err(e) = env.replay(path) {
                eprintln!("error: {e}");
                process::exit(1);
            }
            if cli.summary {
                match anm_sim::render::history::RenderHistory::load(path) {
                    Ok(h) => Some(h),
                    Err(e) => {
                        eprintln!("error: {e}");
                        process::exit(1);
                    }
                }
            } else {
                None
            }
        }
        mode => run_episode(&mut env, mode, cli.steps, cli.history.as_deref()),
    };

    if let Some(ref path) = cli.history {
        if cli.mode == RenderMode::Save {
            eprintln!("History written to {}", path.display());
        }
    }

    if cli.summary {
        match history {
            Some(ref h) => println!("{}", HistorySummary::from_history(h)),
            None => eprintln!("note: --summary needs a saved or replayed history; nothing to report"),
        }
    }
}
