//! Shared test fixtures for integration tests.

use std::path::Path;

use anm_sim::case;
use anm_sim::config::EnvConfig;
use anm_sim::env::{Action, Anm6, Environment, TraceModel};
use anm_sim::render::RenderMode;
use anm_sim::render::history::RenderHistory;

/// Default configuration with rendering pauses disabled.
pub fn quiet_config() -> EnvConfig {
    let mut config = EnvConfig::default();
    config.render.sleep_time_s = 0.0;
    config
}

/// Fresh six-bus environment driven by the scripted state source.
pub fn default_env() -> Anm6<TraceModel> {
    env_with_seed(42)
}

/// Fresh six-bus environment with an explicit seed.
pub fn env_with_seed(seed: u64) -> Anm6<TraceModel> {
    let mut config = quiet_config();
    config.env.seed = seed;
    let model = TraceModel::new(&case::anm6(), config.env.timestep_minutes, seed);
    Anm6::new(model, &config)
}

/// Runs `steps` steps in save mode and flushes the history to `path`.
pub fn run_and_save(env: &mut Anm6<TraceModel>, steps: usize, path: &Path) -> RenderHistory {
    env.reset();
    let action = Action::zeros(env.case());
    env.render(RenderMode::Save).expect("save render");
    for _ in 0..steps {
        env.step(&action);
        env.render(RenderMode::Save).expect("save render");
    }
    env.close(Some(path))
        .expect("close")
        .expect("save mode returns the history")
}
