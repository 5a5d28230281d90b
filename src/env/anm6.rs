//! The six-bus environment.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDateTime;

use super::model::{Action, GridModel};
use super::state::GridState;
use super::{Environment, StepOutcome};
use crate::case::{self, CaseTable, OperatingRange};
use crate::config::EnvConfig;
use crate::render::history::{HistoryFrame, RenderHistory};
use crate::render::{RenderError, RenderMode, Renderer};

/// Environment title shown by the visualization layer and stored in saved
/// histories.
const TITLE: &str = "Anm6";

/// The six-bus distribution-network environment.
///
/// Owns the built-in case (see [`crate::case::anm6`]), a simulation clock,
/// a pluggable state source, and the rendering lifecycle. The observation is
/// the flattened P and Q of all seven devices plus the DES state of charge
/// (15-dimensional).
pub struct Anm6<M: GridModel> {
    case: CaseTable,
    range: OperatingRange,
    model: M,
    state: GridState,
    time: NaiveDateTime,
    episode_start: NaiveDateTime,
    timestep: chrono::Duration,
    sleep: Duration,
    port: u16,
    renderer: Option<Renderer>,
}

impl<M: GridModel> Anm6<M> {
    /// Creates the environment with the given state source and configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config` does not validate; call [`EnvConfig::validate`]
    /// first when the configuration comes from user input.
    pub fn new(mut model: M, config: &EnvConfig) -> Self {
        let errors = config.validate();
        assert!(errors.is_empty(), "invalid config: {errors:?}");

        let case = case::anm6();
        let range = OperatingRange::from_case(&case);
        let state = model.initial_state();
        let episode_start = config
            .episode_start()
            .expect("validated config has a parseable episode_start");

        Self {
            case,
            range,
            model,
            state,
            time: episode_start,
            episode_start,
            timestep: chrono::Duration::minutes(i64::from(config.env.timestep_minutes)),
            sleep: Duration::from_secs_f64(config.render.sleep_time_s),
            port: config.render.port,
            renderer: None,
        }
    }

    /// The network case tables.
    pub fn case(&self) -> &CaseTable {
        &self.case
    }

    /// The derived operating ranges.
    pub fn operating_range(&self) -> &OperatingRange {
        &self.range
    }

    /// Current simulation timestamp.
    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    /// The fixed rendering mode, once rendering has started.
    pub fn render_mode(&self) -> Option<RenderMode> {
        self.renderer.as_ref().map(Renderer::mode)
    }

    /// Address of the visualization backend, when live and bound.
    pub fn vis_address(&self) -> Option<std::net::SocketAddr> {
        self.renderer.as_ref().and_then(Renderer::address)
    }

    /// The frame describing the state preceding the current step.
    fn current_frame(&self) -> HistoryFrame {
        HistoryFrame {
            time: self.time - self.timestep,
            state_values: self.state.rendered_values(),
            potential: self.state.p_potential.clone(),
            costs: self.state.costs(),
        }
    }

    fn update_render(&mut self, frame: HistoryFrame, sleep: Duration) -> Result<(), RenderError> {
        let renderer = self.renderer.as_mut().ok_or(RenderError::NotInitialized)?;
        renderer.update(frame, sleep)
    }
}

impl<M: GridModel> Environment for Anm6<M> {
    fn reset(&mut self) -> Vec<f64> {
        self.time = self.episode_start;
        self.state = self.model.initial_state();
        self.state.observation()
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        self.state = self.model.next_state(action);
        self.time += self.timestep;
        StepOutcome {
            observation: self.state.observation(),
            e_loss: self.state.e_loss,
            penalty: self.state.penalty,
            done: false,
        }
    }

    fn render(&mut self, mode: RenderMode) -> Result<(), RenderError> {
        if self.renderer.is_none() {
            self.renderer = Some(Renderer::start(
                mode,
                TITLE,
                self.range.rendered(),
                self.port,
            )?);
            // Hold the initial image a moment before the episode starts
            // moving.
            let frame = self.current_frame();
            let initial_pause = if mode.is_live() {
                Duration::from_secs(1)
            } else {
                Duration::ZERO
            };
            return self.update_render(frame, initial_pause);
        }

        let frame = self.current_frame();
        self.update_render(frame, self.sleep)
    }

    fn replay(&mut self, path: &Path) -> Result<(), RenderError> {
        self.reset();
        let RenderHistory {
            title,
            specs,
            frames,
        } = RenderHistory::load(path)?;
        let range = OperatingRange::from_rendered(specs);

        // Replay always re-initializes rendering from the stored specs,
        // discarding any renderer already running.
        self.renderer = Some(Renderer::start(
            RenderMode::Replay,
            &title,
            range.rendered(),
            self.port,
        )?);
        for frame in frames {
            self.update_render(frame, self.sleep)?;
        }
        self.close(None)?;
        Ok(())
    }

    fn close(&mut self, path: Option<&Path>) -> Result<Option<RenderHistory>, RenderError> {
        match self.renderer.take() {
            Some(renderer) => renderer.close(path),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::TraceModel;

    fn quiet_config() -> EnvConfig {
        let mut config = EnvConfig::default();
        config.render.sleep_time_s = 0.0;
        config
    }

    fn make_env() -> Anm6<TraceModel> {
        let config = quiet_config();
        let model = TraceModel::new(&case::anm6(), config.env.timestep_minutes, config.env.seed);
        Anm6::new(model, &config)
    }

    #[test]
    fn reset_returns_fifteen_dimensional_observation() {
        let mut env = make_env();
        let obs = env.reset();
        assert_eq!(obs.len(), 15);
    }

    #[test]
    fn reset_is_reproducible() {
        let mut env = make_env();
        let first = env.reset();
        let action = Action::zeros(env.case());
        for _ in 0..5 {
            env.step(&action);
        }
        assert_eq!(env.reset(), first);
    }

    #[test]
    fn step_advances_the_clock() {
        let mut env = make_env();
        env.reset();
        let t0 = env.time();
        let action = Action::zeros(env.case());
        env.step(&action);
        assert_eq!(env.time() - t0, chrono::Duration::minutes(15));
    }

    #[test]
    fn first_render_fixes_the_mode() {
        let mut env = make_env();
        env.reset();
        assert_eq!(env.render_mode(), None);
        env.render(RenderMode::Save).unwrap();
        assert_eq!(env.render_mode(), Some(RenderMode::Save));

        // Later calls follow the established mode regardless of the argument.
        env.render(RenderMode::Human).unwrap();
        assert_eq!(env.render_mode(), Some(RenderMode::Save));
    }

    #[test]
    fn save_mode_records_one_frame_per_render_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.csv");

        let mut env = make_env();
        env.reset();
        let action = Action::zeros(env.case());
        env.render(RenderMode::Save).unwrap();
        for _ in 0..4 {
            env.step(&action);
            env.render(RenderMode::Save).unwrap();
        }

        let history = env.close(Some(&path)).unwrap().unwrap();
        // Initial frame plus one per step.
        assert_eq!(history.frames.len(), 5);
        assert!(path.exists());
    }

    #[test]
    fn save_mode_close_without_path_is_a_value_error() {
        let mut env = make_env();
        env.reset();
        env.render(RenderMode::Save).unwrap();
        match env.close(None) {
            Err(RenderError::MissingPath) => {}
            other => panic!("expected MissingPath, got {other:?}"),
        }
    }

    #[test]
    fn close_without_rendering_is_a_no_op() {
        let mut env = make_env();
        env.reset();
        assert!(env.close(None).unwrap().is_none());
    }

    #[test]
    fn close_clears_the_mode_for_a_new_episode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.csv");

        let mut env = make_env();
        env.reset();
        env.render(RenderMode::Save).unwrap();
        env.close(Some(&path)).unwrap();

        assert_eq!(env.render_mode(), None);
        env.render(RenderMode::Save).unwrap();
        assert_eq!(env.render_mode(), Some(RenderMode::Save));
    }

    #[test]
    fn saved_frames_carry_the_preceding_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.csv");

        let mut env = make_env();
        env.reset();
        let start = env.time();
        env.render(RenderMode::Save).unwrap();
        let history = env.close(Some(&path)).unwrap().unwrap();
        assert_eq!(history.frames[0].time, start - chrono::Duration::minutes(15));
    }

    #[test]
    fn replay_round_trips_a_saved_episode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.csv");

        let mut env = make_env();
        env.reset();
        let action = Action::zeros(env.case());
        env.render(RenderMode::Save).unwrap();
        for _ in 0..3 {
            env.step(&action);
            env.render(RenderMode::Save).unwrap();
        }
        let saved = env.close(Some(&path)).unwrap().unwrap();

        // Replay loads the same frames and drives them through the live
        // path; with the headless backend this must succeed end to end.
        env.replay(&path).unwrap();
        assert_eq!(env.render_mode(), None, "replay closes when done");

        let loaded = RenderHistory::load(&path).unwrap();
        assert_eq!(loaded, saved);
    }
}
