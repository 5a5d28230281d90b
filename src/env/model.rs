//! The state-source seam of the environment.
//!
//! Network dynamics (power flow, device physics, the decision-process
//! transition) live behind the [`GridModel`] trait so they can be supplied by
//! the caller. The bundled [`TraceModel`] is a scripted, seeded data source —
//! daily load shapes, daylight-windowed and gusty VRE potentials, and a
//! storage unit cycling against its energy bounds — good enough to drive the
//! rendering and persistence paths deterministically in demos and tests.

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::state::GridState;
use crate::case::CaseTable;
use crate::constants::{DevCol, DeviceKind};

/// An agent action: one setpoint per controllable quantity (curtailment
/// limit for each VRE, then real and reactive setpoints for each storage
/// unit).
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Setpoint values, [`Action::dim`] long.
    pub setpoints: Vec<f64>,
}

impl Action {
    /// Action dimension for a case: one curtailment limit per VRE plus P and
    /// Q for each storage unit.
    pub fn dim(case: &CaseTable) -> usize {
        case.n_vre() + 2 * case.n_storage()
    }

    /// The all-zero action for a case.
    pub fn zeros(case: &CaseTable) -> Self {
        Self {
            setpoints: vec![0.0; Self::dim(case)],
        }
    }
}

/// Produces the electrical state of the network, one snapshot per step.
pub trait GridModel {
    /// Rewinds the source and returns the state at the start of an episode.
    fn initial_state(&mut self) -> GridState;

    /// Advances one step and returns the new state.
    fn next_state(&mut self, action: &Action) -> GridState;
}

#[derive(Debug, Clone)]
struct DeviceSpec {
    kind: DeviceKind,
    pmin: f64,
    pmax: f64,
    qp_ratio: f64,
    soc_max: f64,
    eff: f64,
}

/// Scripted state source with reproducible noise.
///
/// Ignores the action by construction: curtailment and storage dispatch are
/// part of the excluded dynamics, and this source exists to exercise the
/// rendering, persistence, and interface plumbing.
#[derive(Debug, Clone)]
pub struct TraceModel {
    devices: Vec<DeviceSpec>,
    dt_hours: f64,
    seed: u64,
    rng: StdRng,
    t: usize,
    soc: Vec<f64>,
}

impl TraceModel {
    /// Builds a trace source for a case.
    ///
    /// # Arguments
    ///
    /// * `case` - The network the traces are shaped for
    /// * `timestep_minutes` - Interval between steps (must be > 0)
    /// * `seed` - Seed for the noise generator
    ///
    /// # Panics
    ///
    /// Panics if `timestep_minutes` is zero.
    pub fn new(case: &CaseTable, timestep_minutes: u32, seed: u64) -> Self {
        assert!(timestep_minutes > 0, "timestep_minutes must be > 0");
        let devices = (0..case.n_dev())
            .map(|i| DeviceSpec {
                kind: case.device_kind(i).unwrap_or(DeviceKind::Load),
                pmin: case.dev(i, DevCol::Pmin),
                pmax: case.dev(i, DevCol::Pmax),
                qp_ratio: case.dev(i, DevCol::QpRatio),
                soc_max: case.dev(i, DevCol::SocMax),
                eff: case.dev(i, DevCol::Eff),
            })
            .collect();

        let mut model = Self {
            devices,
            dt_hours: f64::from(timestep_minutes) / 60.0,
            seed,
            rng: StdRng::seed_from_u64(seed),
            t: 0,
            soc: Vec::new(),
        };
        model.rewind();
        model
    }

    fn rewind(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.t = 0;
        self.soc = self
            .devices
            .iter()
            .filter(|d| d.kind == DeviceKind::Storage)
            .map(|d| d.soc_max / 2.0)
            .collect();
    }

    /// Standard normal draw via Box-Muller.
    fn gaussian(&mut self) -> f64 {
        let u1: f64 = self.rng.random::<f64>().clamp(1e-12, 1.0);
        let u2: f64 = self.rng.random::<f64>();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    fn state_at_current_step(&mut self) -> GridState {
        let hour = (self.t as f64 * self.dt_hours) % 24.0;
        let day_angle = std::f64::consts::TAU * hour / 24.0;

        let n_dev = self.devices.len();
        let mut p_dev = vec![0.0; n_dev];
        let mut q_dev = vec![0.0; n_dev];
        let mut p_potential = Vec::new();
        let mut soc_out = Vec::new();

        let mut slack_index = None;
        let mut slack_pmax = 0.0;
        let mut storage_index = 0usize;

        let devices = self.devices.clone();
        for (i, dev) in devices.iter().enumerate() {
            match dev.kind {
                DeviceKind::Slack => {
                    slack_index = Some(i);
                    slack_pmax = dev.pmax;
                }
                DeviceKind::Load => {
                    // Evening-peaked daily shape; consumption is a negative
                    // injection bounded by PMIN.
                    let depth = dev.pmin.abs();
                    let base = 0.25 * depth;
                    let amp = 0.15 * depth;
                    let noise = 0.02 * depth * self.gaussian();
                    let phase = i as f64 * 0.7;
                    let p = -(base + amp * (day_angle - 2.0 + phase).sin().max(0.0) + noise)
                        .clamp(0.0, depth);
                    p_dev[i] = p;
                    q_dev[i] = p * dev.qp_ratio;
                }
                DeviceKind::Generator | DeviceKind::Renewable => {
                    // Daylight-windowed envelope with multiplicative gusts.
                    let envelope = (day_angle - std::f64::consts::FRAC_PI_2).cos().max(0.0);
                    let gust = (1.0 + 0.2 * self.gaussian()).clamp(0.0, 1.5);
                    let potential = (dev.pmax * envelope * gust).clamp(0.0, dev.pmax);
                    p_potential.push(potential);
                    p_dev[i] = potential;
                    q_dev[i] = 0.0;
                }
                DeviceKind::Storage => {
                    // Charge at night, discharge during the day, limited by
                    // the energy bounds and efficiency.
                    let setpoint = 0.3 * dev.pmax * day_angle.sin();
                    let soc = &mut self.soc[storage_index];
                    let p = if setpoint >= 0.0 {
                        // Discharging (positive injection).
                        let available = *soc * dev.eff / self.dt_hours;
                        let p = setpoint.min(available).min(dev.pmax);
                        *soc = (*soc - p * self.dt_hours / dev.eff).max(0.0);
                        p
                    } else {
                        // Charging (negative injection).
                        let headroom = (dev.soc_max - *soc) / (dev.eff * self.dt_hours);
                        let p = setpoint.max(-headroom).max(dev.pmin);
                        *soc = (*soc - p * self.dt_hours * dev.eff).min(dev.soc_max);
                        p
                    };
                    p_dev[i] = p;
                    q_dev[i] = 0.0;
                    soc_out.push(*soc);
                    storage_index += 1;
                }
            }
        }

        // The slack device balances the network; losses are taken as a
        // fixed fraction of the transported power.
        let net: f64 = p_dev.iter().sum();
        let transported: f64 = p_dev.iter().map(|p| p.abs()).sum::<f64>() / 2.0;
        let loss_power = 0.02 * transported;
        let e_loss = loss_power * self.dt_hours;
        if let Some(slack) = slack_index {
            p_dev[slack] = -net + loss_power;
        }

        // Penalize operation close to the slack capability.
        let penalty = slack_index
            .map(|slack| (p_dev[slack].abs() - 0.8 * slack_pmax).max(0.0) * 10.0)
            .unwrap_or(0.0);

        GridState {
            p_dev,
            q_dev,
            soc: soc_out,
            p_potential,
            e_loss,
            penalty,
        }
    }
}

impl GridModel for TraceModel {
    fn initial_state(&mut self) -> GridState {
        self.rewind();
        self.state_at_current_step()
    }

    fn next_state(&mut self, _action: &Action) -> GridState {
        self.t += 1;
        self.state_at_current_step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::anm6;

    #[test]
    fn action_dim_matches_case() {
        let case = anm6();
        // Two VREs plus P and Q for the single storage unit.
        assert_eq!(Action::dim(&case), 4);
        assert_eq!(Action::zeros(&case).setpoints.len(), 4);
    }

    #[test]
    fn state_dimensions_match_case() {
        let case = anm6();
        let mut model = TraceModel::new(&case, 15, 42);
        let state = model.initial_state();
        assert_eq!(state.p_dev.len(), case.n_dev());
        assert_eq!(state.q_dev.len(), case.n_dev());
        assert_eq!(state.soc.len(), case.n_storage());
        assert_eq!(state.p_potential.len(), case.n_vre());
    }

    #[test]
    fn same_seed_same_trace() {
        let case = anm6();
        let mut a = TraceModel::new(&case, 15, 7);
        let mut b = TraceModel::new(&case, 15, 7);
        let action = Action::zeros(&case);
        assert_eq!(a.initial_state(), b.initial_state());
        for _ in 0..20 {
            assert_eq!(a.next_state(&action), b.next_state(&action));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let case = anm6();
        let mut a = TraceModel::new(&case, 15, 1);
        let mut b = TraceModel::new(&case, 15, 2);
        assert_ne!(a.initial_state(), b.initial_state());
    }

    #[test]
    fn initial_state_rewinds() {
        let case = anm6();
        let mut model = TraceModel::new(&case, 15, 42);
        let first = model.initial_state();
        let action = Action::zeros(&case);
        for _ in 0..10 {
            model.next_state(&action);
        }
        assert_eq!(model.initial_state(), first);
    }

    #[test]
    fn soc_stays_within_bounds() {
        let case = anm6();
        let mut model = TraceModel::new(&case, 15, 3);
        let action = Action::zeros(&case);
        model.initial_state();
        for _ in 0..400 {
            let state = model.next_state(&action);
            for &soc in &state.soc {
                assert!((0.0..=100.0).contains(&soc), "soc out of bounds: {soc}");
            }
        }
    }

    #[test]
    fn potentials_respect_capability() {
        let case = anm6();
        let mut model = TraceModel::new(&case, 15, 4);
        let action = Action::zeros(&case);
        model.initial_state();
        for _ in 0..200 {
            let state = model.next_state(&action);
            // PV capability is 30 MW, wind 50 MW.
            assert!(state.p_potential[0] <= 30.0 + 1e-9);
            assert!(state.p_potential[1] <= 50.0 + 1e-9);
            assert!(state.p_potential.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn loads_are_negative_injections() {
        let case = anm6();
        let mut model = TraceModel::new(&case, 15, 5);
        let state = model.initial_state();
        // Devices 1, 3, 5 are the house, factory, and EV loads.
        for i in [1, 3, 5] {
            assert!(state.p_dev[i] <= 0.0);
        }
    }
}
