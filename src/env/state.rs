//! State snapshots exchanged between the state source, the agent-facing
//! interface, and the renderer.

use crate::constants::{RENDERED_STATE, StateGroup};

/// One snapshot of the electrical state of the network.
///
/// Power values follow the injection convention: positive for generation
/// into the network, negative for consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    /// Real power injection of each device (MW).
    pub p_dev: Vec<f64>,
    /// Reactive power injection of each device (MVAr).
    pub q_dev: Vec<f64>,
    /// State of charge of each storage unit (MWh).
    pub soc: Vec<f64>,
    /// Pre-curtailment generation potential of each VRE (MW).
    pub p_potential: Vec<f64>,
    /// Total energy loss over the step.
    pub e_loss: f64,
    /// Constraint-violation penalty over the step.
    pub penalty: f64,
}

impl GridState {
    /// A zeroed state for a network of the given dimensions.
    pub fn zeros(n_dev: usize, n_storage: usize, n_vre: usize) -> Self {
        Self {
            p_dev: vec![0.0; n_dev],
            q_dev: vec![0.0; n_dev],
            soc: vec![0.0; n_storage],
            p_potential: vec![0.0; n_vre],
            e_loss: 0.0,
            penalty: 0.0,
        }
    }

    /// Flattened observation vector: P of each device, Q of each device,
    /// then the SoC of each storage unit.
    pub fn observation(&self) -> Vec<f64> {
        let mut obs = Vec::with_capacity(self.p_dev.len() + self.q_dev.len() + self.soc.len());
        obs.extend_from_slice(&self.p_dev);
        obs.extend_from_slice(&self.q_dev);
        obs.extend_from_slice(&self.soc);
        obs
    }

    /// The state-value groups pushed to the renderer, in
    /// [`RENDERED_STATE`] order.
    pub fn rendered_values(&self) -> Vec<Vec<f64>> {
        RENDERED_STATE
            .iter()
            .map(|group| match group {
                StateGroup::PDev => self.p_dev.clone(),
                StateGroup::QDev => self.q_dev.clone(),
                StateGroup::Soc => self.soc.clone(),
            })
            .collect()
    }

    /// The cost pair persisted with each rendered frame.
    pub fn costs(&self) -> [f64; 2] {
        [self.e_loss, self.penalty]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GridState {
        GridState {
            p_dev: vec![1.0, -2.0, 3.0],
            q_dev: vec![0.1, -0.2, 0.3],
            soc: vec![40.0],
            p_potential: vec![3.5],
            e_loss: 0.05,
            penalty: 0.0,
        }
    }

    #[test]
    fn observation_flattens_p_q_soc() {
        let obs = sample().observation();
        assert_eq!(obs, vec![1.0, -2.0, 3.0, 0.1, -0.2, 0.3, 40.0]);
    }

    #[test]
    fn six_bus_observation_is_fifteen_dimensional() {
        let state = GridState::zeros(7, 1, 2);
        assert_eq!(state.observation().len(), 15);
    }

    #[test]
    fn rendered_values_follow_group_order() {
        let state = sample();
        let rendered = state.rendered_values();
        assert_eq!(rendered.len(), RENDERED_STATE.len());
        assert_eq!(rendered[0], state.p_dev);
        assert_eq!(rendered[1], state.q_dev);
        assert_eq!(rendered[2], state.soc);
    }

    #[test]
    fn costs_pair_order() {
        assert_eq!(sample().costs(), [0.05, 0.0]);
    }
}
