//! Post-hoc aggregation over a saved rendering history.

use std::fmt;

use super::history::RenderHistory;

/// Aggregate figures for one saved episode.
///
/// Computed in a single pass over the frames so the report always matches the
/// persisted record.
#[derive(Debug, Clone)]
pub struct HistorySummary {
    /// Number of rendered frames.
    pub steps: usize,
    /// Sum of the per-step energy losses.
    pub total_energy_loss: f64,
    /// Mean per-step energy loss.
    pub mean_energy_loss: f64,
    /// Sum of the per-step constraint-violation penalties.
    pub total_penalty: f64,
    /// Number of steps with a nonzero penalty.
    pub penalized_steps: usize,
    /// Largest single-VRE generation potential seen (MW).
    pub peak_potential: f64,
}

impl HistorySummary {
    /// Computes the summary from a history.
    pub fn from_history(history: &RenderHistory) -> Self {
        let steps = history.frames.len();
        if steps == 0 {
            return Self {
                steps: 0,
                total_energy_loss: 0.0,
                mean_energy_loss: 0.0,
                total_penalty: 0.0,
                penalized_steps: 0,
                peak_potential: 0.0,
            };
        }

        let mut total_energy_loss = 0.0;
        let mut total_penalty = 0.0;
        let mut penalized_steps = 0usize;
        let mut peak_potential = 0.0_f64;

        for frame in &history.frames {
            let [e_loss, penalty] = frame.costs;
            total_energy_loss += e_loss;
            total_penalty += penalty;
            if penalty > 0.0 {
                penalized_steps += 1;
            }
            for &p in &frame.potential {
                peak_potential = peak_potential.max(p);
            }
        }

        Self {
            steps,
            total_energy_loss,
            mean_energy_loss: total_energy_loss / steps as f64,
            total_penalty,
            penalized_steps,
            peak_potential,
        }
    }
}

impl fmt::Display for HistorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode summary ---")?;
        writeln!(f, "Steps:              {}", self.steps)?;
        writeln!(f, "Total energy loss:  {:.4}", self.total_energy_loss)?;
        writeln!(f, "Mean energy loss:   {:.4}", self.mean_energy_loss)?;
        writeln!(f, "Total penalty:      {:.4}", self.total_penalty)?;
        writeln!(f, "Penalized steps:    {}", self.penalized_steps)?;
        write!(f, "Peak VRE potential: {:.2} MW", self.peak_potential)
    }
}
