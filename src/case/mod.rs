//! Power-flow case tables and derived operating ranges.

mod anm6;

pub use anm6::anm6;

use std::fmt;

use crate::constants::{BranchCol, BusCol, DevCol, DeviceKind, RENDERED_SPECS, SpecKey};

/// A validation failure naming the offending table, row, and constraint.
#[derive(Debug)]
pub struct CaseError {
    /// Table and row, e.g. `"dev[3]"`.
    pub location: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case error: {} — {}", self.location, self.message)
    }
}

impl std::error::Error for CaseError {}

/// Row-major numeric tables describing a distribution network.
///
/// Rows are indexed through the column enums in [`crate::constants`], keeping
/// the tabular layout of the case format while making field access checkable.
#[derive(Debug, Clone)]
pub struct CaseTable {
    /// Per-unit power base (MVA).
    pub base_mva: f64,
    bus: Vec<Vec<f64>>,
    dev: Vec<Vec<f64>>,
    branch: Vec<Vec<f64>>,
}

impl CaseTable {
    /// Assembles a case from raw rows.
    ///
    /// # Arguments
    ///
    /// * `base_mva` - Per-unit power base (MVA)
    /// * `bus` - Bus rows, [`BusCol::COUNT`] wide
    /// * `dev` - Device rows, [`DevCol::COUNT`] wide
    /// * `branch` - Branch rows, [`BranchCol::COUNT`] wide
    pub fn new(
        base_mva: f64,
        bus: Vec<Vec<f64>>,
        dev: Vec<Vec<f64>>,
        branch: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            base_mva,
            bus,
            dev,
            branch,
        }
    }

    /// Number of buses.
    pub fn n_bus(&self) -> usize {
        self.bus.len()
    }

    /// Number of devices.
    pub fn n_dev(&self) -> usize {
        self.dev.len()
    }

    /// Number of branches.
    pub fn n_branch(&self) -> usize {
        self.branch.len()
    }

    /// Number of storage devices.
    pub fn n_storage(&self) -> usize {
        (0..self.n_dev())
            .filter(|&i| self.device_kind(i) == Some(DeviceKind::Storage))
            .count()
    }

    /// Number of variable renewable devices.
    pub fn n_vre(&self) -> usize {
        (0..self.n_dev())
            .filter(|&i| self.device_kind(i) == Some(DeviceKind::Renewable))
            .count()
    }

    /// Reads one bus field.
    pub fn bus(&self, row: usize, col: BusCol) -> f64 {
        self.bus[row][col.index()]
    }

    /// Reads one device field.
    pub fn dev(&self, row: usize, col: DevCol) -> f64 {
        self.dev[row][col.index()]
    }

    /// Reads one branch field.
    pub fn branch(&self, row: usize, col: BranchCol) -> f64 {
        self.branch[row][col.index()]
    }

    /// Decoded device type of one device row.
    pub fn device_kind(&self, row: usize) -> Option<DeviceKind> {
        DeviceKind::from_code(self.dev(row, DevCol::DevType))
    }

    /// Checks structural and range constraints on all three tables.
    ///
    /// Returns an empty vector if the case is well formed.
    pub fn validate(&self) -> Vec<CaseError> {
        let mut errors = Vec::new();

        for (i, row) in self.bus.iter().enumerate() {
            if row.len() != BusCol::COUNT {
                errors.push(CaseError {
                    location: format!("bus[{i}]"),
                    message: format!("expected {} columns, got {}", BusCol::COUNT, row.len()),
                });
            }
        }
        for (i, row) in self.dev.iter().enumerate() {
            if row.len() != DevCol::COUNT {
                errors.push(CaseError {
                    location: format!("dev[{i}]"),
                    message: format!("expected {} columns, got {}", DevCol::COUNT, row.len()),
                });
            }
        }
        for (i, row) in self.branch.iter().enumerate() {
            if row.len() != BranchCol::COUNT {
                errors.push(CaseError {
                    location: format!("branch[{i}]"),
                    message: format!("expected {} columns, got {}", BranchCol::COUNT, row.len()),
                });
            }
        }
        // Row-width failures make field reads unreliable; stop here.
        if !errors.is_empty() {
            return errors;
        }

        let mut bus_ids: Vec<i64> = Vec::with_capacity(self.n_bus());
        for i in 0..self.n_bus() {
            let id = self.bus(i, BusCol::BusI) as i64;
            if bus_ids.contains(&id) {
                errors.push(CaseError {
                    location: format!("bus[{i}]"),
                    message: format!("duplicate bus id {id}"),
                });
            }
            bus_ids.push(id);
            if self.bus(i, BusCol::Vmin) > self.bus(i, BusCol::Vmax) {
                errors.push(CaseError {
                    location: format!("bus[{i}]"),
                    message: "VMIN must be <= VMAX".into(),
                });
            }
        }

        let mut slack_count = 0usize;
        for i in 0..self.n_dev() {
            let host = self.dev(i, DevCol::BusI) as i64;
            if !bus_ids.contains(&host) {
                errors.push(CaseError {
                    location: format!("dev[{i}]"),
                    message: format!("host bus {host} is not in the bus table"),
                });
            }
            match self.device_kind(i) {
                Some(DeviceKind::Slack) => slack_count += 1,
                Some(_) => {}
                None => errors.push(CaseError {
                    location: format!("dev[{i}]"),
                    message: format!(
                        "unknown device type code {}",
                        self.dev(i, DevCol::DevType)
                    ),
                }),
            }
            if self.dev(i, DevCol::Pmin) > self.dev(i, DevCol::Pmax) {
                errors.push(CaseError {
                    location: format!("dev[{i}]"),
                    message: "PMIN must be <= PMAX".into(),
                });
            }
            if self.dev(i, DevCol::Qmin) > self.dev(i, DevCol::Qmax) {
                errors.push(CaseError {
                    location: format!("dev[{i}]"),
                    message: "QMIN must be <= QMAX".into(),
                });
            }
            if self.dev(i, DevCol::SocMax) < 0.0 {
                errors.push(CaseError {
                    location: format!("dev[{i}]"),
                    message: "SOC_MAX must be >= 0".into(),
                });
            }
            let eff = self.dev(i, DevCol::Eff);
            if !(eff > 0.0 && eff <= 1.0) {
                errors.push(CaseError {
                    location: format!("dev[{i}]"),
                    message: format!("EFF must be in (0, 1], got {eff}"),
                });
            }
        }
        if slack_count != 1 {
            errors.push(CaseError {
                location: "dev".into(),
                message: format!("expected exactly one slack device, found {slack_count}"),
            });
        }

        for i in 0..self.n_branch() {
            for col in [BranchCol::FBus, BranchCol::TBus] {
                let end = self.branch(i, col) as i64;
                if !bus_ids.contains(&end) {
                    errors.push(CaseError {
                        location: format!("branch[{i}]"),
                        message: format!("{} endpoint {end} is not in the bus table", col.name()),
                    });
                }
            }
            if self.branch(i, BranchCol::AngMin) > self.branch(i, BranchCol::AngMax) {
                errors.push(CaseError {
                    location: format!("branch[{i}]"),
                    message: "ANGMIN must be <= ANGMAX".into(),
                });
            }
        }

        errors
    }
}

/// Operating ranges of the network, one bound vector per [`SpecKey`].
///
/// Derived from a [`CaseTable`]; the rendered subset of these rows is what the
/// visualization layer receives at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingRange {
    rows: Vec<Vec<f64>>,
}

impl OperatingRange {
    /// Derives all operating-range vectors from a case.
    pub fn from_case(case: &CaseTable) -> Self {
        let mut rows = vec![Vec::new(); SpecKey::COUNT];

        let mut vmin_bus = Vec::with_capacity(case.n_bus());
        let mut vmax_bus = Vec::with_capacity(case.n_bus());
        for i in 0..case.n_bus() {
            vmin_bus.push(case.bus(i, BusCol::Vmin));
            vmax_bus.push(case.bus(i, BusCol::Vmax));
        }

        // Bus P/Q envelopes: sum of the in-service device bounds at each bus.
        let n_bus = case.n_bus();
        let mut pmin_bus = vec![0.0; n_bus];
        let mut pmax_bus = vec![0.0; n_bus];
        let mut qmin_bus = vec![0.0; n_bus];
        let mut qmax_bus = vec![0.0; n_bus];

        let mut pmin_dev = Vec::with_capacity(case.n_dev());
        let mut pmax_dev = Vec::with_capacity(case.n_dev());
        let mut qmin_dev = Vec::with_capacity(case.n_dev());
        let mut qmax_dev = Vec::with_capacity(case.n_dev());
        let mut dev_type = Vec::with_capacity(case.n_dev());
        let mut soc_min = Vec::new();
        let mut soc_max = Vec::new();

        for i in 0..case.n_dev() {
            let host = case.dev(i, DevCol::BusI) as usize;
            let status = case.dev(i, DevCol::DevStatus);
            let (pmin, pmax) = (case.dev(i, DevCol::Pmin), case.dev(i, DevCol::Pmax));
            let (qmin, qmax) = (case.dev(i, DevCol::Qmin), case.dev(i, DevCol::Qmax));

            pmin_dev.push(pmin);
            pmax_dev.push(pmax);
            qmin_dev.push(qmin);
            qmax_dev.push(qmax);
            dev_type.push(case.dev(i, DevCol::DevType));

            if status != 0.0 && host < n_bus {
                pmin_bus[host] += pmin;
                pmax_bus[host] += pmax;
                qmin_bus[host] += qmin;
                qmax_bus[host] += qmax;
            }

            if case.device_kind(i) == Some(DeviceKind::Storage) {
                soc_min.push(0.0);
                soc_max.push(case.dev(i, DevCol::SocMax));
            }
        }

        let mut imax_br = Vec::with_capacity(case.n_branch());
        for i in 0..case.n_branch() {
            // Thermal rating in per-unit current at nominal voltage.
            imax_br.push(case.branch(i, BranchCol::RateA) / case.base_mva);
        }

        rows[SpecKey::PminBus.index()] = pmin_bus;
        rows[SpecKey::PmaxBus.index()] = pmax_bus;
        rows[SpecKey::QminBus.index()] = qmin_bus;
        rows[SpecKey::QmaxBus.index()] = qmax_bus;
        rows[SpecKey::VminBus.index()] = vmin_bus;
        rows[SpecKey::VmaxBus.index()] = vmax_bus;
        rows[SpecKey::PminDev.index()] = pmin_dev;
        rows[SpecKey::PmaxDev.index()] = pmax_dev;
        rows[SpecKey::QminDev.index()] = qmin_dev;
        rows[SpecKey::QmaxDev.index()] = qmax_dev;
        rows[SpecKey::DevType.index()] = dev_type;
        rows[SpecKey::ImaxBr.index()] = imax_br;
        rows[SpecKey::SocMin.index()] = soc_min;
        rows[SpecKey::SocMax.index()] = soc_max;

        Self { rows }
    }

    /// Rebuilds an operating range from previously rendered rows.
    ///
    /// Only the [`RENDERED_SPECS`] rows are populated; the rest stay empty.
    /// Used when replaying a saved history, which stores exactly that subset.
    pub fn from_rendered(rendered: Vec<Vec<f64>>) -> Self {
        let mut rows = vec![Vec::new(); SpecKey::COUNT];
        for (key, row) in RENDERED_SPECS.iter().zip(rendered) {
            rows[key.index()] = row;
        }
        Self { rows }
    }

    /// The bound vector for one key.
    pub fn get(&self, key: SpecKey) -> &[f64] {
        &self.rows[key.index()]
    }

    /// The rendered rows, in [`RENDERED_SPECS`] order.
    pub fn rendered(&self) -> Vec<Vec<f64>> {
        RENDERED_SPECS
            .iter()
            .map(|key| self.rows[key.index()].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_case() -> CaseTable {
        // One slack bus, one load bus, one branch, slack gen + load.
        let bus = vec![
            vec![0.0, 3.0, 0.0, 0.0, 1.05, 0.95],
            vec![1.0, 1.0, 0.0, 0.0, 1.05, 0.95],
        ];
        let dev = vec![
            vec![
                0.0, 0.0, 0.0, 30.0, -30.0, 1.0, 50.0, -50.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                1.0,
            ],
            vec![
                1.0, -1.0, 0.3, 0.0, 0.0, 1.0, 0.0, -10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
            ],
        ];
        let branch = vec![vec![
            0.0, 1.0, 0.01, 0.03, 0.0, 25.0, 0.0, 0.0, 1.0, -180.0, 180.0,
        ]];
        CaseTable::new(100.0, bus, dev, branch)
    }

    #[test]
    fn tiny_case_is_valid() {
        let errors = tiny_case().validate();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn wrong_row_width_is_reported() {
        let mut case = tiny_case();
        case.bus[0].pop();
        let errors = case.validate();
        assert!(errors.iter().any(|e| e.location == "bus[0]"));
    }

    #[test]
    fn duplicate_bus_id_is_reported() {
        let mut case = tiny_case();
        case.bus[1][BusCol::BusI.index()] = 0.0;
        let errors = case.validate();
        assert!(errors.iter().any(|e| e.message.contains("duplicate bus id")));
    }

    #[test]
    fn unknown_host_bus_is_reported() {
        let mut case = tiny_case();
        case.dev[1][DevCol::BusI.index()] = 9.0;
        let errors = case.validate();
        assert!(errors.iter().any(|e| e.location == "dev[1]"));
    }

    #[test]
    fn missing_slack_is_reported() {
        let mut case = tiny_case();
        case.dev[0][DevCol::DevType.index()] = 1.0;
        let errors = case.validate();
        assert!(errors.iter().any(|e| e.message.contains("slack")));
    }

    #[test]
    fn inverted_bounds_are_reported() {
        let mut case = tiny_case();
        case.dev[0][DevCol::Pmin.index()] = 60.0;
        let errors = case.validate();
        assert!(errors.iter().any(|e| e.message.contains("PMIN")));
    }

    #[test]
    fn bad_efficiency_is_reported() {
        let mut case = tiny_case();
        case.dev[0][DevCol::Eff.index()] = 1.5;
        let errors = case.validate();
        assert!(errors.iter().any(|e| e.message.contains("EFF")));
    }

    #[test]
    fn operating_range_covers_all_keys() {
        let case = tiny_case();
        let range = OperatingRange::from_case(&case);
        assert_eq!(range.get(SpecKey::PminDev).len(), case.n_dev());
        assert_eq!(range.get(SpecKey::VminBus).len(), case.n_bus());
        assert_eq!(range.get(SpecKey::ImaxBr).len(), case.n_branch());
        assert_eq!(range.get(SpecKey::SocMax).len(), case.n_storage());
    }

    #[test]
    fn bus_envelope_sums_device_bounds() {
        let case = tiny_case();
        let range = OperatingRange::from_case(&case);
        assert_eq!(range.get(SpecKey::PmaxBus)[0], 50.0);
        assert_eq!(range.get(SpecKey::PminBus)[1], -10.0);
    }

    #[test]
    fn rendered_round_trips_through_from_rendered() {
        let case = tiny_case();
        let range = OperatingRange::from_case(&case);
        let rebuilt = OperatingRange::from_rendered(range.rendered());
        assert_eq!(rebuilt.rendered(), range.rendered());
    }
}
