//! Fixed-width record layouts for the power-flow case format.
//!
//! A case is a set of row-major numeric tables (bus, device, branch). The
//! column enums below pin each field name to a stable positional index into a
//! row, MATPOWER-style. Index assignment is dense (`0..N`) and unique per
//! field list.

/// Bus record columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum BusCol {
    /// Bus number.
    BusI = 0,
    /// Bus type (1 = PQ, 2 = PV, 3 = slack).
    BusType = 1,
    /// Shunt conductance (MW at V = 1.0 p.u.).
    Gs = 2,
    /// Shunt susceptance (MVAr at V = 1.0 p.u.).
    Bs = 3,
    /// Maximum voltage magnitude (p.u.).
    Vmax = 4,
    /// Minimum voltage magnitude (p.u.).
    Vmin = 5,
}

/// Device record columns.
///
/// A device is a generator, load, or storage unit attached to a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum DevCol {
    /// Host bus number.
    BusI = 0,
    /// Device type code (see [`DeviceKind`]).
    DevType = 1,
    /// Fixed Q/P ratio for uncontrollable devices.
    QpRatio = 2,
    /// Maximum reactive power output (MVAr).
    Qmax = 3,
    /// Minimum reactive power output (MVAr).
    Qmin = 4,
    /// Device status, 1 = in service, 0 = out of service.
    DevStatus = 5,
    /// Maximum real power output (MW).
    Pmax = 6,
    /// Minimum real power output (MW).
    Pmin = 7,
    /// Lower real power point of the PQ capability curve (MW).
    Pc1 = 8,
    /// Upper real power point of the PQ capability curve (MW).
    Pc2 = 9,
    /// Minimum reactive power output at Pc1 (MVAr).
    Qc1Min = 10,
    /// Maximum reactive power output at Pc1 (MVAr).
    Qc1Max = 11,
    /// Minimum reactive power output at Pc2 (MVAr).
    Qc2Min = 12,
    /// Maximum reactive power output at Pc2 (MVAr).
    Qc2Max = 13,
    /// Maximum state of charge (MWh); zero for non-storage devices.
    SocMax = 14,
    /// Round-trip charge/discharge efficiency (0, 1].
    Eff = 15,
}

/// Branch record columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum BranchCol {
    /// From-bus number.
    FBus = 0,
    /// To-bus number.
    TBus = 1,
    /// Resistance (p.u.).
    BrR = 2,
    /// Reactance (p.u.).
    BrX = 3,
    /// Total line charging susceptance (p.u.).
    BrB = 4,
    /// Thermal rating (MVA, long term).
    RateA = 5,
    /// Transformer off-nominal turns ratio (0 = line).
    Tap = 6,
    /// Transformer phase shift angle (degrees).
    Shift = 7,
    /// Branch status, 1 = in service, 0 = out of service.
    BrStatus = 8,
    /// Minimum angle difference (degrees).
    AngMin = 9,
    /// Maximum angle difference (degrees).
    AngMax = 10,
}

/// Named operating-range keys of the network.
///
/// Each key selects one per-bus, per-device, or per-branch bound vector from
/// the case; see [`crate::case::OperatingRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum SpecKey {
    PminBus = 0,
    PmaxBus = 1,
    QminBus = 2,
    QmaxBus = 3,
    VminBus = 4,
    VmaxBus = 5,
    PminDev = 6,
    PmaxDev = 7,
    QminDev = 8,
    QmaxDev = 9,
    DevType = 10,
    ImaxBr = 11,
    SocMin = 12,
    SocMax = 13,
}

/// Device type codes used in the `DEV_TYPE` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Slack generator.
    Slack,
    /// Passive load.
    Load,
    /// Dispatchable generator.
    Generator,
    /// Variable renewable energy source (wind, solar).
    Renewable,
    /// Distributed energy storage.
    Storage,
}

impl DeviceKind {
    /// Numeric code stored in the device table.
    pub fn code(self) -> f64 {
        match self {
            DeviceKind::Slack => 0.0,
            DeviceKind::Load => -1.0,
            DeviceKind::Generator => 1.0,
            DeviceKind::Renewable => 2.0,
            DeviceKind::Storage => 3.0,
        }
    }

    /// Decodes a `DEV_TYPE` column value.
    pub fn from_code(code: f64) -> Option<Self> {
        match code as i64 {
            0 => Some(DeviceKind::Slack),
            -1 => Some(DeviceKind::Load),
            1 => Some(DeviceKind::Generator),
            2 => Some(DeviceKind::Renewable),
            3 => Some(DeviceKind::Storage),
            _ => None,
        }
    }
}

macro_rules! col_impl {
    ($ty:ident, $count:expr, [$(($variant:ident, $name:literal)),+ $(,)?]) => {
        impl $ty {
            /// Number of columns in this record kind.
            pub const COUNT: usize = $count;

            /// All columns in index order.
            pub const ALL: [$ty; $count] = [$($ty::$variant),+];

            /// Positional index of this column.
            pub fn index(self) -> usize {
                self as usize
            }

            /// Canonical field name.
            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }

            /// Looks up a column by its canonical field name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

col_impl!(BusCol, 6, [
    (BusI, "BUS_I"),
    (BusType, "BUS_TYPE"),
    (Gs, "GS"),
    (Bs, "BS"),
    (Vmax, "VMAX"),
    (Vmin, "VMIN"),
]);

col_impl!(DevCol, 16, [
    (BusI, "BUS_I"),
    (DevType, "DEV_TYPE"),
    (QpRatio, "Q/P"),
    (Qmax, "QMAX"),
    (Qmin, "QMIN"),
    (DevStatus, "DEV_STATUS"),
    (Pmax, "PMAX"),
    (Pmin, "PMIN"),
    (Pc1, "PC1"),
    (Pc2, "PC2"),
    (Qc1Min, "QC1MIN"),
    (Qc1Max, "QC1MAX"),
    (Qc2Min, "QC2MIN"),
    (Qc2Max, "QC2MAX"),
    (SocMax, "SOC_MAX"),
    (Eff, "EFF"),
]);

col_impl!(BranchCol, 11, [
    (FBus, "F_BUS"),
    (TBus, "T_BUS"),
    (BrR, "BR_R"),
    (BrX, "BR_X"),
    (BrB, "BR_B"),
    (RateA, "RATE_A"),
    (Tap, "TAP"),
    (Shift, "SHIFT"),
    (BrStatus, "BR_STATUS"),
    (AngMin, "ANGMIN"),
    (AngMax, "ANGMAX"),
]);

col_impl!(SpecKey, 14, [
    (PminBus, "PMIN_BUS"),
    (PmaxBus, "PMAX_BUS"),
    (QminBus, "QMIN_BUS"),
    (QmaxBus, "QMAX_BUS"),
    (VminBus, "VMIN_BUS"),
    (VmaxBus, "VMAX_BUS"),
    (PminDev, "PMIN_DEV"),
    (PmaxDev, "PMAX_DEV"),
    (QminDev, "QMIN_DEV"),
    (QmaxDev, "QMAX_DEV"),
    (DevType, "DEV_TYPE"),
    (ImaxBr, "IMAX_BR"),
    (SocMin, "SOC_MIN"),
    (SocMax, "SOC_MAX"),
]);

/// Operating-range rows pushed to the visualization layer, in push order.
pub const RENDERED_SPECS: [SpecKey; 7] = [
    SpecKey::PminDev,
    SpecKey::PmaxDev,
    SpecKey::QminDev,
    SpecKey::QmaxDev,
    SpecKey::DevType,
    SpecKey::SocMin,
    SpecKey::SocMax,
];

/// State-value groups rendered at each step, in push order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateGroup {
    /// Real power injection of each device (MW).
    PDev,
    /// Reactive power injection of each device (MVAr).
    QDev,
    /// State of charge of each storage unit (MWh).
    Soc,
}

/// Rendered state groups, in push order.
pub const RENDERED_STATE: [StateGroup; 3] = [StateGroup::PDev, StateGroup::QDev, StateGroup::Soc];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_columns_are_dense_and_stable() {
        for (i, col) in BusCol::ALL.iter().enumerate() {
            assert_eq!(col.index(), i);
        }
        assert_eq!(BusCol::ALL.len(), BusCol::COUNT);
    }

    #[test]
    fn dev_columns_are_dense_and_stable() {
        for (i, col) in DevCol::ALL.iter().enumerate() {
            assert_eq!(col.index(), i);
        }
        assert_eq!(DevCol::ALL.len(), DevCol::COUNT);
    }

    #[test]
    fn branch_columns_are_dense_and_stable() {
        for (i, col) in BranchCol::ALL.iter().enumerate() {
            assert_eq!(col.index(), i);
        }
        assert_eq!(BranchCol::ALL.len(), BranchCol::COUNT);
    }

    #[test]
    fn spec_keys_are_dense_and_stable() {
        for (i, key) in SpecKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
        assert_eq!(SpecKey::ALL.len(), SpecKey::COUNT);
    }

    #[test]
    fn names_round_trip() {
        for col in BusCol::ALL {
            assert_eq!(BusCol::from_name(col.name()), Some(col));
        }
        for col in DevCol::ALL {
            assert_eq!(DevCol::from_name(col.name()), Some(col));
        }
        for col in BranchCol::ALL {
            assert_eq!(BranchCol::from_name(col.name()), Some(col));
        }
        for key in SpecKey::ALL {
            assert_eq!(SpecKey::from_name(key.name()), Some(key));
        }
    }

    #[test]
    fn names_are_unique_per_record_kind() {
        let mut dev_names: Vec<&str> = DevCol::ALL.iter().map(|c| c.name()).collect();
        dev_names.sort_unstable();
        dev_names.dedup();
        assert_eq!(dev_names.len(), DevCol::COUNT);
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(BusCol::from_name("BOGUS"), None);
    }

    #[test]
    fn device_kind_codes_round_trip() {
        for kind in [
            DeviceKind::Slack,
            DeviceKind::Load,
            DeviceKind::Generator,
            DeviceKind::Renewable,
            DeviceKind::Storage,
        ] {
            assert_eq!(DeviceKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(DeviceKind::from_code(7.0), None);
    }

    #[test]
    fn rendered_specs_are_a_subset_of_spec_keys() {
        for key in RENDERED_SPECS {
            assert!(SpecKey::ALL.contains(&key));
        }
    }
}
