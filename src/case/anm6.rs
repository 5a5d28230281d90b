//! The built-in six-bus distribution network.
//!
//! ```text
//! Slack ---------------------------
//!         |            |           |
//!       -----       -------      -----
//!      |     |     |       |    |     |
//!     House  PV  Factory  Wind  EV   DES
//! ```
//!
//! Bus 0 is the slack bus. Three feeders leave it: the residential feeder
//! (bus 1 with the house load, bus 2 with the rooftop PV), the industrial
//! feeder (bus 3 with the factory load, bus 4 with the wind farm), and the
//! storage feeder (bus 5 hosting both the EV charging load and the DES unit).
//! Seven devices in total, so the flattened observation (P, Q per device plus
//! the DES state of charge) is 15-dimensional.

use super::CaseTable;

/// Builds the six-bus case tables.
pub fn anm6() -> CaseTable {
    let base_mva = 100.0;

    // BUS_I, BUS_TYPE, GS, BS, VMAX, VMIN
    let bus = vec![
        vec![0.0, 3.0, 0.0, 0.0, 1.04, 0.96],
        vec![1.0, 1.0, 0.0, 0.0, 1.04, 0.96],
        vec![2.0, 1.0, 0.0, 0.0, 1.04, 0.96],
        vec![3.0, 1.0, 0.0, 0.0, 1.04, 0.96],
        vec![4.0, 1.0, 0.0, 0.0, 1.04, 0.96],
        vec![5.0, 1.0, 0.0, 0.0, 1.04, 0.96],
    ];

    // BUS_I, DEV_TYPE, Q/P, QMAX, QMIN, DEV_STATUS, PMAX, PMIN,
    // PC1, PC2, QC1MIN, QC1MAX, QC2MIN, QC2MAX, SOC_MAX, EFF
    let dev = vec![
        // Slack generator.
        vec![
            0.0, 0.0, 0.0, 100.0, -100.0, 1.0, 100.0, -100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            1.0,
        ],
        // House load.
        vec![
            1.0, -1.0, 0.2, 0.0, -6.0, 1.0, 0.0, -30.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ],
        // Rooftop PV.
        vec![
            2.0, 2.0, 0.0, 30.0, -30.0, 1.0, 30.0, 0.0, 0.0, 30.0, -30.0, 30.0, 0.0, 0.0, 0.0, 1.0,
        ],
        // Factory load.
        vec![
            3.0, -1.0, 0.3, 0.0, -15.0, 1.0, 0.0, -50.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ],
        // Wind farm.
        vec![
            4.0, 2.0, 0.0, 50.0, -50.0, 1.0, 50.0, 0.0, 0.0, 50.0, -50.0, 50.0, 0.0, 0.0, 0.0, 1.0,
        ],
        // EV charging load.
        vec![
            5.0, -1.0, 0.1, 0.0, -3.0, 1.0, 0.0, -30.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ],
        // Distributed energy storage.
        vec![
            5.0, 3.0, 0.0, 50.0, -50.0, 1.0, 50.0, -50.0, -50.0, 50.0, -50.0, 50.0, -50.0, 50.0,
            100.0, 0.9,
        ],
    ];

    // F_BUS, T_BUS, BR_R, BR_X, BR_B, RATE_A, TAP, SHIFT, BR_STATUS, ANGMIN, ANGMAX
    let branch = vec![
        vec![0.0, 1.0, 0.03, 0.08, 0.0, 32.0, 0.0, 0.0, 1.0, -180.0, 180.0],
        vec![1.0, 2.0, 0.03, 0.08, 0.0, 32.0, 0.0, 0.0, 1.0, -180.0, 180.0],
        vec![0.0, 3.0, 0.03, 0.08, 0.0, 63.0, 0.0, 0.0, 1.0, -180.0, 180.0],
        vec![3.0, 4.0, 0.03, 0.08, 0.0, 63.0, 0.0, 0.0, 1.0, -180.0, 180.0],
        vec![0.0, 5.0, 0.03, 0.08, 0.0, 63.0, 0.0, 0.0, 1.0, -180.0, 180.0],
    ];

    CaseTable::new(base_mva, bus, dev, branch)
}
