//! Seeded region growing.
//!
//! - [`shell`] - cube-surface enumeration around the seed point
//! - [`seed`] - seed statistics and the global intensity band
//! - [`region`] - the steppable grower and its reports

pub mod region;
pub mod seed;
pub mod shell;

pub use region::{
    GrownRegion, Growth, GrowthReport, GrowthSchedule, GrowthState, RegionGrower, Termination, SEARCH_RADIUS,
};
pub use seed::{IntensityRange, SeedStatistics};
pub use shell::{shell, shell_len};
