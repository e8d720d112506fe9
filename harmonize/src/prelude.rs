//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use harmonize::prelude::*;
//! ```

pub use crate::{
    Channel, ConfigError, Error, GainOffset, GeometricModel, HarmonizationReport,
    HarmonizeConfig, Harmonizer, LpSolver, Result, SelectionMethod, SimplexSolver, ViewId,
};
