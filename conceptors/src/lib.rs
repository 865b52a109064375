//! Conceptor networks: a random recurrent reservoir driven by patterns, whose
//! state statistics are turned into soft projection matrices (conceptors)
//! for storing, regenerating and recognizing those patterns.

#[macro_use]
extern crate log;

use nalgebra::{Const, Dyn, Matrix, VecStorage};

mod aperture;
mod conceptor;
mod config;
mod error;
mod esn_constructor;
mod harvest;
mod recognition;
mod reservoir;
mod reservoir_constructor;
mod spline;

pub use aperture::{ApertureRescale, Phi};
pub use conceptor::{compute_projector, Conceptor};
pub use config::ReservoirConfig;
pub use error::{ConceptorError, Precondition, Result};
pub use esn_constructor::ESNConstructor;
pub use harvest::{PatternId, PatternRecord, TrainingData};
pub use recognition::{
    recognition_predict, recognition_predict_columns, recognition_train, ApertureAdaptation,
    ApertureDiagnostics, OutputMode,
};
pub use reservoir::{Reservoir, WeightSet};
pub use reservoir_constructor::ReservoirConstructor;
pub use spline::CubicSpline;

pub type StateMatrix = Matrix<f64, Dyn, Const<1>, VecStorage<f64, Dyn, Const<1>>>;
