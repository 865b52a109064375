#[macro_use]
extern crate log;

use nalgebra::DMatrix;

mod tikhonov_regularization;

pub use tikhonov_regularization::{TikhonovRegularization, MAX_CONDITION_NUMBER};

/// Errors of fitting a linear readout
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinRegError {
    /// Observations and targets disagree on the number of columns
    #[error("design has {design} observations but targets have {targets}")]
    DimensionMismatch {
        /// Columns of the design matrix
        design: usize,
        /// Columns of the target matrix
        targets: usize,
    },

    /// Nothing to fit
    #[error("design matrix holds no observations")]
    EmptyDesign,

    /// The regularized gram matrix is too badly conditioned to invert
    #[error("regularized gram matrix is ill-conditioned (condition number {condition:e})")]
    IllConditioned {
        /// Ratio of the largest to the smallest eigenvalue
        condition: f64,
    },

    /// The regularized gram matrix is not positive definite
    #[error("regularized gram matrix is singular")]
    Singular,
}

/// Generic way of performing linear regression and fitting the readout matrix
pub trait LinReg: Clone {
    /// Fit a readout matrix `W` so that `W * design` approximates `targets`
    ///
    /// # Parameters
    /// design: One observation per column, having F rows as the feature dimensionality
    /// targets: One target per column, having O rows as the output dimensionality
    ///
    /// # Returns
    /// The O x F readout matrix
    fn fit_readout(
        &self,
        design: &DMatrix<f64>,
        targets: &DMatrix<f64>,
    ) -> Result<DMatrix<f64>, LinRegError>;
}
