use nalgebra::{DMatrix, SymmetricEigen};

use crate::error::{ConceptorError, Precondition, Result};

/// Rescales the aperture of an existing conceptor.
///
/// Implementations must compose multiplicatively: rescaling by `a` and then by
/// `b` equals a single rescaling by some combined aperture.
pub trait ApertureRescale {
    /// Rescale `conceptor` by the aperture factor `gamma`
    fn rescale(&self, conceptor: &DMatrix<f64>, gamma: f64) -> Result<DMatrix<f64>>;
}

/// The aperture adaptation operator `phi(C, gamma) = C (C + gamma^-2 (I - C))^-1`.
///
/// Applied on the eigenvalues of the symmetric conceptor, so `C` never has to be
/// inverted. `gamma = 0` keeps only eigenvalues equal to one, `gamma = inf` maps
/// every positive eigenvalue to one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phi;

impl Phi {
    #[inline(always)]
    fn rescale_eigenvalue(c: f64, gamma: f64) -> f64 {
        if gamma == 0.0 {
            if c >= 1.0 {
                1.0
            } else {
                0.0
            }
        } else if gamma.is_infinite() {
            if c > 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            let denom = c + gamma.powi(-2) * (1.0 - c);
            if denom == 0.0 {
                0.0
            } else {
                c / denom
            }
        }
    }
}

impl ApertureRescale for Phi {
    fn rescale(&self, conceptor: &DMatrix<f64>, gamma: f64) -> Result<DMatrix<f64>> {
        if !conceptor.is_square() {
            return Err(ConceptorError::ShapeMismatch {
                context: "conceptor",
                expected: (conceptor.nrows(), conceptor.nrows()),
                actual: conceptor.shape(),
            });
        }
        if gamma.is_nan() || gamma < 0.0 {
            return Err(Precondition::InvalidAperture(gamma).into());
        }

        let eigen = SymmetricEigen::try_new(conceptor.clone(), f64::EPSILON, 0)
            .ok_or(ConceptorError::DecompositionFailed("symmetric eigendecomposition"))?;
        let rescaled = eigen.eigenvalues.map(|c| Self::rescale_eigenvalue(c, gamma));

        let v = &eigen.eigenvectors;
        let out = v * DMatrix::from_diagonal(&rescaled) * v.transpose();

        Ok((&out + out.transpose()) * 0.5)
    }
}
