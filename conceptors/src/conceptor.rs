use std::borrow::Borrow;

use nalgebra::{DMatrix, DVector, SVD};

use crate::error::{ConceptorError, Precondition, Result};

/// A conceptor, the soft projector onto the state space region visited
/// while a pattern was driving the reservoir
#[derive(Debug, Clone, PartialEq)]
pub struct Conceptor {
    matrix: DMatrix<f64>,
    basis: DMatrix<f64>,
    shrunk_eigenvalues: DVector<f64>,
    singular_values: DVector<f64>,
    aperture: f64,
}

impl Conceptor {
    /// The conceptor matrix `C = U * S_new * U^T`
    #[inline(always)]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// The eigenvector basis `U` shared with the correlation matrix
    #[inline(always)]
    pub fn basis(&self) -> &DMatrix<f64> {
        &self.basis
    }

    /// The diagonal of `S_new`, each in [0, 1)
    #[inline(always)]
    pub fn shrunk_eigenvalues(&self) -> &DVector<f64> {
        &self.shrunk_eigenvalues
    }

    /// The singular values of the correlation matrix this conceptor was computed from
    #[inline(always)]
    pub fn singular_values(&self) -> &DVector<f64> {
        &self.singular_values
    }

    #[inline(always)]
    pub fn aperture(&self) -> f64 {
        self.aperture
    }

    /// Consume the record, keeping only the matrix
    pub fn into_matrix(self) -> DMatrix<f64> {
        self.matrix
    }
}

impl Borrow<DMatrix<f64>> for Conceptor {
    fn borrow(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

/// Apertures must be finite and strictly positive for the shrinkage to be defined
pub(crate) fn check_aperture(alpha: f64) -> Result<()> {
    if alpha.is_finite() && alpha > 0.0 {
        Ok(())
    } else {
        Err(Precondition::InvalidAperture(alpha).into())
    }
}

/// Singular value decomposition of a symmetric positive semi-definite matrix,
/// returning the left singular vectors and the singular values
pub(crate) fn decompose_correlation(r: &DMatrix<f64>) -> Result<(DMatrix<f64>, DVector<f64>)> {
    let svd = SVD::try_new(r.clone(), true, false, f64::EPSILON, 0)
        .ok_or(ConceptorError::DecompositionFailed("singular value decomposition"))?;
    let u = svd
        .u
        .ok_or(ConceptorError::DecompositionFailed("singular value decomposition"))?;

    Ok((u, svd.singular_values))
}

/// Compute the conceptor of a state correlation matrix `r` at aperture `alpha`.
///
/// Every singular value `s` of `r` is shrunk to `s / (s + alpha^-2)`.
pub fn compute_projector(r: &DMatrix<f64>, alpha: f64) -> Result<Conceptor> {
    if !r.is_square() {
        return Err(ConceptorError::ShapeMismatch {
            context: "correlation matrix",
            expected: (r.nrows(), r.nrows()),
            actual: r.shape(),
        });
    }
    check_aperture(alpha)?;

    let (basis, singular_values) = decompose_correlation(r)?;
    let inv_sq = alpha.powi(-2);
    let shrunk_eigenvalues = singular_values.map(|s| s / (s + inv_sq));

    let matrix = &basis * DMatrix::from_diagonal(&shrunk_eigenvalues) * basis.transpose();
    // remove the rounding asymmetry of the product
    let matrix = (&matrix + matrix.transpose()) * 0.5;
    trace!("conceptor at aperture {}: {}", alpha, matrix);

    Ok(Conceptor {
        matrix,
        basis,
        shrunk_eigenvalues,
        singular_values,
        aperture: alpha,
    })
}
