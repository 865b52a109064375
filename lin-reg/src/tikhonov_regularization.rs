use nalgebra::{DMatrix, SymmetricEigen};

use super::{LinReg, LinRegError};

/// Upper bound on the condition number of the regularized gram matrix
/// that is still accepted for inversion.
pub const MAX_CONDITION_NUMBER: f64 = 1e14;

/// Tikhonov regularization aka ridge regression
/// It is particularly useful to mitigate the problem of multicollinearity in
/// linear regression
#[derive(Debug, Clone)]
pub struct TikhonovRegularization {
    /// Ridge parameter
    pub regularization_coeff: f64,
}

impl LinReg for TikhonovRegularization {
    /// Closed form `targets * design^T * (design * design^T + coeff * I)^-1`
    fn fit_readout(
        &self,
        design: &DMatrix<f64>,
        targets: &DMatrix<f64>,
    ) -> Result<DMatrix<f64>, LinRegError> {
        if design.ncols() != targets.ncols() {
            return Err(LinRegError::DimensionMismatch {
                design: design.ncols(),
                targets: targets.ncols(),
            });
        }
        if design.ncols() == 0 || design.nrows() == 0 {
            return Err(LinRegError::EmptyDesign);
        }

        let n = design.nrows();
        let reg_m: DMatrix<f64> = DMatrix::from_diagonal_element(n, n, self.regularization_coeff);

        let p0 = design * design.transpose() + reg_m;

        let eigen = SymmetricEigen::new(p0.clone());
        let max = eigen.eigenvalues.max();
        let min = eigen.eigenvalues.min();
        if min.is_nan() || min <= 0.0 {
            warn!("regularized gram matrix has eigenvalue {} <= 0", min);
            return Err(LinRegError::Singular);
        }
        let condition = max / min;
        debug!("regularized gram condition number: {:e}", condition);
        if condition > MAX_CONDITION_NUMBER {
            warn!("refusing to invert gram matrix with condition number {:e}", condition);
            return Err(LinRegError::IllConditioned { condition });
        }

        let chol = p0.cholesky().ok_or(LinRegError::Singular)?;
        let p1 = design * targets.transpose();

        // solves (X X^T + rI) W^T = X T^T, the gram matrix being symmetric
        Ok(chol.solve(&p1).transpose())
    }
}

#[cfg(test)]
mod tests {
    use round::round;

    use super::*;

    #[test]
    fn tikhonov_regularization() {
        if let Err(_) = pretty_env_logger::try_init() {}

        // Note the first row being just ones
        let design: DMatrix<f64> = DMatrix::from_row_slice(
            3,
            4,
            &[1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 2.0],
        );
        let targets: DMatrix<f64> = DMatrix::from_row_slice(1, 4, &[1.0, 2.0, 3.0, 4.0]);
        info!("design: {}, targets: {}", design, targets);

        let regressor = TikhonovRegularization {
            regularization_coeff: 0.0,
        };
        let mut readout_matrix = regressor.fit_readout(&design, &targets).unwrap();
        info!("readout_matrix: {}", readout_matrix);

        let goal_matrix: DMatrix<f64> = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 0.0]);

        // round readout
        readout_matrix.iter_mut().for_each(|v| *v = round(*v, 1));

        assert_eq!(readout_matrix, goal_matrix)
    }

    #[test]
    fn tikhonov_regularization_shifted() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let design: DMatrix<f64> = DMatrix::from_row_slice(
            3,
            4,
            &[100.0, 100.0, 100.0, 100.0, 0.0, 100.0, 200.0, 300.0, 0.0, 0.0, 100.0, 200.0],
        );
        let targets: DMatrix<f64> =
            DMatrix::from_row_slice(1, 4, &[100.0, 200.0, 300.0, 400.0]);
        info!("design: {}, targets: {}", design, targets);

        let regressor = TikhonovRegularization {
            regularization_coeff: 0.0,
        };
        let mut readout_matrix = regressor.fit_readout(&design, &targets).unwrap();
        info!("readout_matrix: {}", readout_matrix);

        let goal_matrix: DMatrix<f64> = DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 0.0]);

        readout_matrix.iter_mut().for_each(|v| *v = round(*v, 1));

        assert_eq!(readout_matrix, goal_matrix)
    }

    /// Tests how to perform a readout from a single observed state
    #[test]
    fn readout_from_state() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let design: DMatrix<f64> = DMatrix::from_row_slice(
            3,
            4,
            &[1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 2.0],
        );
        let targets: DMatrix<f64> = DMatrix::from_row_slice(1, 4, &[1.0, 2.0, 3.0, 4.0]);

        let regressor = TikhonovRegularization {
            regularization_coeff: 1e-9,
        };
        let readout = regressor.fit_readout(&design, &targets).unwrap();

        // the last observation should map onto the last target
        let state = design.column(3);
        let o = &readout * state;
        info!("o: {}", o);

        assert_eq!(round(o[0], 3), 4.0);
    }

    #[test]
    fn strong_regularization_shrinks_readout() {
        let design: DMatrix<f64> =
            DMatrix::from_row_slice(2, 3, &[0.5, -0.2, 0.1, 0.3, 0.4, -0.6]);
        let targets: DMatrix<f64> = DMatrix::from_row_slice(1, 3, &[1.0, -1.0, 0.5]);

        let regressor = TikhonovRegularization {
            regularization_coeff: 1e12,
        };
        let readout = regressor.fit_readout(&design, &targets).unwrap();
        assert!(readout.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn rank_deficient_without_ridge() {
        // second row is a multiple of the first one
        let design: DMatrix<f64> =
            DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0]);
        let targets: DMatrix<f64> = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);

        let regressor = TikhonovRegularization {
            regularization_coeff: 0.0,
        };
        let err = regressor.fit_readout(&design, &targets).unwrap_err();
        assert!(matches!(err, LinRegError::Singular | LinRegError::IllConditioned { .. }));
    }

    #[test]
    fn mismatched_observations() {
        let design: DMatrix<f64> = DMatrix::zeros(2, 3);
        let targets: DMatrix<f64> = DMatrix::zeros(1, 4);
        let regressor = TikhonovRegularization {
            regularization_coeff: 1.0,
        };
        assert_eq!(
            regressor.fit_readout(&design, &targets),
            Err(LinRegError::DimensionMismatch { design: 3, targets: 4 })
        );

        let design: DMatrix<f64> = DMatrix::zeros(2, 0);
        let targets: DMatrix<f64> = DMatrix::zeros(1, 0);
        assert_eq!(regressor.fit_readout(&design, &targets), Err(LinRegError::EmptyDesign));
    }
}
