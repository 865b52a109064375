use std::borrow::Borrow;

use nalgebra::{DMatrix, DVector};

use crate::{
    aperture::ApertureRescale,
    error::{ConceptorError, Precondition, Result},
    spline::CubicSpline,
};
use lin_reg::LinRegError;

/// Number of interpolation grid points per unit of aperture exponent
const GRID_RESOLUTION: usize = 100;

/// How much `recognition_train` reports back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Only the final conceptors and the shared aperture
    #[default]
    Simple,
    /// Additionally the per-class intermediate results
    Complete,
}

/// Intermediate results of the aperture search, one entry per class
#[derive(Debug, Clone, PartialEq)]
pub struct ApertureDiagnostics {
    /// Raw state correlation `R` of every class
    pub correlations: Vec<DMatrix<f64>>,
    /// The proto-conceptor `R (R + I)^-1` of every class
    pub proto_conceptors: Vec<DMatrix<f64>>,
    /// The aperture each class would have chosen on its own
    pub apertures: Vec<f64>,
}

/// The outcome of `recognition_train`
#[derive(Debug, Clone, PartialEq)]
pub struct ApertureAdaptation {
    /// One conceptor per class, all at the shared aperture
    pub conceptors: Vec<DMatrix<f64>>,
    /// Mean of the per-class apertures
    pub aperture: f64,
    /// Only present in `OutputMode::Complete`
    pub diagnostics: Option<ApertureDiagnostics>,
}

/// Proto-conceptor `R (R + I)^-1` of one class
fn proto_conceptor(r: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let n = r.nrows();
    let shifted = r + DMatrix::<f64>::identity(n, n);
    let chol = shifted.cholesky().ok_or(LinRegError::Singular)?;
    // R and (R + I)^-1 commute
    let c = chol.solve(r);

    Ok((&c + c.transpose()) * 0.5)
}

/// Find the aperture at which the energy of the rescaled proto-conceptor changes fastest
fn steepest_aperture<A: ApertureRescale>(
    c_prem: &DMatrix<f64>,
    ap_n: usize,
    rescaler: &A,
) -> Result<f64> {
    let exponents: Vec<f64> = (0..ap_n).map(|i| i as f64).collect();
    let norms = exponents
        .iter()
        .map(|e| -> Result<f64> { Ok(rescaler.rescale(c_prem, 2f64.powf(*e))?.norm_squared()) })
        .collect::<Result<Vec<f64>>>()?;
    trace!("squared norms over aperture exponents: {:?}", norms);

    let spline = CubicSpline::new(&exponents, &norms)?;
    let grid: Vec<f64> = (0..=(ap_n - 1) * GRID_RESOLUTION)
        .map(|i| i as f64 / GRID_RESOLUTION as f64)
        .collect();
    let sampled = spline.sample(&grid)?;

    let step = 1.0 / GRID_RESOLUTION as f64;
    let mut best_idx = 0;
    let mut best_grad = f64::NEG_INFINITY;
    for (i, w) in sampled.windows(2).enumerate() {
        let grad = ((w[1] - w[0]) / step).abs();
        if grad > best_grad {
            best_grad = grad;
            best_idx = i;
        }
    }
    debug!("steepest energy change {} at exponent {}", best_grad, grid[best_idx]);

    Ok(2f64.powf(grid[best_idx]))
}

/// Learn one conceptor per class with an automatically chosen, shared aperture.
///
/// # Arguments
/// data: One matrix per class, each column an observation. All must share their row count.
/// ap_n: Number of aperture exponents `0..ap_n` to explore, at least 2
/// mode: Whether to report the intermediate results
/// rescaler: The aperture rescaling operator
pub fn recognition_train<A: ApertureRescale>(
    data: &[DMatrix<f64>],
    ap_n: usize,
    mode: OutputMode,
    rescaler: &A,
) -> Result<ApertureAdaptation> {
    if ap_n < 2 {
        return Err(Precondition::TooFewApertureCandidates(ap_n).into());
    }
    let dim = match data.first() {
        Some(d) => d.nrows(),
        None => return Err(Precondition::EmptyData.into()),
    };
    for d in data {
        if d.nrows() != dim {
            return Err(ConceptorError::ShapeMismatch {
                context: "recognition data",
                expected: (dim, d.ncols()),
                actual: d.shape(),
            });
        }
        if d.ncols() == 0 || d.nrows() == 0 {
            return Err(Precondition::EmptyData.into());
        }
    }

    let mut correlations = Vec::with_capacity(data.len());
    let mut proto_conceptors = Vec::with_capacity(data.len());
    let mut apertures = Vec::with_capacity(data.len());
    for (class, d) in data.iter().enumerate() {
        let r = d * d.transpose() / d.ncols() as f64;
        let c_prem = proto_conceptor(&r)?;
        let apt = steepest_aperture(&c_prem, ap_n, rescaler)?;
        debug!("class {} prefers aperture {}", class, apt);

        correlations.push(r);
        proto_conceptors.push(c_prem);
        apertures.push(apt);
    }

    let aperture = apertures.iter().sum::<f64>() / apertures.len() as f64;
    info!("shared aperture of {} classes: {}", data.len(), aperture);

    let conceptors = proto_conceptors
        .iter()
        .map(|c| rescaler.rescale(c, aperture))
        .collect::<Result<Vec<_>>>()?;

    let diagnostics = match mode {
        OutputMode::Simple => None,
        OutputMode::Complete => Some(ApertureDiagnostics {
            correlations,
            proto_conceptors,
            apertures,
        }),
    };

    Ok(ApertureAdaptation {
        conceptors,
        aperture,
        diagnostics,
    })
}

fn check_conceptors<C: Borrow<DMatrix<f64>>>(test: &DMatrix<f64>, conceptors: &[C]) -> Result<()> {
    if conceptors.is_empty() {
        return Err(Precondition::EmptyData.into());
    }
    let n = test.nrows();
    for c in conceptors {
        let c: &DMatrix<f64> = c.borrow();
        if c.shape() != (n, n) {
            return Err(ConceptorError::ShapeMismatch {
                context: "conceptor against test data",
                expected: (n, n),
                actual: c.shape(),
            });
        }
    }
    Ok(())
}

/// Index of the first maximum, ignoring NaN. `None` when nothing but NaN is left.
fn argmax(vals: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in vals.into_iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Score `test` against every conceptor and pick the best matching one.
///
/// The evidence of conceptor `C` is the sum over all entries of `test .* (C test)`,
/// so every column of `test` adds to the same score.
///
/// # Returns
/// The index of the conceptor with the largest evidence, and all evidences
pub fn recognition_predict<C: Borrow<DMatrix<f64>>>(
    test: &DMatrix<f64>,
    conceptors: &[C],
) -> Result<(usize, DVector<f64>)> {
    check_conceptors(test, conceptors)?;

    let evidence = DVector::from_iterator(
        conceptors.len(),
        conceptors.iter().map(|c| {
            let c: &DMatrix<f64> = c.borrow();
            test.component_mul(&(c * test)).sum()
        }),
    );
    let class = argmax(evidence.iter().cloned()).ok_or_else(|| {
        warn!("every evidence value is NaN");
        ConceptorError::NonFiniteEvidence { column: 0 }
    })?;
    debug!("evidence: {}, class: {}", evidence.transpose(), class);

    Ok((class, evidence))
}

/// Like `recognition_predict`, but keeping every column of `test` separate.
///
/// # Returns
/// The best matching conceptor per column, and the conceptors x columns evidence matrix
pub fn recognition_predict_columns<C: Borrow<DMatrix<f64>>>(
    test: &DMatrix<f64>,
    conceptors: &[C],
) -> Result<(Vec<usize>, DMatrix<f64>)> {
    check_conceptors(test, conceptors)?;

    let mut evidence: DMatrix<f64> = DMatrix::zeros(conceptors.len(), test.ncols());
    for (k, c) in conceptors.iter().enumerate() {
        let c: &DMatrix<f64> = c.borrow();
        let prod = test.component_mul(&(c * test));
        for (j, col) in prod.column_iter().enumerate() {
            evidence[(k, j)] = col.sum();
        }
    }
    let classes = evidence
        .column_iter()
        .enumerate()
        .map(|(j, col)| {
            argmax(col.iter().cloned()).ok_or_else(|| {
                warn!("every evidence value of test column {} is NaN", j);
                ConceptorError::NonFiniteEvidence { column: j }
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    Ok((classes, evidence))
}

#[cfg(test)]
mod tests {
    use nanorand::{Rng, WyRand};

    use super::*;
    use crate::aperture::Phi;

    /// Samples spread along axis `axis` with small isotropic noise
    fn cloud(rng: &mut WyRand, axis: usize, dim: usize, n: usize) -> DMatrix<f64> {
        DMatrix::from_fn(dim, n, |i, _| {
            let noise = (rng.generate::<f64>() * 2.0 - 1.0) * 0.05;
            if i == axis {
                let sign = if rng.generate::<bool>() { 1.0 } else { -1.0 };
                sign * (0.5 + rng.generate::<f64>() * 0.5) + noise
            } else {
                noise
            }
        })
    }

    #[test]
    fn separated_classes_are_recognized() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let mut rng = WyRand::new_seed(0);
        let train = vec![cloud(&mut rng, 0, 3, 200), cloud(&mut rng, 1, 3, 200)];
        let adaptation = recognition_train(&train, 4, OutputMode::Simple, &Phi).unwrap();

        assert_eq!(adaptation.conceptors.len(), 2);
        assert!(adaptation.diagnostics.is_none());
        assert!(adaptation.aperture >= 1.0 && adaptation.aperture <= 8.0);

        let mut correct = 0;
        let trials = 100;
        for class in 0..2 {
            let held_out = cloud(&mut rng, class, 3, trials);
            for j in 0..trials {
                let sample = held_out.columns(j, 1).into_owned();
                let (pred, evidence) = recognition_predict(&sample, &adaptation.conceptors).unwrap();
                assert_eq!(evidence.len(), 2);
                if pred == class {
                    correct += 1;
                }
            }
        }
        assert!(correct as f64 / (2 * trials) as f64 >= 0.95, "{} correct", correct);
    }

    #[test]
    fn complete_mode_reports_diagnostics() {
        let mut rng = WyRand::new_seed(5);
        let train = vec![cloud(&mut rng, 0, 2, 50), cloud(&mut rng, 1, 2, 80)];
        let adaptation = recognition_train(&train, 5, OutputMode::Complete, &Phi).unwrap();

        let diag = adaptation.diagnostics.unwrap();
        assert_eq!(diag.correlations.len(), 2);
        assert_eq!(diag.proto_conceptors.len(), 2);
        assert_eq!(diag.apertures.len(), 2);

        let mean = (diag.apertures[0] + diag.apertures[1]) / 2.0;
        assert!((mean - adaptation.aperture).abs() < 1e-12);
        for apt in &diag.apertures {
            assert!(*apt >= 1.0 && *apt <= 16.0);
        }

        // the final conceptors are the proto-conceptors at the shared aperture
        for (c, c_prem) in adaptation.conceptors.iter().zip(diag.proto_conceptors.iter()) {
            let expected = Phi.rescale(c_prem, adaptation.aperture).unwrap();
            assert!((c - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn proto_conceptor_shrinks_with_unit_aperture() {
        let r = DMatrix::from_row_slice(2, 2, &[4.0, 0.0, 0.0, 1.0]);
        let c = proto_conceptor(&r).unwrap();
        assert!((c - DMatrix::from_row_slice(2, 2, &[0.8, 0.0, 0.0, 0.5])).norm() < 1e-12);
    }

    #[test]
    fn rejects_bad_training_input() {
        let d: DMatrix<f64> = DMatrix::from_element(2, 3, 0.1);
        assert!(matches!(
            recognition_train(&[d.clone()], 1, OutputMode::Simple, &Phi),
            Err(ConceptorError::PreconditionViolation(Precondition::TooFewApertureCandidates(1)))
        ));
        assert!(matches!(
            recognition_train(&[], 4, OutputMode::Simple, &Phi),
            Err(ConceptorError::PreconditionViolation(Precondition::EmptyData))
        ));

        let other: DMatrix<f64> = DMatrix::from_element(3, 3, 0.1);
        assert!(matches!(
            recognition_train(&[d, other], 4, OutputMode::Simple, &Phi),
            Err(ConceptorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn evidence_pools_columns() {
        let c1 = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        let c2 = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]);
        let test = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.5, 2.0]);

        let (class, evidence) = recognition_predict(&test, &[c1.clone(), c2.clone()]).unwrap();
        // first coordinate squared summed over columns: 1, second: 0.25 + 4
        assert_eq!(evidence, DVector::from_vec(vec![1.0, 4.25]));
        assert_eq!(class, 1);

        let (classes, per_column) = recognition_predict_columns(&test, &[c1, c2]).unwrap();
        assert_eq!(per_column, DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.25, 4.0]));
        assert_eq!(classes, vec![0, 1]);
    }

    #[test]
    fn nan_evidence_has_no_best_match() {
        let c1 = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        let c2 = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]);
        let test = DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, 0.5, 2.0]);

        assert_eq!(
            recognition_predict(&test, &[c1.clone(), c2.clone()]).unwrap_err(),
            ConceptorError::NonFiniteEvidence { column: 0 }
        );
        assert_eq!(
            recognition_predict_columns(&test, &[c1, c2]).unwrap_err(),
            ConceptorError::NonFiniteEvidence { column: 1 }
        );

        assert_eq!(argmax([f64::NAN, 2.0, f64::NAN, 2.0]), Some(1));
        assert_eq!(argmax([f64::NEG_INFINITY]), Some(0));
        assert_eq!(argmax([f64::NAN, f64::NAN]), None);
    }

    #[test]
    fn prediction_is_deterministic() {
        let mut rng = WyRand::new_seed(9);
        let train = vec![cloud(&mut rng, 0, 3, 40), cloud(&mut rng, 2, 3, 40)];
        let adaptation = recognition_train(&train, 6, OutputMode::Simple, &Phi).unwrap();
        let test = cloud(&mut rng, 2, 3, 10);

        let a = recognition_predict(&test, &adaptation.conceptors).unwrap();
        let b = recognition_predict(&test, &adaptation.conceptors).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.0, 1);
    }

    #[test]
    fn prediction_checks_shapes() {
        let test: DMatrix<f64> = DMatrix::zeros(3, 1);
        let c: DMatrix<f64> = DMatrix::identity(2, 2);
        assert!(matches!(
            recognition_predict(&test, &[c]),
            Err(ConceptorError::ShapeMismatch { .. })
        ));

        let none: [DMatrix<f64>; 0] = [];
        assert!(recognition_predict(&test, &none).is_err());
    }
}
