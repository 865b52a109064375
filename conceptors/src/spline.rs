use nalgebra::{DMatrix, DVector};

use crate::error::{ConceptorError, Precondition, Result};

/// Piecewise cubic interpolant with not-a-knot end conditions.
///
/// With three knots this degenerates to the interpolating parabola and with two
/// knots to the straight line through them.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at every knot
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit the spline through the points `(xs[i], ys[i])`
    ///
    /// # Arguments
    /// xs: strictly increasing knot positions, at least two of them
    /// ys: the values at the knots
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(ConceptorError::ShapeMismatch {
                context: "spline values",
                expected: (xs.len(), 1),
                actual: (ys.len(), 1),
            });
        }
        let n = xs.len();
        if n < 2
            || xs.iter().chain(ys.iter()).any(|v| !v.is_finite())
            || xs.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(Precondition::InvalidKnots.into());
        }

        let m = if n == 2 {
            vec![0.0; 2]
        } else {
            Self::second_derivatives(xs, ys)?
        };

        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            m,
        })
    }

    /// Solve the linear system for the knot second derivatives
    fn second_derivatives(xs: &[f64], ys: &[f64]) -> Result<Vec<f64>> {
        let n = xs.len();
        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

        let mut a: DMatrix<f64> = DMatrix::zeros(n, n);
        let mut b: DVector<f64> = DVector::zeros(n);

        // continuity of the first derivative at the interior knots
        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];
            b[i] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
        }

        if n == 3 {
            // a single parabola, so the second derivative is constant
            a[(0, 0)] = 1.0;
            a[(0, 1)] = -1.0;
            a[(2, 1)] = 1.0;
            a[(2, 2)] = -1.0;
        } else {
            // not-a-knot: the third derivative is continuous at the second
            // and the second to last knot
            a[(0, 0)] = h[1];
            a[(0, 1)] = -(h[0] + h[1]);
            a[(0, 2)] = h[0];

            let k = n - 2;
            a[(n - 1, k - 1)] = h[k];
            a[(n - 1, k)] = -(h[k - 1] + h[k]);
            a[(n - 1, k + 1)] = h[k - 1];
        }

        let m = a
            .lu()
            .solve(&b)
            .ok_or(ConceptorError::DecompositionFailed("spline system"))?;

        Ok(m.iter().cloned().collect())
    }

    /// The interpolation range
    #[inline(always)]
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluate the spline at `x`, which must lie within the knot range
    pub fn eval(&self, x: f64) -> Result<f64> {
        let (lo, hi) = self.domain();
        if !(x >= lo && x <= hi) {
            return Err(Precondition::OutOfRange { x, lo, hi }.into());
        }

        let n = self.xs.len();
        let i = self.xs.partition_point(|k| *k <= x).saturating_sub(1).min(n - 2);

        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        let h = x1 - x0;
        let (l, r) = (x1 - x, x - x0);

        Ok(m0 * l.powi(3) / (6.0 * h)
            + m1 * r.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * l
            + (y1 / h - m1 * h / 6.0) * r)
    }

    /// Evaluate the spline at every point of `grid`
    pub fn sample(&self, grid: &[f64]) -> Result<Vec<f64>> {
        grid.iter().map(|x| self.eval(*x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use round::round;

    use super::*;

    #[test]
    fn reproduces_cubic_polynomial() {
        let f = |x: f64| x.powi(3) - 2.0 * x + 1.0;
        let xs: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| f(*x)).collect();
        let spline = CubicSpline::new(&xs, &ys).unwrap();

        for &x in &[0.0, 0.25, 1.5, 2.75, 4.1, 5.0] {
            assert_eq!(round(spline.eval(x).unwrap(), 9), round(f(x), 9));
        }
    }

    #[test]
    fn four_knots_give_the_interpolating_cubic() {
        let f = |x: f64| 0.5 * x.powi(3) - x.powi(2) + 3.0;
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| f(*x)).collect();
        let spline = CubicSpline::new(&xs, &ys).unwrap();

        assert_eq!(round(spline.eval(0.5).unwrap(), 9), round(f(0.5), 9));
        assert_eq!(round(spline.eval(2.99).unwrap(), 9), round(f(2.99), 9));
    }

    #[test]
    fn three_knots_give_a_parabola() {
        let f = |x: f64| 2.0 * x * x - x;
        let xs = [0.0, 1.0, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| f(*x)).collect();
        let spline = CubicSpline::new(&xs, &ys).unwrap();

        for &x in &[0.3, 1.0, 2.2] {
            assert_eq!(round(spline.eval(x).unwrap(), 9), round(f(x), 9));
        }
    }

    #[test]
    fn two_knots_give_a_line() {
        let spline = CubicSpline::new(&[0.0, 2.0], &[1.0, 5.0]).unwrap();
        assert_eq!(round(spline.eval(0.5).unwrap(), 12), 2.0);
        assert_eq!(spline.sample(&[0.0, 2.0]).unwrap(), vec![1.0, 5.0]);
    }

    #[test]
    fn rejects_bad_knots() {
        assert!(CubicSpline::new(&[0.0], &[1.0]).is_err());
        assert!(CubicSpline::new(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(CubicSpline::new(&[0.0, 1.0], &[1.0]).is_err());

        let spline = CubicSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert!(matches!(
            spline.eval(2.5),
            Err(ConceptorError::PreconditionViolation(Precondition::OutOfRange { .. }))
        ));
    }
}
