use nalgebra::{DMatrix, Dim, Matrix};
use nanorand::{Rng, WyRand};

use crate::{ReservoirConfig, ReservoirConstructor, StateMatrix};

/// Constructs the random weights of a classic Echo State Network
pub struct ESNConstructor {
    /// Controls the retention of information from previous time steps.
    /// The recurrent weights are rescaled so that their largest
    /// eigenvalue modulus equals this value.
    spectral_radius: f64,

    /// The number of nodes in the reservoir
    reservoir_size: usize,

    /// Dimensionality of the driving input
    input_dim: usize,

    /// Probability of two reservoir nodes being connected
    reservoir_sparsity: f64,

    /// Scales the randomly generated biases
    reservoir_bias_scaling: f64,

    /// Scales the input weights
    input_weight_scaling: f64,

    rng: WyRand,
}

impl ESNConstructor {
    pub fn new(
        seed: Option<u64>,
        reservoir_size: usize,
        input_dim: usize,
        spectral_radius: f64,
        reservoir_sparsity: f64,
        reservoir_bias_scaling: f64,
        input_weight_scaling: f64,
    ) -> Self {
        let rng = match seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };

        Self {
            spectral_radius,
            reservoir_size,
            input_dim,
            reservoir_sparsity,
            rng,
            reservoir_bias_scaling,
            input_weight_scaling,
        }
    }

    /// Take dimensions and scalings from the config, connecting each node to
    /// about 10 others on average
    pub fn from_config(seed: Option<u64>, config: &ReservoirConfig) -> Self {
        let sparsity = (10.0 / config.size_net as f64).min(1.0);
        Self::new(
            seed,
            config.size_net,
            config.size_in,
            config.spectral_radius,
            sparsity,
            config.bias_scale,
            config.input_scale,
        )
    }

    #[inline(always)]
    fn uniform(&mut self) -> f64 {
        self.rng.generate::<f64>() * 2.0 - 1.0
    }
}

impl ReservoirConstructor for ESNConstructor {
    fn construct_reservoir_weights(&mut self) -> DMatrix<f64> {
        let n = self.reservoir_size;
        if n == 0 {
            return DMatrix::zeros(0, 0);
        }
        let mut reservoir_matrix: DMatrix<f64> = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                if self.rng.generate::<f64>() < self.reservoir_sparsity {
                    reservoir_matrix[(i, j)] = self.uniform();
                }
            }
        }

        let spec_rad = reservoir_matrix
            .complex_eigenvalues()
            .iter()
            .map(|c| c.norm_sqr().sqrt())
            .fold(0.0, f64::max);
        if spec_rad > 0.0 {
            reservoir_matrix *= (1.0 / spec_rad) * self.spectral_radius;
        } else {
            warn!("random reservoir matrix is nilpotent, leaving it unscaled");
        }
        trace!("reservoir: {}", reservoir_matrix);

        reservoir_matrix
    }

    fn construct_reservoir_biases(&mut self) -> StateMatrix {
        Matrix::from_fn_generic(Dim::from_usize(self.reservoir_size), Dim::from_usize(1), |_, _| {
            self.uniform() * self.reservoir_bias_scaling
        })
    }

    fn construct_input_weight_matrix(&mut self) -> DMatrix<f64> {
        DMatrix::from_fn(self.reservoir_size, self.input_dim, |_, _| {
            self.uniform() * self.input_weight_scaling
        })
    }
}
