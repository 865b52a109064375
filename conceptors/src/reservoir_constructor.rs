use nalgebra::DMatrix;

use crate::StateMatrix;

/// Provides the abstraction needed for custom implementations of the reservoir generation process
pub trait ReservoirConstructor {
    /// The fixed recurrent weights `W_star`, size_net x size_net
    fn construct_reservoir_weights(&mut self) -> DMatrix<f64>;

    /// The bias vector `W_bias`, size_net x 1
    fn construct_reservoir_biases(&mut self) -> StateMatrix;

    /// The input projection `W_in`, size_net x size_in
    fn construct_input_weight_matrix(&mut self) -> DMatrix<f64>;
}
