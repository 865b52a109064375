use crate::Activation;

/// Any reservoir parameter struct must implement this.
pub trait RCParams {
    /// The value of the initial state
    fn initial_state_value(&self) -> f64;

    /// The number of inner nodes (`neurons`) in the network
    fn reservoir_size(&self) -> usize;

    /// The dimensionality of the driving input
    fn input_dim(&self) -> usize;

    /// The activation applied in every state transition
    fn activation(&self) -> Activation;
}
