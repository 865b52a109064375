use common::{Activation, RCParams};

use crate::error::{Precondition, Result};

/// The parameters of the conceptor network
#[derive(Debug, Clone, PartialEq)]
pub struct ReservoirConfig {
    /// Dimensionality of the driving input
    pub size_in: usize,
    /// Number of nodes in the reservoir
    pub size_net: usize,

    /// Controls the retention of information from previous time steps.
    /// The spectral radius determines how fast the influence of an input
    /// dies out in a reservoir with time, and how stable the reservoir
    /// activations are.
    pub spectral_radius: f64,
    /// Scales the input weight matrix
    pub input_scale: f64,
    /// Scales the reservoir biases
    pub bias_scale: f64,

    /// Tikhonov regularization of the readout weights `W_out`
    pub varrho_out: f64,
    /// Tikhonov regularization of the loaded reservoir weights `W`
    pub varrho_w: f64,

    /// Activation function of the reservoir state transition
    pub activation: Activation,
}

impl ReservoirConfig {
    /// A configuration with the given dimensions and the reference defaults
    /// for everything else
    pub fn new(size_in: usize, size_net: usize) -> Self {
        Self {
            size_in,
            size_net,
            spectral_radius: 1.5,
            input_scale: 1.5,
            bias_scale: 0.2,
            varrho_out: 0.01,
            varrho_w: 0.0001,
            activation: Activation::Tanh,
        }
    }

    /// Check that the network can be built and trained with these parameters
    pub fn validate(&self) -> Result<()> {
        if self.size_in == 0 {
            return Err(Precondition::InvalidConfig("size_in must be positive").into());
        }
        if self.size_net == 0 {
            return Err(Precondition::InvalidConfig("size_net must be positive").into());
        }
        for (v, msg) in [
            (self.spectral_radius, "spectral_radius must be finite and non-negative"),
            (self.input_scale, "input_scale must be finite and non-negative"),
            (self.bias_scale, "bias_scale must be finite and non-negative"),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(Precondition::InvalidConfig(msg).into());
            }
        }
        check_regularization(self.varrho_out)?;
        check_regularization(self.varrho_w)?;

        Ok(())
    }
}

/// Ridge coefficients must stay strictly positive so the gram matrix is invertible
pub(crate) fn check_regularization(varrho: f64) -> Result<()> {
    if varrho.is_finite() && varrho > 0.0 {
        Ok(())
    } else {
        Err(Precondition::InvalidRegularization(varrho).into())
    }
}

impl RCParams for ReservoirConfig {
    #[inline(always)]
    fn initial_state_value(&self) -> f64 {
        0.0
    }

    #[inline(always)]
    fn reservoir_size(&self) -> usize {
        self.size_net
    }

    #[inline(always)]
    fn input_dim(&self) -> usize {
        self.size_in
    }

    #[inline(always)]
    fn activation(&self) -> Activation {
        self.activation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConceptorError;

    #[test]
    fn defaults_are_valid() {
        let config = ReservoirConfig::new(1, 100);
        assert!(config.validate().is_ok());
        assert_eq!(config.reservoir_size(), 100);
        assert_eq!(config.input_dim(), 1);
        assert_eq!(config.activation(), Activation::Tanh);
    }

    #[test]
    fn zero_regularization_is_rejected() {
        let config = ReservoirConfig {
            varrho_w: 0.0,
            ..ReservoirConfig::new(1, 10)
        };
        assert_eq!(
            config.validate(),
            Err(ConceptorError::PreconditionViolation(Precondition::InvalidRegularization(0.0)))
        );

        let config = ReservoirConfig {
            varrho_out: f64::INFINITY,
            ..ReservoirConfig::new(1, 10)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_dimensions_are_rejected() {
        assert!(ReservoirConfig::new(0, 10).validate().is_err());
        assert!(ReservoirConfig::new(1, 0).validate().is_err());

        let config = ReservoirConfig {
            spectral_radius: f64::NAN,
            ..ReservoirConfig::new(1, 10)
        };
        assert!(config.validate().is_err());
    }
}
