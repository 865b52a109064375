/// The possible activation functions of a reservoir state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// The identity function, giving a linear reservoir
    Identity,
    /// The hyperbolic tangent
    #[default]
    Tanh,
}

impl Activation {
    /// Perform the activation function over all elements
    pub fn activate(&self, vals: &mut [f64]) {
        match self {
            Activation::Identity => {}
            Activation::Tanh => {
                for v in vals {
                    *v = v.tanh();
                }
            }
        }
    }

    /// Undo the activation function over all elements.
    ///
    /// Returns the index of the first element outside the open range of the
    /// activation, in which case the values are left partially inverted.
    pub fn invert(&self, vals: &mut [f64]) -> Result<(), usize> {
        match self {
            Activation::Identity => Ok(()),
            Activation::Tanh => {
                for (i, v) in vals.iter_mut().enumerate() {
                    // atanh diverges at the boundary of (-1, 1)
                    if v.is_nan() || v.abs() >= 1.0 {
                        return Err(i);
                    }
                    *v = v.atanh();
                }
                Ok(())
            }
        }
    }
}
