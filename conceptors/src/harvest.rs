use common::hstack;
use nalgebra::{DMatrix, DVector};

use crate::{
    conceptor::decompose_correlation,
    error::{ConceptorError, Result},
};

/// Index of a driven pattern, in the order the patterns were driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(pub(crate) usize);

impl PatternId {
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What the reservoir went through while being driven by one pattern,
/// after the washout
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRecord {
    states: DMatrix<f64>,
    old_states: DMatrix<f64>,
    inputs: DMatrix<f64>,
    correlation: DMatrix<f64>,
    basis: DMatrix<f64>,
    singular_values: DVector<f64>,
}

impl PatternRecord {
    /// Build the record and the state correlation `X X^T / learn_length` along with its SVD
    pub(crate) fn new(
        states: DMatrix<f64>,
        old_states: DMatrix<f64>,
        inputs: DMatrix<f64>,
    ) -> Result<Self> {
        let learn_length = states.ncols() as f64;
        let correlation = &states * states.transpose() / learn_length;
        let correlation = (&correlation + correlation.transpose()) * 0.5;
        let (basis, singular_values) = decompose_correlation(&correlation)?;

        Ok(Self {
            states,
            old_states,
            inputs,
            correlation,
            basis,
            singular_values,
        })
    }

    /// Number of harvested time steps
    #[inline(always)]
    pub fn learn_length(&self) -> usize {
        self.states.ncols()
    }

    /// Harvested states `X`, size_net x learn_length
    #[inline(always)]
    pub fn states(&self) -> &DMatrix<f64> {
        &self.states
    }

    /// The states one step before those in `states`
    #[inline(always)]
    pub fn old_states(&self) -> &DMatrix<f64> {
        &self.old_states
    }

    /// Driving inputs `U`, size_in x learn_length
    #[inline(always)]
    pub fn inputs(&self) -> &DMatrix<f64> {
        &self.inputs
    }

    /// State correlation matrix `R`
    #[inline(always)]
    pub fn correlation(&self) -> &DMatrix<f64> {
        &self.correlation
    }

    /// Left singular vectors of `R`
    #[inline(always)]
    pub fn basis(&self) -> &DMatrix<f64> {
        &self.basis
    }

    /// Singular values of `R`
    #[inline(always)]
    pub fn singular_values(&self) -> &DVector<f64> {
        &self.singular_values
    }
}

fn stack_columns(
    context: &'static str,
    left: &DMatrix<f64>,
    right: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let mismatch = ConceptorError::ShapeMismatch {
        context,
        expected: (left.nrows(), right.ncols()),
        actual: right.shape(),
    };
    // an empty side would otherwise adopt the other's row count
    if left.nrows() != right.nrows() {
        return Err(mismatch);
    }
    hstack(left, right).ok_or(mismatch)
}

/// Harvested states, lagged states and inputs of all driven patterns,
/// concatenated column-wise in driving order
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    states: DMatrix<f64>,
    old_states: DMatrix<f64>,
    inputs: DMatrix<f64>,
}

impl TrainingData {
    pub(crate) fn new(size_net: usize, size_in: usize) -> Self {
        Self {
            states: DMatrix::zeros(size_net, 0),
            old_states: DMatrix::zeros(size_net, 0),
            inputs: DMatrix::zeros(size_in, 0),
        }
    }

    /// Append the columns of a record. Nothing changes if the row counts disagree.
    pub(crate) fn append(&mut self, record: &PatternRecord) -> Result<()> {
        let states = stack_columns("training states", &self.states, &record.states)?;
        let old_states =
            stack_columns("training old states", &self.old_states, &record.old_states)?;
        let inputs = stack_columns("training inputs", &self.inputs, &record.inputs)?;

        self.states = states;
        self.old_states = old_states;
        self.inputs = inputs;

        Ok(())
    }

    /// Total number of harvested time steps
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.states.ncols()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn states(&self) -> &DMatrix<f64> {
        &self.states
    }

    #[inline(always)]
    pub fn old_states(&self) -> &DMatrix<f64> {
        &self.old_states
    }

    #[inline(always)]
    pub fn inputs(&self) -> &DMatrix<f64> {
        &self.inputs
    }
}
