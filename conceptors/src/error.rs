use lin_reg::LinRegError;

/// Convenience alias used throughout this crate
pub type Result<T> = std::result::Result<T, ConceptorError>;

/// Everything that can go wrong while training or querying a conceptor network
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConceptorError {
    /// The dimensions of a matrix disagree with the network dimensions
    #[error("shape mismatch for {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// What was being checked
        context: &'static str,
        /// Expected (rows, cols)
        expected: (usize, usize),
        /// Actual (rows, cols)
        actual: (usize, usize),
    },

    /// A regularized inversion was still singular or ill-conditioned
    #[error("singular matrix: {0}")]
    SingularMatrix(#[from] LinRegError),

    /// A caller-side precondition does not hold
    #[error("precondition violated: {0}")]
    PreconditionViolation(Precondition),

    /// A harvested state lies on or beyond the boundary of the activation's range
    #[error("state value {value} at ({row}, {col}) is outside the invertible range of the activation")]
    NumericDomain {
        /// Row (neuron) of the offending value
        row: usize,
        /// Column (time step) of the offending value
        col: usize,
        /// The offending value
        value: f64,
    },

    /// Every evidence value of a test column is NaN, so there is no best match
    #[error("no finite evidence for test column {column}")]
    NonFiniteEvidence {
        /// The test column, or 0 for the pooled evidence
        column: usize,
    },

    /// A matrix decomposition did not converge
    #[error("{0} did not converge")]
    DecompositionFailed(&'static str),
}

/// The preconditions checked before any computation takes place
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Precondition {
    /// The washout swallows the whole pattern
    #[error("washout length {washout} must be smaller than the pattern length {len}")]
    WashoutTooLong {
        /// Requested washout length
        washout: usize,
        /// Total pattern length
        len: usize,
    },

    /// The aperture list does not have one entry per driven pattern
    #[error("{given} apertures given for {patterns} patterns")]
    ApertureCount {
        /// Number of apertures given
        given: usize,
        /// Number of driven patterns
        patterns: usize,
    },

    /// An aperture outside the accepted range
    #[error("aperture must be positive and not NaN, got {0}")]
    InvalidAperture(f64),

    /// Weights were requested before any pattern was driven
    #[error("no pattern has been driven through the reservoir")]
    NoPatterns,

    /// Aperture adaptation needs at least two candidate exponents
    #[error("at least 2 aperture candidates are needed, got {0}")]
    TooFewApertureCandidates(usize),

    /// A ridge coefficient that is zero, negative or not finite
    #[error("regularization coefficient must be positive and finite, got {0}")]
    InvalidRegularization(f64),

    /// A configuration field with an unusable value
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// No conceptor has been computed for this pattern index
    #[error("no conceptor computed for pattern {0}")]
    MissingConceptor(usize),

    /// Regeneration needs the trained `W` and `W_out`
    #[error("the reservoir weights have not been trained")]
    Untrained,

    /// An empty list of matrices, or a matrix without rows or columns
    #[error("no data given")]
    EmptyData,

    /// Interpolation knots that are too few, unordered or not finite
    #[error("need at least two finite, strictly increasing interpolation knots")]
    InvalidKnots,

    /// Spline evaluation outside of the knot range
    #[error("{x} lies outside the interpolation range [{lo}, {hi}]")]
    OutOfRange {
        /// The evaluation point
        x: f64,
        /// First knot
        lo: f64,
        /// Last knot
        hi: f64,
    },
}

impl From<Precondition> for ConceptorError {
    fn from(p: Precondition) -> Self {
        ConceptorError::PreconditionViolation(p)
    }
}
