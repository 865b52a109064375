use common::{Activation, RCParams};
use lin_reg::{LinReg, TikhonovRegularization};
use nalgebra::{Const, DMatrix, Dyn, Matrix, Storage};

use crate::{
    config::check_regularization,
    conceptor::{compute_projector, Conceptor},
    error::{ConceptorError, Precondition, Result},
    harvest::{PatternId, PatternRecord, TrainingData},
    ReservoirConfig, ReservoirConstructor, StateMatrix,
};

/// The fixed random weights of a reservoir
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSet {
    /// Recurrent weights `W_star`, size_net x size_net
    pub w_star: DMatrix<f64>,
    /// Input weights `W_in`, size_net x size_in
    pub w_in: DMatrix<f64>,
    /// Biases `W_bias`, size_net x 1
    pub w_bias: StateMatrix,
}

impl WeightSet {
    /// Advance the state by one step: `act(W_star * state + W_in * input + W_bias)`
    pub fn step<S>(
        &self,
        activation: Activation,
        state: &StateMatrix,
        input: &Matrix<f64, Dyn, Const<1>, S>,
    ) -> StateMatrix
    where
        S: Storage<f64, Dyn, Const<1>>,
    {
        let mut next: StateMatrix = &self.w_star * state + &self.w_in * input + &self.w_bias;
        activation.activate(next.as_mut_slice());

        next
    }
}

/// A conceptor network: a fixed random reservoir together with everything
/// learned from the patterns driven through it
#[derive(Debug, Clone)]
pub struct Reservoir {
    config: ReservoirConfig,
    weights: WeightSet,
    /// Readout weights, size_in x size_net
    w_out: Option<DMatrix<f64>>,
    /// Loaded reservoir weights, size_net x size_net
    w: Option<DMatrix<f64>>,
    patterns: Vec<PatternRecord>,
    training_data: TrainingData,
    conceptors: Vec<Conceptor>,
}

fn check_shape(context: &'static str, m: &DMatrix<f64>, expected: (usize, usize)) -> Result<()> {
    if m.shape() == expected {
        Ok(())
    } else {
        Err(ConceptorError::ShapeMismatch {
            context,
            expected,
            actual: m.shape(),
        })
    }
}

/// Ridge regression of the readout `W_out` mapping harvested states onto their driving inputs
fn fit_w_out(data: &TrainingData, varrho_out: f64) -> Result<DMatrix<f64>> {
    check_regularization(varrho_out)?;
    if data.is_empty() {
        return Err(Precondition::NoPatterns.into());
    }

    let regressor = TikhonovRegularization {
        regularization_coeff: varrho_out,
    };
    Ok(regressor.fit_readout(data.states(), data.inputs())?)
}

/// Ridge regression of the recurrent weights `W` that reproduce, from the
/// previous state alone, what `W_star` and the input produced together
fn fit_w(
    data: &TrainingData,
    activation: Activation,
    bias: &StateMatrix,
    varrho_w: f64,
) -> Result<DMatrix<f64>> {
    check_regularization(varrho_w)?;
    if data.is_empty() {
        return Err(Precondition::NoPatterns.into());
    }

    let mut targets = data.states().clone();
    if let Err(i) = activation.invert(targets.as_mut_slice()) {
        let nrows = targets.nrows();
        let value = data.states()[i];
        warn!("harvested state {} cannot be passed through the inverse activation", value);
        return Err(ConceptorError::NumericDomain {
            row: i % nrows,
            col: i / nrows,
            value,
        });
    }
    for mut col in targets.column_iter_mut() {
        col -= bias;
    }

    let regressor = TikhonovRegularization {
        regularization_coeff: varrho_w,
    };
    Ok(regressor.fit_readout(data.old_states(), &targets)?)
}

impl Reservoir {
    /// Create a new reservoir, with the weights generated by `reservoir_constructor`
    pub fn new<C>(config: ReservoirConfig, mut reservoir_constructor: C) -> Result<Self>
    where
        C: ReservoirConstructor,
    {
        config.validate()?;
        let w_star = reservoir_constructor.construct_reservoir_weights();
        let w_in = reservoir_constructor.construct_input_weight_matrix();
        let w_bias = reservoir_constructor.construct_reservoir_biases();

        Self::from_weights(config, WeightSet { w_star, w_in, w_bias })
    }

    /// Create a reservoir from already existing weights
    pub fn from_weights(config: ReservoirConfig, weights: WeightSet) -> Result<Self> {
        config.validate()?;
        let (n, k) = (config.size_net, config.size_in);
        check_shape("W_star", &weights.w_star, (n, n))?;
        check_shape("W_in", &weights.w_in, (n, k))?;
        if weights.w_bias.shape() != (n, 1) {
            return Err(ConceptorError::ShapeMismatch {
                context: "W_bias",
                expected: (n, 1),
                actual: weights.w_bias.shape(),
            });
        }
        info!("created reservoir with {} inputs and {} neurons", k, n);
        trace!("W_star: {}\nW_in: {}\nW_bias: {}", weights.w_star, weights.w_in, weights.w_bias);

        Ok(Self {
            training_data: TrainingData::new(n, k),
            config,
            weights,
            w_out: None,
            w: None,
            patterns: Vec::new(),
            conceptors: Vec::new(),
        })
    }

    /// Advance `state` by one step of the driven reservoir dynamics
    pub fn update_state(&self, state: &StateMatrix, input: &StateMatrix) -> Result<StateMatrix> {
        if state.nrows() != self.config.size_net {
            return Err(ConceptorError::ShapeMismatch {
                context: "state",
                expected: (self.config.size_net, 1),
                actual: state.shape(),
            });
        }
        if input.nrows() != self.config.size_in {
            return Err(ConceptorError::ShapeMismatch {
                context: "input",
                expected: (self.config.size_in, 1),
                actual: input.shape(),
            });
        }

        Ok(self.weights.step(self.config.activation, state, input))
    }

    /// Drive the reservoir from the zero state with `pattern` and collect what it
    /// went through after the first `washout_length` steps, without recording anything.
    ///
    /// # Arguments
    /// pattern: size_in x total_length, one input per column
    /// washout_length: Number of initial steps to discard, smaller than total_length
    pub fn harvest(&self, pattern: &DMatrix<f64>, washout_length: usize) -> Result<PatternRecord> {
        if pattern.nrows() != self.config.size_in {
            return Err(ConceptorError::ShapeMismatch {
                context: "pattern",
                expected: (self.config.size_in, pattern.ncols()),
                actual: pattern.shape(),
            });
        }
        let total_length = pattern.ncols();
        if washout_length >= total_length {
            return Err(Precondition::WashoutTooLong {
                washout: washout_length,
                len: total_length,
            }
            .into());
        }
        let learn_length = total_length - washout_length;
        let n = self.config.size_net;

        let mut x_collector: DMatrix<f64> = DMatrix::zeros(n, learn_length);
        let mut x_old_collector: DMatrix<f64> = DMatrix::zeros(n, learn_length);
        let mut p_collector: DMatrix<f64> = DMatrix::zeros(self.config.size_in, learn_length);

        let mut x: StateMatrix =
            StateMatrix::from_element(n, self.config.initial_state_value());
        for i in 0..total_length {
            let u = pattern.column(i);
            let x_new = self.weights.step(self.config.activation, &x, &u);

            // discard earlier values, as the state has to stabilize first
            if i >= washout_length {
                let j = i - washout_length;
                x_collector.set_column(j, &x_new);
                x_old_collector.set_column(j, &x);
                p_collector.set_column(j, &u);
            }
            x = x_new;
        }

        PatternRecord::new(x_collector, x_old_collector, p_collector)
    }

    /// Harvest `pattern` and record it, appending its states to the training data
    pub fn drive(&mut self, pattern: &DMatrix<f64>, washout_length: usize) -> Result<PatternId> {
        let record = self.harvest(pattern, washout_length)?;
        self.training_data.append(&record)?;
        self.patterns.push(record);

        let id = PatternId(self.patterns.len() - 1);
        debug!(
            "drove pattern {} for {} steps, {} training columns in total",
            id.index(),
            pattern.ncols(),
            self.training_data.len()
        );

        Ok(id)
    }

    /// Compute the conceptor of the correlation matrix `r` at aperture `alpha`
    /// and append it to the stored conceptors
    pub fn compute_projector(&mut self, r: &DMatrix<f64>, alpha: f64) -> Result<&Conceptor> {
        let n = self.config.size_net;
        check_shape("correlation matrix", r, (n, n))?;

        let conceptor = compute_projector(r, alpha)?;
        self.conceptors.push(conceptor);

        Ok(&self.conceptors[self.conceptors.len() - 1])
    }

    /// Replace the stored conceptors with one per driven pattern, pattern `i`
    /// using aperture `alphas[i]`
    pub fn compute_projectors(&mut self, alphas: &[f64]) -> Result<&[Conceptor]> {
        if alphas.len() != self.patterns.len() {
            return Err(Precondition::ApertureCount {
                given: alphas.len(),
                patterns: self.patterns.len(),
            }
            .into());
        }

        let conceptors = self
            .patterns
            .iter()
            .zip(alphas.iter())
            .map(|(p, alpha)| compute_projector(p.correlation(), *alpha))
            .collect::<Result<Vec<_>>>()?;
        info!("computed {} conceptors", conceptors.len());
        self.conceptors = conceptors;

        Ok(&self.conceptors)
    }

    /// Fit the readout weights `W_out` so the reservoir states reproduce their inputs
    pub fn compute_w_out(&mut self, varrho_out: f64) -> Result<&DMatrix<f64>> {
        let w_out = fit_w_out(&self.training_data, varrho_out)?;
        debug!("W_out dims: ({}, {})", w_out.nrows(), w_out.ncols());

        Ok(self.w_out.insert(w_out))
    }

    /// Fit the loaded reservoir weights `W`, absorbing the input drive into the recurrence
    pub fn compute_w(&mut self, varrho_w: f64) -> Result<&DMatrix<f64>> {
        let w = fit_w(
            &self.training_data,
            self.config.activation,
            &self.weights.w_bias,
            varrho_w,
        )?;
        debug!("W dims: ({}, {})", w.nrows(), w.ncols());

        Ok(self.w.insert(w))
    }

    /// Drive every pattern, in order, with the same washout and fit `W_out` and `W`
    /// with the configured regularization. Nothing is recorded unless all steps succeed.
    pub fn train(&mut self, patterns: &[DMatrix<f64>], washout_length: usize) -> Result<()> {
        let records = patterns
            .iter()
            .map(|p| self.harvest(p, washout_length))
            .collect::<Result<Vec<_>>>()?;

        let mut training_data = self.training_data.clone();
        for record in records.iter() {
            training_data.append(record)?;
        }
        let w_out = fit_w_out(&training_data, self.config.varrho_out)?;
        let w = fit_w(
            &training_data,
            self.config.activation,
            &self.weights.w_bias,
            self.config.varrho_w,
        )?;

        self.patterns.extend(records);
        self.training_data = training_data;
        self.w_out = Some(w_out);
        self.w = Some(w);
        info!(
            "trained on {} patterns, {} training columns",
            self.patterns.len(),
            self.training_data.len()
        );

        Ok(())
    }

    /// Run the loaded reservoir autonomously, constrained by the conceptor of pattern `id`:
    /// `x = C * act(W * x + W_bias)`, reading out `W_out * x`.
    ///
    /// # Returns
    /// The size_in x length outputs after the first `washout_length` steps
    pub fn regenerate(
        &self,
        id: PatternId,
        length: usize,
        washout_length: usize,
    ) -> Result<DMatrix<f64>> {
        let (w, w_out) = match (&self.w, &self.w_out) {
            (Some(w), Some(w_out)) => (w, w_out),
            _ => return Err(Precondition::Untrained.into()),
        };
        let c = self
            .conceptors
            .get(id.index())
            .ok_or(Precondition::MissingConceptor(id.index()))?
            .matrix();

        let mut outputs: DMatrix<f64> = DMatrix::zeros(self.config.size_in, length);
        let mut x: StateMatrix =
            StateMatrix::from_element(self.config.size_net, self.config.initial_state_value());
        for i in 0..washout_length + length {
            let mut z: StateMatrix = w * &x + &self.weights.w_bias;
            self.config.activation.activate(z.as_mut_slice());
            x = c * z;

            if i >= washout_length {
                outputs.set_column(i - washout_length, &(w_out * &x));
            }
        }

        Ok(outputs)
    }

    /// Forget every driven pattern, the training data, the trained weights and the conceptors.
    /// The fixed random weights are kept.
    pub fn clear_storage(&mut self) {
        self.w_out = None;
        self.w = None;
        self.patterns.clear();
        self.training_data = TrainingData::new(self.config.size_net, self.config.size_in);
        self.conceptors.clear();
    }

    #[inline(always)]
    pub fn config(&self) -> &ReservoirConfig {
        &self.config
    }

    #[inline(always)]
    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    /// Number of patterns driven since creation or the last `clear_storage`
    #[inline(always)]
    pub fn num_pattern(&self) -> usize {
        self.patterns.len()
    }

    /// Ids of the driven patterns, in driving order
    pub fn pattern_ids(&self) -> impl Iterator<Item = PatternId> {
        (0..self.patterns.len()).map(PatternId)
    }

    #[inline(always)]
    pub fn patterns(&self) -> &[PatternRecord] {
        &self.patterns
    }

    #[inline(always)]
    pub fn pattern(&self, id: PatternId) -> Option<&PatternRecord> {
        self.patterns.get(id.index())
    }

    #[inline(always)]
    pub fn training_data(&self) -> &TrainingData {
        &self.training_data
    }

    #[inline(always)]
    pub fn conceptors(&self) -> &[Conceptor] {
        &self.conceptors
    }

    #[inline(always)]
    pub fn conceptor(&self, id: PatternId) -> Option<&Conceptor> {
        self.conceptors.get(id.index())
    }

    #[inline(always)]
    pub fn w_out(&self) -> Option<&DMatrix<f64>> {
        self.w_out.as_ref()
    }

    #[inline(always)]
    pub fn w(&self) -> Option<&DMatrix<f64>> {
        self.w.as_ref()
    }
}
