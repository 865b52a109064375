#[macro_use]
extern crate log;

use std::time::Instant;

use conceptors::{
    recognition_predict, recognition_train, ConceptorError, ESNConstructor, OutputMode, PatternId,
    Phi, Reservoir, ReservoirConfig,
};
use nalgebra::DMatrix;
use time_series_generator::generate_sine_wave;

const SEED: Option<u64> = Some(0);
const RESERVOIR_SIZE: usize = 100;
const WASHOUT: usize = 100;
const LEARN_LEN: usize = 500;
const APERTURE: f64 = 10.0;
const APERTURE_CANDIDATES: usize = 9;
const PERIODS: [usize; 2] = [9, 14];

/// A 1 x len matrix repeating a single sine period
fn sine_pattern(period: usize, phase: usize, len: usize) -> DMatrix<f64> {
    let wave: Vec<f64> = generate_sine_wave(period);
    DMatrix::from_fn(1, len, |_, j| wave[(j + phase) % wave.len()])
}

/// Normalized root mean squared error of `output` against the best circular shift of `wave`
fn phase_aligned_nrmse(output: &DMatrix<f64>, wave: &DMatrix<f64>) -> f64 {
    let period = wave.ncols();
    let var = wave.variance().max(f64::EPSILON);
    (0..period)
        .map(|shift| {
            let mse = output
                .iter()
                .enumerate()
                .map(|(j, y)| (y - wave[(0, (j + shift) % period)]).powi(2))
                .sum::<f64>()
                / output.len() as f64;
            (mse / var).sqrt()
        })
        .fold(f64::INFINITY, f64::min)
}

pub(crate) fn main() -> Result<(), ConceptorError> {
    pretty_env_logger::init();

    let config = ReservoirConfig::new(1, RESERVOIR_SIZE);
    let constructor = ESNConstructor::from_config(SEED, &config);
    let mut rc = Reservoir::new(config, constructor)?;

    let patterns: Vec<DMatrix<f64>> = PERIODS
        .iter()
        .map(|p| sine_pattern(*p, 0, WASHOUT + LEARN_LEN))
        .collect();
    info!("got {} patterns of {} datapoints", patterns.len(), WASHOUT + LEARN_LEN);

    let t0 = Instant::now();
    rc.train(&patterns, WASHOUT)?;
    info!("loading the reservoir took {}ms", t0.elapsed().as_millis());

    rc.compute_projectors(&vec![APERTURE; rc.num_pattern()])?;
    let ids: Vec<PatternId> = rc.pattern_ids().collect();
    for (id, period) in ids.into_iter().zip(PERIODS.iter()) {
        let output = rc.regenerate(id, 4 * period, WASHOUT)?;
        let wave = sine_pattern(*period, 0, *period);
        info!(
            "period {}: regeneration nrmse {:.4}",
            period,
            phase_aligned_nrmse(&output, &wave)
        );
    }

    // Classify fresh segments of each sine by their state statistics
    let training_states: Vec<DMatrix<f64>> =
        rc.patterns().iter().map(|p| p.states().clone()).collect();
    let t0 = Instant::now();
    let adaptation = recognition_train(
        &training_states,
        APERTURE_CANDIDATES,
        OutputMode::Complete,
        &Phi,
    )?;
    info!(
        "aperture adaptation took {}ms, shared aperture: {:.3}",
        t0.elapsed().as_millis(),
        adaptation.aperture
    );
    if let Some(diagnostics) = &adaptation.diagnostics {
        debug!("per class apertures: {:?}", diagnostics.apertures);
    }

    let mut correct = 0;
    let mut total = 0;
    for (class, period) in PERIODS.iter().enumerate() {
        for phase in 1..=5 {
            let segment = sine_pattern(*period, phase, WASHOUT + 50);
            let record = rc.harvest(&segment, WASHOUT)?;
            let (predicted, evidence) = recognition_predict(record.states(), &adaptation.conceptors)?;
            debug!("class {}, phase {}: evidence {}", class, phase, evidence.transpose());
            if predicted == class {
                correct += 1;
            }
            total += 1;
        }
    }
    info!("recognized {} / {} held out segments", correct, total);

    Ok(())
}
