//! Synthetic benchmark log generation.
//!
//! Produces logs shaped like the real benchmark harness output: one header,
//! one line per (operation, structure, size) measurement, timings that follow
//! each pair's theoretical complexity with multiplicative noise. Optionally
//! injects corrupt lines so the sanitizer has something to chew on.

use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Operation, Structure};
use crate::error::AppError;
use crate::models::{feature_value, theoretical_feature};

/// Nanoseconds per theoretical feature unit.
const TIME_SCALE_NS: f64 = 15.0;
/// Bytes per stored entry, plus a fixed allocator baseline.
const MEMORY_PER_ENTRY: f64 = 48.0;
const MEMORY_BASE: f64 = 4096.0;
/// Sparsity written to every row.
const SPARSITY: f64 = 0.01;

const HEADER: &str = "Operacao,Estrutura,k,Esparsidade,Tempo_ns,Memoria_Bytes";

/// Structure labels as the harness writes them (pre-alias form).
fn structure_label(st: Structure) -> &'static str {
    match st {
        Structure::Hash => "Est1(Hash)",
        Structure::Tree => "Est2(Tree)",
    }
}

#[derive(Debug, Clone)]
pub struct SynthSpec {
    pub seed: u64,
    /// Stored-entry counts to measure at.
    pub sizes: Vec<u64>,
    /// Log-space noise sigma applied multiplicatively to each timing.
    pub noise: f64,
    /// Insert one corrupt line after every N clean ones.
    pub corrupt_every: Option<usize>,
}

impl Default for SynthSpec {
    fn default() -> Self {
        Self {
            seed: 42,
            sizes: vec![100, 500, 1000, 5000, 10000, 50000],
            noise: 0.05,
            corrupt_every: None,
        }
    }
}

/// A generated log plus the line accounting needed to check the sanitizer
/// against it.
#[derive(Debug, Clone)]
pub struct SynthLog {
    pub contents: String,
    /// Non-header lines written (clean + corrupt).
    pub data_lines: usize,
    pub corrupt_lines: usize,
}

/// Generate a synthetic benchmark log in memory.
pub fn generate_log(spec: &SynthSpec) -> Result<SynthLog, AppError> {
    if spec.sizes.is_empty() {
        return Err(AppError::new(2, "Synthetic log needs at least one size."));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(AppError::new(2, "Synthetic noise must be finite and >= 0."));
    }
    if spec.corrupt_every == Some(0) {
        return Err(AppError::new(2, "Corruption interval must be >= 1."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut contents = String::new();
    contents.push_str(HEADER);
    contents.push('\n');

    let mut data_lines = 0usize;
    let mut corrupt_lines = 0usize;
    let mut clean_since_corrupt = 0usize;

    for st in [Structure::Hash, Structure::Tree] {
        for op in Operation::ALL {
            let feature = theoretical_feature(op.log_token(), st.log_token());
            for &k in &spec.sizes {
                let base = TIME_SCALE_NS * feature_value(feature, k as f64);
                let z: f64 = normal.sample(&mut rng);
                let elapsed = base * (spec.noise * z).exp();
                let memory = (MEMORY_BASE + MEMORY_PER_ENTRY * k as f64) as u64;

                contents.push_str(&format!(
                    "{},{},{},{},{:.1},{}\n",
                    op.log_token(),
                    structure_label(st),
                    k,
                    SPARSITY,
                    elapsed,
                    memory
                ));
                data_lines += 1;
                clean_since_corrupt += 1;

                if let Some(every) = spec.corrupt_every {
                    if clean_since_corrupt >= every {
                        clean_since_corrupt = 0;
                        contents.push_str(corrupt_line(corrupt_lines));
                        contents.push('\n');
                        data_lines += 1;
                        corrupt_lines += 1;
                    }
                }
            }
        }
    }

    Ok(SynthLog {
        contents,
        data_lines,
        corrupt_lines,
    })
}

/// Cycle through the malformation kinds the sanitizer must reject.
fn corrupt_line(i: usize) -> &'static str {
    match i % 3 {
        0 => "SOMA,Est1(Hash),1024",
        1 => "MULT,Est2(Tree),big,fast,?,0",
        _ => HEADER,
    }
}

/// Generate a synthetic log and write it to `path`.
pub fn write_synthetic_log(path: &Path, spec: &SynthSpec) -> Result<SynthLog, AppError> {
    let log = generate_log(spec)?;
    std::fs::write(path, &log.contents).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to write synthetic log '{}': {e}", path.display()),
        )
    })?;
    Ok(log)
}
