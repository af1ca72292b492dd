use anyhow::Result;

use predtable::{Prediction, ValidationTargets};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One synthetic model run: predictions that track the targets with the
/// given noise level, clamped into (0, 1).
fn run_model(targets: &[f64], noise: f64, rng: &mut SimpleRng) -> Vec<f64> {
    targets
        .iter()
        .map(|&y| {
            let p = 0.5 + (y - 0.5) * 0.6 + rng.gauss(0.0, noise);
            p.clamp(0.01, 0.99)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let n_rows = 200;

    let ids: Vec<String> = (0..n_rows).map(|i| format!("id{i:06}")).collect();
    let targets: Vec<f64> = (0..n_rows)
        .map(|_| if rng.next_f64() < 0.5 { 0.0 } else { 1.0 })
        .collect();

    let models = [("logistic", 0.05), ("forest", 0.15), ("coin", 0.45)];

    let mut prediction = Prediction::empty();
    for (name, noise) in models {
        let values = run_model(&targets, noise, &mut rng);
        let single = Prediction::from_model(ids.clone(), name, values)?;
        prediction.merge(&single)?;
    }

    let archive = "sample_predictions.parquet";
    prediction.save(archive)?;

    let submission = "sample_submission.csv";
    prediction.get("logistic")?.to_csv(submission)?;

    let validation = ValidationTargets::new(ids, targets)?;
    println!("{:<12}{:>10}{:>10}{:>10}", "model", "logloss", "acc", "ystd");
    for score in prediction.performance(&validation)? {
        println!(
            "{:<12}{:>10.4}{:>10.4}{:>10.4}",
            score.name, score.logloss, score.accuracy, score.ystd
        );
    }

    let pair = prediction.subset(&["logistic", "coin"])?;
    let dom = pair.dominance(&validation)?;
    println!(
        "dominance: {} vs {} -> {}",
        dom.first,
        dom.second,
        dom.winner().unwrap_or("tie")
    );

    println!(
        "Wrote {} rows x {} models to {archive} and model 'logistic' to {submission}",
        prediction.len(),
        prediction.names().len()
    );
    Ok(())
}
