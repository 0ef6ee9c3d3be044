use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mlp_classifier::{Activation, Dataset, Mlp, MlpConfig};

fn main() -> mlp_classifier::Result<()> {
    // Tiny synthetic 3-class dataset in 2D.
    // Each class is a noisy blob around a different center.
    let mut rng = StdRng::seed_from_u64(0);

    let centers = [[-1.0_f64, -1.0], [1.0, -1.0], [0.0, 1.0]];
    let n_per_class = 128;

    let mut train_x = Vec::new();
    let mut train_y = Vec::new();
    let mut test_x = Vec::new();
    let mut test_y = Vec::new();

    for (class, center) in centers.iter().enumerate() {
        for i in 0..n_per_class {
            // Uniform noise is good enough for a learning example.
            let x0 = center[0] + rng.gen_range(-0.3..0.3);
            let x1 = center[1] + rng.gen_range(-0.3..0.3);

            // Hold out every fourth sample for testing.
            if i % 4 == 0 {
                test_x.push(vec![x0, x1]);
                test_y.push(class);
            } else {
                train_x.push(vec![x0, x1]);
                train_y.push(class);
            }
        }
    }

    let train = Dataset::from_rows(&train_x, &train_y, 3)?;
    let test = Dataset::from_rows(&test_x, &test_y, 3)?;

    let mut cfg = MlpConfig::new(2, 3);
    cfg.hidden_layers = vec![16];
    cfg.activation = Activation::Tanh;
    cfg.lr = 0.01;
    cfg.reg_lambda = 1e-4;
    cfg.batch_size = 32;
    cfg.report_every = 20;

    let mut mlp = Mlp::new(cfg)?;
    let report = mlp.fit(&train, 200, true, 0)?;

    for e in &report.epochs {
        println!(
            "epoch {:>3}: loss = {:.4}, accuracy = {:.3}",
            e.epoch, e.loss, e.accuracy
        );
    }

    println!("test accuracy: {:.3}", mlp.score(&test)?);
    Ok(())
}
