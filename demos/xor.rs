use mlp_classifier::{argmax, Activation, Dataset, Mlp, MlpConfig};

fn main() -> mlp_classifier::Result<()> {
    // Classic XOR, phrased as 2-class classification.
    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let ys = [0, 1, 1, 0];
    let train = Dataset::from_rows(&xs, &ys, 2)?;

    // 2 -> 8 -> 2 network with a tanh hidden layer.
    let mut cfg = MlpConfig::new(2, 2);
    cfg.hidden_layers = vec![8];
    cfg.activation = Activation::Tanh;
    cfg.lr = 0.1;
    cfg.reg_lambda = 0.0;
    cfg.batch_size = 4;
    cfg.report_every = 500;

    let mut mlp = Mlp::new(cfg)?;
    let report = mlp.fit(&train, 2_000, false, 0)?;

    for e in &report.epochs {
        println!(
            "epoch {:>4}: loss = {:.4}, accuracy = {:.2}",
            e.epoch, e.loss, e.accuracy
        );
    }

    for (x, &y) in xs.iter().zip(&ys) {
        let probs = mlp.predict(x)?;
        println!(
            "x={x:?} -> class {} (p={:.3}), expected {y}",
            argmax(&probs),
            probs[argmax(&probs)]
        );
    }

    Ok(())
}
