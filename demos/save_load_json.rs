use mlp_classifier::{Activation, Dataset, Mlp, MlpConfig};

fn main() -> mlp_classifier::Result<()> {
    let xs = vec![
        vec![0.0, 0.0],
        vec![0.1, 0.2],
        vec![1.0, 0.9],
        vec![0.9, 1.0],
    ];
    let train = Dataset::from_rows(&xs, &[0, 0, 1, 1], 2)?;

    let mut cfg = MlpConfig::new(2, 2);
    cfg.hidden_layers = vec![4];
    cfg.activation = Activation::Sigmoid;
    cfg.lr = 0.1;
    cfg.batch_size = 4;
    cfg.report_every = 25;

    let mut mlp = Mlp::new(cfg)?;
    mlp.fit(&train, 100, false, 0)?;

    let path = std::env::temp_dir().join("mlp_classifier_demo.json");
    mlp.save_json(&path)?;
    println!("saved model to {}", path.display());

    let loaded = Mlp::load_json(&path)?;
    let before = mlp.predict(train.inputs_flat())?;
    let after = loaded.predict(train.inputs_flat())?;
    assert_eq!(before, after);
    println!("reloaded model reproduces all {} predictions", xs.len());

    Ok(())
}
