use candle_core::{DType, Device};
use imgzoo::model::checkpoint::safetensors_sibling;
use imgzoo::zoo::{self, entry_point, tables, LoadOptions, QUALITIES};
use imgzoo::{Architecture, CompressionModel, Config, Error};

fn offline_config(dir: &std::path::Path) -> Config {
    let mut config = Config::with_data_dir(dir).unwrap();
    config.root_url = "http://127.0.0.1:9/models/v1".to_string();
    config
}

#[test]
fn every_architecture_builds_at_every_quality() {
    let options = LoadOptions::default();

    for arch in Architecture::ALL {
        for quality in QUALITIES {
            let model = zoo::load_model(arch.name(), "mse", quality, &options).unwrap();

            assert_eq!(model.architecture(), arch);
            assert_eq!(Some(model.hyperparameters()), tables::cfg(arch, quality));
        }
    }
}

#[test]
fn factorized_quality_three_uses_default_widths() {
    let model = imgzoo::bmshj2018_factorized(3, "mse", &LoadOptions::default()).unwrap();

    assert_eq!(model.hyperparameters(), (128, 192));
    assert_eq!(model.tensor("g_a.0.weight").unwrap().dims(), &[128, 3, 5, 5]);
    assert_eq!(model.tensor("g_a.6.weight").unwrap().dims(), &[192, 128, 5, 5]);
}

#[test]
fn unregistered_architecture_is_rejected() {
    let err = zoo::load_model("cheng2020-attn", "mse", 3, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidArchitecture(name) if name == "cheng2020-attn"));
}

#[test]
fn out_of_range_quality_is_rejected_everywhere() {
    let options = LoadOptions::default();

    for arch in Architecture::ALL {
        for quality in [0, 9] {
            let err = entry_point(arch)(quality, "mse", &options).unwrap_err();
            assert!(matches!(err, Error::QualityOutOfRange(q) if q == quality));

            let err = zoo::load_model(arch.name(), "mse", quality, &options).unwrap_err();
            assert!(matches!(err, Error::InvalidQuality(q) if q == quality));
        }
    }
}

#[test]
fn non_mse_metric_is_rejected_everywhere() {
    let options = LoadOptions::default();

    for arch in Architecture::ALL {
        for metric in ["ms-ssim", "MSE", ""] {
            let err = entry_point(arch)(3, metric, &options).unwrap_err();
            assert!(matches!(err, Error::InvalidMetric(m) if m == metric));
        }
    }
}

#[test]
fn unpublished_weights_are_not_available() {
    let dir = tempfile::tempdir().unwrap();
    let options = LoadOptions::default()
        .pretrained(true)
        .progress(false)
        .config(offline_config(dir.path()));

    for quality in QUALITIES {
        let err = imgzoo::bmshj2018_hyperprior(quality, "mse", &options).unwrap_err();
        assert!(matches!(err, Error::PretrainedUnavailable));
        assert_eq!(err.to_string(), "Pre-trained model not yet available");
    }

    for arch in [Architecture::Mbt2018Mean, Architecture::Mbt2018] {
        let err = entry_point(arch)(1, "mse", &options).unwrap_err();
        assert!(matches!(err, Error::PretrainedUnavailable));
    }

    let err = zoo::load_model("bmshj2018-factorized", "ms-ssim", 1, &options).unwrap_err();
    assert!(matches!(err, Error::PretrainedUnavailable));
}

#[test]
fn pretrained_weights_load_from_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());

    let file_name = tables::pretrained_filename(
        Architecture::Bmshj2018Factorized,
        imgzoo::Metric::Mse,
        6,
    )
    .unwrap();
    let cached = config.checkpoints_dir.join(file_name);
    std::fs::write(&cached, b"placeholder").unwrap();

    let published =
        CompressionModel::new(Architecture::Bmshj2018Factorized, 192, 320, &Device::Cpu, DType::F32)
            .unwrap();
    published.save_safetensors(safetensors_sibling(&cached)).unwrap();

    let options = LoadOptions::default()
        .pretrained(true)
        .progress(false)
        .config(config);
    let model = imgzoo::bmshj2018_factorized(6, "mse", &options).unwrap();

    assert_eq!(model.hyperparameters(), (192, 320));
    assert_eq!(model.num_parameters(), published.num_parameters());

    let expected = published.tensor("g_s.6.weight").unwrap().flatten_all().unwrap();
    let actual = model.tensor("g_s.6.weight").unwrap().flatten_all().unwrap();
    assert_eq!(
        expected.to_vec1::<f32>().unwrap(),
        actual.to_vec1::<f32>().unwrap()
    );
}

#[test]
fn local_checkpoint_infers_hyperparameters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("finetuned.safetensors");

    CompressionModel::new(Architecture::Mbt2018, 64, 96, &Device::Cpu, DType::F32)
        .unwrap()
        .save_safetensors(&path)
        .unwrap();

    let model = zoo::load_checkpoint(Architecture::Mbt2018, &path, &Device::Cpu, DType::F32).unwrap();
    assert_eq!(model.hyperparameters(), (64, 96));
    assert_eq!(model.tensor("context_prediction.weight").unwrap().dims(), &[192, 96, 5, 5]);
}
