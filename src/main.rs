use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use traffic_forecast::{
    dataset, predict, series, train, CategoryEncoder, DatasetSplitter, PipelineConfig,
    RidgeRegressor, TimeSeriesReshaper,
};

// ---------- Config resolution ----------

fn load_config() -> Result<PipelineConfig> {
    let mut cfg = match std::env::var("PIPELINE_CONFIG") {
        Ok(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config at {}", path))?,
        Err(_) => PipelineConfig::default(),
    };
    if let Ok(p) = std::env::var("DATASET_PATH") {
        cfg.dataset_path = p;
    }
    if let Ok(p) = std::env::var("OUTPUT_PATH") {
        cfg.output_path = p;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = load_config()?;

    // ---------- Load + encode ----------

    tracing::info!("importing raw data from {}", cfg.dataset_path);
    let raw = dataset::load_observations(&cfg.dataset_path, cfg.hours)
        .with_context(|| format!("failed to read dataset {}", cfg.dataset_path))?;

    tracing::info!("reformatting data");
    let encoder = CategoryEncoder::new(cfg.categorical_fields.clone());
    let encoded = encoder.encode(&raw)?;
    tracing::info!(
        "encoded {} rows into {} columns ({} indicators)",
        encoded.table.n_rows(),
        encoded.table.columns().len(),
        encoded.schema.len()
    );

    // ---------- Split, train, evaluate ----------

    let mut splitter = DatasetSplitter::new(cfg.test_fraction);
    if let Some(seed) = cfg.seed {
        splitter = splitter.with_seed(seed);
    }
    let split = splitter.split(&encoded.table, &cfg.targets())?;

    tracing::info!("training");
    let model = train::train(
        &split.x_train,
        &split.y_train,
        encoder.fields(),
        RidgeRegressor::new(cfg.ridge_alpha),
    )?;
    let score = train::evaluate(&split.x_test, &split.y_test, &model)?;
    tracing::info!("score: {:.4}", score);

    if let Some(meta) = &cfg.meta_path {
        model
            .schema()
            .save(meta)
            .with_context(|| format!("failed to write model schema {}", meta))?;
        tracing::info!("model schema written to {}", meta);
    }

    if let Some(lines) = predict::sample_prediction(&raw, &model, &mut rand::thread_rng())? {
        for (target, actual, predicted) in lines {
            tracing::debug!("sample {}: actual={:?} predicted={:.1}", target, actual, predicted);
        }
    }

    // ---------- Generate + reshape ----------

    tracing::info!(
        "generating series for {} dates x {} locations x {} vehicle types",
        cfg.prediction_dates.len(),
        cfg.location_ids.len(),
        cfg.vehicle_types.len()
    );
    let generated = series::generate(
        &model,
        &cfg.prediction_dates,
        &cfg.location_ids,
        &cfg.vehicle_types,
    )?;

    let reshaper = TimeSeriesReshaper::new(
        cfg.vehicle_labels.clone(),
        cfg.location_names.clone(),
        cfg.hours,
    )?;
    let report = reshaper.reshape(&generated)?;
    if !report.skipped.is_empty() {
        tracing::warn!("{} report rows skipped", report.skipped.len());
    }

    dataset::write_report(&cfg.output_path, &report.rows)
        .with_context(|| format!("failed to write report {}", cfg.output_path))?;
    tracing::info!(
        "generated prediction data: {} ({} rows)",
        cfg.output_path,
        report.rows.len()
    );
    Ok(())
}
