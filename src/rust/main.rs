use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use ad_classifier::{AdInput, ClassificationService, PredictorKind, ServiceConfig};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(author, version, about = "Classify real-estate ads into listing categories", long_about = None)]
struct Args {
    /// Directory containing model.onnx, tokenizer.json and config.json
    #[arg(long, env = "AD_CLASSIFIER_MODEL_DIR", global = true)]
    model_dir: Option<PathBuf>,

    /// Predictor to use: model, heuristic or auto
    #[arg(long, env = "AD_CLASSIFIER_PREDICTOR", global = true)]
    predictor: Option<PredictorKind>,

    /// ONNX Runtime intra-op threads (0 lets the runtime decide)
    #[arg(long, global = true)]
    intra_threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a single ad
    Predict {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Classify every ad in a JSON file holding [{"title": ..., "description": ...}]
    Batch {
        input: PathBuf,
    },
    /// List the category taxonomy
    Categories,
    /// Report whether a predictor and the model are available
    Health,
    /// Classify a few sample ads and report timings
    Demo,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_service(args: &Args) -> Result<ClassificationService> {
    let mut config = ServiceConfig::from_env().context("Invalid AD_CLASSIFIER_* environment")?;
    if let Some(dir) = &args.model_dir {
        config.model_dir = dir.clone();
    }
    if let Some(kind) = args.predictor {
        config.predictor = kind;
    }
    if let Some(threads) = args.intra_threads {
        config.runtime.intra_threads = threads;
    }

    info!("Starting classifier (predictor: {}, model dir: {:?})", config.predictor, config.model_dir);
    Ok(ClassificationService::from_config(&config))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start_time = Instant::now();
    let service = build_service(&args)?;
    info!("Service ready in {:.2?} (predictor: {:?})", start_time.elapsed(), service.predictor_name());
    if let Some(model) = service.model_info() {
        info!("Model: {} ({} labels, max {} tokens)", model.model_path, model.num_labels, model.max_sequence_length);
    }

    match &args.command {
        Command::Predict { title, description } => {
            let ad = AdInput::new(title.as_str(), description.as_str());
            let result = service.predict_category_async(ad).await?;
            print_json(&result)?;
        }
        Command::Batch { input } => {
            let raw = fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
            let ads: Vec<AdInput> = serde_json::from_slice(&raw)
                .with_context(|| format!("{:?} is not a JSON list of ads", input))?;
            let results = service.predict_batch_async(ads).await?;
            print_json(&results)?;
        }
        Command::Categories => print_json(&service.categories())?,
        Command::Health => {
            let health = service.health();
            print_json(&health)?;
            if service.predictor_name().is_none() {
                bail!("No predictor available");
            }
        }
        Command::Demo => run_demo(&service).await?,
    }

    Ok(())
}

async fn run_demo(service: &ClassificationService) -> Result<()> {
    let test_ads = vec![
        AdInput::new("اجاره مغازه در مرکز شهر", "مغازه 50 متری در مرکز خرید با موقعیت عالی"),
        AdInput::new("فروش آپارتمان 2 خوابه", "آپارتمان 80 متری در ونک با قیمت مناسب"),
        AdInput::new("اجاره دفتر اداری", "دفتر 100 متری در مرکز شهر آماده تحویل"),
    ];

    info!("=== Running Classifications ({} inputs) ===", test_ads.len());
    let classify_start = Instant::now();

    for (i, ad) in test_ads.iter().enumerate() {
        let result = service.predict_category_async(ad.clone()).await?;
        println!("\nAd {}:", i + 1);
        println!("  Title: {}", ad.title);
        println!("  Description: {}", ad.description);
        println!("  Category: {} ({})", result.category_name, result.category);
        println!("  Confidence: {:.2}", result.confidence);
    }

    let single_time = classify_start.elapsed();
    let batch_start = Instant::now();
    let batch_results = service.predict_batch_async(test_ads.clone()).await?;
    let batch_time = batch_start.elapsed();

    println!("\nBatch:");
    for (i, result) in batch_results.iter().enumerate() {
        println!("  Ad {}: {} ({:.2})", i + 1, result.category_name, result.confidence);
    }

    info!("=== Demo Complete ===");
    info!("Single predictions: {:.2?}", single_time);
    info!("Batch prediction: {:.2?}", batch_time);
    info!("Average time per classification: {:.2?}", single_time / test_ads.len() as u32);
    Ok(())
}
