use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::warn;

use cgrecon::{
    config::reconstruct::read_config_file,
    gain, io,
    reconstruct::{reconstruct_batch, reconstruct_batch_sampled, Request},
    resources::ResourceSampler,
    utils::{comma_list, group_digits, timing::Progress},
    ReconstructionResult, Vector,
};

mod cli;
use cli::Cli;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let Cli { config, model, algorithm, signals, gain, out_dir, threads } = Cli::parse();

    let mut progress = Progress::new();

    progress.start(&format!("Reading config {config:?}"));
    let config = read_config_file(&config)?;
    progress.done();

    let n_threads = threads.unwrap_or(config.threads);
    rayon::ThreadPoolBuilder::new().num_threads(n_threads).build_global()?;

    progress.start(&format!("Loading {} models", config.models.len()));
    let store = config.load_models()?;
    progress.done_with_message(&format!("Loaded {}", comma_list(store.keys())));

    let samples_per_sensor = config.model(&model)
        .and_then(|m| m.samples_per_sensor)
        .or_else(|| gain::samples_per_sensor(&model));

    progress.start(&format!("Reading {} signals", signals.len()));
    let requests = signals.iter()
        .map(|path| -> Result<Request, Box<dyn Error>> {
            let signal = io::load_signal(path)?;
            let signal = if gain { apply_gain(signal, samples_per_sensor)? } else { signal };
            Ok(Request { model: model.clone(), signal, algorithm: algorithm.clone() })
        })
        .collect::<Result<Vec<_>, _>>()?;
    progress.done();

    progress.startln(&format!("Reconstructing with {n_threads} threads"));
    let results = match ResourceSampler::from_system() {
        Some(sampler) => reconstruct_batch_sampled(&store, &requests, &sampler),
        None => {
            warn!("CPU and memory usage cannot be measured on this platform");
            reconstruct_batch(&store, &requests)
        }
    };
    progress.done_with_message("Reconstructions finished");

    let out_dir = out_dir.or(config.output_dir).unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    let mut failures = 0;
    for (signal_path, result) in signals.iter().zip(results) {
        match result {
            Ok(result) => {
                let file = out_dir.join(image_file_name(&result, signal_path));
                result.image.write_png(&file)?;
                report(&result, &file);
            }
            Err(e) => {
                failures += 1;
                eprintln!("{signal_path:?}: {e}");
            }
        }
    }
    if failures > 0 {
        return Err(format!("{failures} of {} reconstructions failed", signals.len()).into())
    }
    Ok(())
}

fn apply_gain(signal: Vector, samples_per_sensor: Option<usize>) -> Result<Vector, Box<dyn Error>> {
    let samples = samples_per_sensor
        .ok_or("--gain needs `samples_per_sensor` for this model in the config file")?;
    Ok(gain::apply(signal.view(), samples)?)
}

/// `img_<algorithm>_<signal stem>.png`
fn image_file_name(result: &ReconstructionResult, signal: &Path) -> String {
    let stem = signal.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    format!("img_{}_{stem}.png", result.algorithm.to_string().to_lowercase())
}

fn report(result: &ReconstructionResult, file: &Path) {
    println!("{file:?}: {} {}, {} iterations ({:?}), {} µs",
             result.algorithm, result.pixel_size(), result.iterations, result.stop,
             group_digits(result.elapsed.as_micros()));
    if let Some(usage) = result.resources {
        println!("    CPU {:5.1}%   memory {:5.1}%", usage.cpu_percent, usage.memory_percent);
    }
}
