mod cli;

use anyhow::Context;
use candle_core::Device;
use clap::Parser;
use cli::{Cli, Commands};
use imgzoo::error::{Error, Result};
use imgzoo::model::checkpoint;
use imgzoo::model::{Architecture, CheckpointRegistry, CheckpointRequest, Metric, WeightDownloader};
use imgzoo::zoo::{self, tables, LoadOptions};
use imgzoo::{CompressionModel, Config};

fn parse_device(device_str: &str) -> Result<Device> {
    match device_str {
        "cpu" => Ok(Device::Cpu),
        s if s.starts_with("cuda") => {
            let parts: Vec<&str> = s.split(':').collect();
            let ordinal = if parts.len() > 1 {
                parts[1]
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidInput(format!("Invalid CUDA device: {}", s)))?
            } else {
                0
            };
            Device::new_cuda(ordinal).map_err(|e| {
                Error::ConfigError(format!("Failed to initialize CUDA device: {}", e))
            })
        }
        _ => Err(Error::InvalidInput(format!("Unknown device: {}", device_str))),
    }
}

fn format_qualities(qualities: &[u8]) -> String {
    if qualities.is_empty() {
        return "none".to_string();
    }
    qualities
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { installed: false } => {
            println!("Available models:\n");
            for arch in Architecture::ALL {
                println!("  {} ({})", arch, arch.model_name());
                for quality in tables::qualities(arch) {
                    if let Some((n, m)) = tables::cfg(arch, quality) {
                        println!("    quality {}: N={}, M={}", quality, n, m);
                    }
                }
                for metric in tables::metrics(arch) {
                    let published = tables::pretrained_qualities(arch, metric);
                    println!("    pretrained ({}): {}", metric, format_qualities(&published));
                }
                println!();
            }
        }

        Commands::List { installed: true } => {
            let config = Config::from_env()?;
            let registry = CheckpointRegistry::load(&config)?;
            let checkpoints = registry.list_checkpoints();

            if checkpoints.is_empty() {
                println!("No checkpoints downloaded.");
                println!("Use 'imgzoo pull <architecture> --quality <q>' to download one.");
            } else {
                println!("Downloaded checkpoints:\n");
                for info in checkpoints {
                    println!("  {} quality {} ({})", info.architecture, info.quality, info.metric);
                    println!("    URL: {}", info.url);
                    println!("    Path: {:?}", info.path);
                    println!("    Size: {} bytes", info.size_bytes);
                    println!("    Downloaded: {}", info.downloaded_at);
                    println!();
                }
            }
        }

        Commands::Info {
            architecture,
            quality,
            metric,
            json,
        } => {
            let arch = Architecture::from_name(&architecture)?;
            let metric = metric.parse::<Metric>()?;
            let (n, m) = tables::cfg(arch, quality).ok_or(Error::InvalidQuality(quality))?;
            let parameters = arch.layout(n, m).num_parameters();
            let root_url = imgzoo::config::root_url_from_env();
            let url = tables::pretrained_url(&root_url, arch, metric, quality);

            if json {
                let output = serde_json::json!({
                    "architecture": arch.name(),
                    "model": arch.model_name(),
                    "quality": quality,
                    "metric": metric.name(),
                    "N": n,
                    "M": m,
                    "parameters": parameters,
                    "url": url,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{} ({})", arch, arch.model_name());
                println!("  Quality: {}", quality);
                println!("  N: {}", n);
                println!("  M: {}", m);
                println!("  Parameters: {}", parameters);
                match url {
                    Some(url) => println!("  Pretrained ({}): {}", metric, url),
                    None => println!("  Pretrained ({}): not yet available", metric),
                }
            }
        }

        Commands::Pull {
            architecture,
            quality,
            metric,
            check_hash,
        } => {
            let arch = Architecture::from_name(&architecture)?;
            let metric = metric.parse::<Metric>()?;
            tables::cfg(arch, quality).ok_or(Error::InvalidQuality(quality))?;

            let config = Config::from_env()?;
            let url = tables::pretrained_url(&config.root_url, arch, metric, quality)
                .ok_or(Error::PretrainedUnavailable)?;

            let mut downloader = WeightDownloader::new(config)?;
            let path = downloader.fetch(
                &CheckpointRequest {
                    architecture: arch,
                    metric,
                    quality,
                    url: url.clone(),
                },
                true,
                check_hash,
            )?;

            let state_dict = checkpoint::load_state_dict(&path)?;
            let model = CompressionModel::from_state_dict(
                arch,
                state_dict,
                &Device::Cpu,
                candle_core::DType::F32,
            )
            .with_context(|| format!("checkpoint {:?} does not match {}", path, arch))?;

            println!("✓ Successfully pulled {} quality {}", arch, quality);
            println!("  URL: {}", url);
            println!("  Path: {:?}", path);
            println!("  N={}, M={}", model.n(), model.m());
        }

        Commands::Build {
            architecture,
            quality,
            metric,
            pretrained,
            device,
            output,
        } => {
            let arch = Architecture::from_name(&architecture)?;
            let device = parse_device(&device)?;
            let options = LoadOptions::default().pretrained(pretrained).device(device);

            let model = zoo::entry_point(arch)(quality, &metric, &options)?;

            println!("{} ({})", arch, arch.model_name());
            println!("  N={}, M={}", model.n(), model.m());
            println!("  Parameters: {}", model.num_parameters());
            println!("  Tensors: {}", model.names().len());

            if let Some(output) = output {
                model
                    .save_safetensors(&output)
                    .with_context(|| format!("writing {:?}", output))?;
                println!("  Saved: {:?}", output);
            }
        }
    }

    Ok(())
}
