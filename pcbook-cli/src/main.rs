use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pcbook_api::{AuthClient, LaptopClient, TokenSession};
use pcbook_core::config::Config;
use pcbook_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use pcbook_core::model::{Filter, Memory};
use pcbook_core::test_utils::{sample_laptop, sample_score};
use secrecy::SecretString;
use tonic::transport::Endpoint;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pcbook")]
#[command(author, version, about = "Command-line client for the PCBook laptop catalog", long_about = None)]
struct Args {
    /// Server URL, e.g. http://127.0.0.1:8080
    #[arg(short, long)]
    address: Option<String>,

    /// Login username
    #[arg(short, long)]
    username: Option<String>,

    /// Login password
    #[arg(short, long)]
    password: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: LogLevel,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create random sample laptops
    Create {
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
    /// Stream laptops matching a filter
    Search {
        #[arg(long, default_value_t = 3000.0)]
        max_price: f64,
        #[arg(long, default_value_t = 4)]
        min_cores: u32,
        #[arg(long, default_value_t = 2.5)]
        min_ghz: f64,
        #[arg(long, default_value_t = 8)]
        min_ram_gb: u64,
    },
    /// Upload an image file for a laptop (a sample laptop is created when no id is given)
    Upload {
        image: PathBuf,
        #[arg(long)]
        laptop_id: Option<String>,
    },
    /// Create sample laptops and rate each of them with random scores
    Rate {
        #[arg(short, long, default_value_t = 3)]
        laptops: usize,
        #[arg(short, long, default_value_t = 1)]
        rounds: usize,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("cannot load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env()?;
    if let Some(address) = &args.address {
        config.client.server_address = address.clone();
    }
    if let Some(username) = &args.username {
        config.client.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.client.password = password.clone();
    }
    Ok(config)
}

async fn run(command: Command, client: &mut LaptopClient) -> Result<()> {
    match command {
        Command::Create { count } => {
            for _ in 0..count {
                client.create_laptop(sample_laptop()).await?;
            }
        }
        Command::Search {
            max_price,
            min_cores,
            min_ghz,
            min_ram_gb,
        } => {
            let filter = Filter {
                max_price_usd: max_price,
                min_cpu_cores: min_cores,
                min_cpu_ghz: min_ghz,
                min_ram: Memory::gigabytes(min_ram_gb),
            };
            info!(?filter, "searching");
            for laptop in client.search_laptop(filter).await? {
                info!(
                    id = %laptop.id,
                    brand = %laptop.brand,
                    name = %laptop.name,
                    cores = laptop.cpu.number_cores,
                    min_ghz = laptop.cpu.min_ghz,
                    ram = ?laptop.ram,
                    price = laptop.price_usd,
                    "found"
                );
            }
        }
        Command::Upload { image, laptop_id } => {
            let laptop_id = match laptop_id {
                Some(id) => id,
                None => client.create_laptop(sample_laptop()).await?,
            };
            let data = tokio::fs::read(&image)
                .await
                .with_context(|| format!("cannot read image file {}", image.display()))?;
            let image_type = image
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            let response = client.upload_image(&laptop_id, &image_type, &data).await?;
            info!(id = %response.id, size = response.size, "uploaded");
        }
        Command::Rate { laptops, rounds } => {
            let mut ids = Vec::with_capacity(laptops);
            for _ in 0..laptops {
                ids.push(client.create_laptop(sample_laptop()).await?);
            }
            for round in 1..=rounds {
                let ratings: Vec<_> = ids.iter().map(|id| (id.clone(), sample_score())).collect();
                for ack in client.rate_laptop(&ratings).await? {
                    info!(
                        round,
                        laptop_id = %ack.laptop_id,
                        rated_count = ack.rated_count,
                        average_score = ack.average_score,
                        "rated"
                    );
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging_with_config(LogConfig::new(args.log_level).json_format(args.json_logs))?;

    let config = load_config(&args)?;
    let endpoint = Endpoint::from_shared(config.client.server_address.clone())?;
    info!(address = %config.client.server_address, "dialing server");

    let auth = AuthClient::new(
        endpoint.connect().await?,
        config.client.username.clone(),
        SecretString::new(config.client.password.clone()),
    );
    let session = TokenSession::start(auth, config.client.refresh_interval).await?;
    let mut client = LaptopClient::new(session.channel(endpoint.connect().await?))
        .with_timeout(config.client.request_timeout);

    run(args.command, &mut client).await
}
