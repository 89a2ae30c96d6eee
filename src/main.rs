use clap::{Parser, ValueEnum};
use memofill::parallelism_config::DEFAULT_DIVISOR;
use memofill::{FillCoordinator, Fibonacci, Lucas, MemoError, ParallelismConfig};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Sequence {
    Fibonacci,
    Lucas,
}

#[derive(Parser)]
#[command(name = "memofill")]
#[command(about = "Compute sequence values through a shared, parallel-filled memo cache", long_about = None)]
struct Cli {
    /// Indices to compute, in order, against one cache
    #[arg(default_values_t = [8i64, 21, 4], allow_negative_numbers = true)]
    targets: Vec<i64>,

    /// Chunks per request (defaults to the configured parallelism, capped at the target)
    #[arg(short, long)]
    parallelism: Option<i64>,

    /// Hardware threads are divided by this to derive the default parallelism
    #[arg(long, default_value_t = DEFAULT_DIVISOR)]
    divisor: usize,

    #[arg(long, value_enum, default_value_t = Sequence::Fibonacci)]
    sequence: Sequence,

    /// Print one JSON object per request instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), MemoError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("memofill=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ParallelismConfig::calculate(cli.divisor);

    let coordinator = match cli.sequence {
        Sequence::Fibonacci => FillCoordinator::with_recurrence(config, Fibonacci),
        Sequence::Lucas => FillCoordinator::with_recurrence(config, Lucas),
    };
    let name = coordinator.recurrence().name().to_string();

    if !cli.json {
        println!(
            "[memofill] Sequence: {}, default parallelism: {}",
            name,
            coordinator.config().max_parallelism
        );
    }

    for target in cli.targets {
        let parallelism = cli.parallelism.unwrap_or_else(|| {
            let configured = i64::try_from(coordinator.config().max_parallelism).unwrap_or(i64::MAX);
            configured.min(target.max(1))
        });

        match coordinator.compute(target, parallelism) {
            Ok(outcome) if cli.json => println!("{}", serde_json::to_string(&outcome)?),
            Ok(outcome) => {
                println!(
                    "[memofill] {}({}) = {} ({} newly computed in {} chunk(s), {} microseconds)",
                    name,
                    target,
                    outcome.value,
                    outcome.stats.newly_computed,
                    outcome.stats.chunks,
                    outcome.stats.elapsed_micros
                );
            }
            Err(e) => {
                eprintln!("[memofill] {}({}) with parallelism {} failed: {}", name, target, parallelism, e);
            }
        }
    }

    if !cli.json {
        let cache = coordinator.cache();
        println!(
            "[memofill] Cache holds {} entries, contiguous through index {}",
            cache.len()?,
            cache
                .highest_contiguous_index()?
                .map_or_else(|| "-".to_string(), |k| k.to_string())
        );
    }

    Ok(())
}
