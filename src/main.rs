//! Quicksilver Shape CLI
//!
//! Runs synthetic object workloads against the shape engine and reports how
//! the shape graph and inline caches behaved.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quicksilver_shape::{
    gc, PropertyCache, PropertyName, Shape, ShapeCensus, ShapeConfig, ShapedObject, VERSION,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qs-shape")]
#[command(author, version, about = "Object shape engine for the Quicksilver runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Shape configuration file (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build objects the way a constructor would and report shape statistics
    Simulate {
        /// Number of objects to build
        #[arg(short, long, default_value_t = 1000)]
        objects: usize,
        /// Properties assigned to each object
        #[arg(short, long, default_value_t = 8)]
        properties: usize,
        /// Probability that an object deletes one of its properties afterwards
        #[arg(long, default_value_t = 0.0)]
        delete_rate: f64,
        /// Probability that a property key is an array index
        #[arg(long, default_value_t = 0.0)]
        index_rate: f64,
        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Print the effective configuration as JSON
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            objects,
            properties,
            delete_rate,
            index_rate,
            seed,
        } => {
            let workload = Workload {
                objects,
                properties,
                delete_rate: delete_rate.clamp(0.0, 1.0),
                index_rate: index_rate.clamp(0.0, 1.0),
                seed,
            };
            simulate(config, &workload);
        }
        Commands::Config => println!("{}", config.to_json()?),
    }

    Ok(())
}

fn setup_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ShapeConfig> {
    let Some(path) = path else {
        return Ok(ShapeConfig::default());
    };
    let config = ShapeConfig::from_path(path)
        .with_context(|| format!("failed to load config '{}'", path.display()))?;
    info!(path = %path.display(), "loaded shape configuration");
    Ok(config)
}

struct Workload {
    objects: usize,
    properties: usize,
    delete_rate: f64,
    index_rate: f64,
    seed: u64,
}

fn simulate(config: ShapeConfig, workload: &Workload) {
    info!(
        objects = workload.objects,
        properties = workload.properties,
        seed = workload.seed,
        "starting simulation"
    );
    gc::reset_stats();

    let mut rng = StdRng::seed_from_u64(workload.seed);
    let root = Shape::root(Rc::new(config));
    let start = Instant::now();

    let mut objects = Vec::with_capacity(workload.objects);
    for n in 0..workload.objects {
        let mut obj: ShapedObject<u64> = ShapedObject::new(root.clone());
        for p in 0..workload.properties {
            let key = if rng.gen_bool(workload.index_rate) {
                PropertyName::from_index(p as u32)
            } else {
                PropertyName::from(format!("p{}", p).as_str())
            };
            obj.set(key, (n * workload.properties + p) as u64);
        }
        if !obj.is_empty() && rng.gen_bool(workload.delete_rate) {
            let slot = rng.gen_range(0..obj.len());
            let victim = obj.shape().read_property(slot).name.clone();
            debug!(object = n, name = %victim, "deleting property");
            obj.delete(&victim);
        }
        objects.push(obj);
    }
    let build_time = start.elapsed();

    let mut cache = PropertyCache::new();
    let start = Instant::now();
    let mut checksum = 0u64;
    for obj in &objects {
        let keys: Vec<PropertyName> = obj.keys().cloned().collect();
        for key in &keys {
            if let Some(value) = cache.get_property(obj, key) {
                checksum = checksum.wrapping_add(*value);
            }
        }
    }
    let read_time = start.elapsed();

    let live = objects.iter().map(|obj| obj.shape());
    let census = ShapeCensus::collect(std::iter::once(&root).chain(live));
    let stats = gc::stats();
    let cache_stats = cache.stats();

    println!("quicksilver-shape {}", VERSION);
    println!();
    println!("Workload");
    println!("  objects:            {}", workload.objects);
    println!("  properties/object:  {}", workload.properties);
    println!("  delete rate:        {:.2}", workload.delete_rate);
    println!("  index-key rate:     {:.2}", workload.index_rate);
    println!("  build time:         {:?}", build_time);
    println!("  read time:          {:?}", read_time);
    println!("  checksum:           {}", checksum);
    println!();
    println!("Live shapes");
    println!("  transition:         {}", census.transition_shapes);
    println!("  linear:             {}", census.linear_shapes);
    println!("  indexed:            {}", census.indexed_shapes);
    println!("  transition edges:   {}", census.transition_edges);
    println!("  items:              {}", census.total_items);
    println!("  cache shared:       {}", census.cache_shared);
    println!();
    println!("Shape events");
    println!("  allocations:        {}", stats.total_allocations());
    println!("  transition hits:    {}", stats.transition_hits);
    println!("  edges added:        {}", stats.transition_edges_added);
    println!("  demotions:          {}", stats.demotions);
    println!("  promotions:         {}", stats.promotions);
    println!("  in-place updates:   {}", stats.in_place_updates);
    println!("  table migrations:   {}", stats.table_migrations);
    println!();
    println!("Inline cache");
    println!("  hits:               {}", cache_stats.hits);
    println!("  misses:             {}", cache_stats.misses);
    println!("  hit rate:           {:.1}%", cache_stats.hit_rate() * 100.0);
}
