use crate::memcache::builder::MemcacheStoreConfig;
use crate::memcache::cli::parser::{self, MemcoredConfig};
use crate::server::context::ServerContext;
use crate::server::runtime;
use crate::server::stats_reporter::StatsReporter;
use byte_unit::{Byte, UnitType};
use std::process;
use tracing_log::LogTracer;

fn log_config(config: &MemcoredConfig) {
    info!(
        "Memory limit: {}",
        Byte::from_u64(config.memory_limit).get_appropriate_unit(UnitType::Decimal)
    );
    match config.max_items {
        Some(max_items) => info!("Max items: {}", max_items),
        None => info!("Max items: unlimited"),
    }
    info!("Eviction policy: {}", config.eviction_policy.as_str());
    info!("Sweep interval: {:?}", config.sweep_interval());
    info!("Stats interval: {:?}", config.stats_interval());
}

pub fn run(args: Vec<String>) {
    if let Err(err) = LogTracer::init() {
        eprintln!("Cannot initialize logger: {}", err);
        process::exit(1);
    }

    let config = match parser::parse(args) {
        Ok(config) => config,
        Err(err) => {
            eprint!("{}", err);
            process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(parser::get_log_level(config.verbose))
        .init();
    log_config(&config);

    let runtime = match runtime::create_runtime() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Cannot create runtime: {}", err);
            process::exit(1);
        }
    };

    let store_config = MemcacheStoreConfig::new(
        config.memory_limit,
        config.max_items,
        config.eviction_policy,
        config.segments,
    );
    let context = ServerContext::new(store_config, config.sweep_interval());

    if let Some(sweeper) = context.sweeper() {
        runtime.spawn(async move { sweeper.run().await });
    }
    if let Some(interval) = config.stats_interval() {
        let reporter = StatsReporter::new(context.store(), interval, context.cancellation_token());
        runtime.spawn(async move { reporter.run().await });
    }

    let cancellation_token = context.cancellation_token();
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down"),
            Err(err) => error!("Cannot listen for shutdown signal: {}", err),
        }
        cancellation_token.cancel();
    });

    let system_timer = context.system_timer();
    runtime.block_on(system_timer.run());
    let stats = context.store().stats();
    info!(
        "Served {} gets, {} sets, hit rate: {:.2}",
        stats.cmd_get,
        stats.cmd_set,
        stats.hit_rate()
    );
}
