//! `reportmap`: serve the report mapping API.
//!
//! Usage: `reportmap [--seed-demo]`
//! Config: `~/.reportmap/config.json`, overridden by `DATABASE_PATH` and `REPORTMAP_BIND`.

use reportmap_lib::state::load_config;
use reportmap_lib::RunOptions;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut options = RunOptions::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--seed-demo" => options.seed_demo = true,
            other => {
                eprintln!("Unknown argument: {}\nUsage: reportmap [--seed-demo]", other);
                std::process::exit(2);
            }
        }
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = reportmap_lib::run(config, options).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
