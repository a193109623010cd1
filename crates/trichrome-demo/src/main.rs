//! Trichrome demo: one window, one triangle, two color actions.
//!
//! Keys: `B` cycles the background, `T` cycles the triangle, `Escape` quits.

mod actions;
mod app;
mod config;

use anyhow::Result;
use trichrome_engine::device::GpuInit;
use trichrome_engine::logging::{init_logging, LoggingConfig};
use trichrome_engine::window::Runtime;

use app::ColorDemo;
use config::DemoConfig;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::default();
    log::info!("starting {} ({}x{})", config.title, config.width, config.height);

    let runtime = config.runtime();
    Runtime::run(runtime, GpuInit::default(), ColorDemo::new(config))
}
