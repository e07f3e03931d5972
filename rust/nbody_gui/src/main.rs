#![warn(missing_debug_implementations)]

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::{app::App, config::ViewerConfig};

mod app;
mod backend;
mod config;
mod input;
mod particles;
mod state;
mod view;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config =
        ViewerConfig::from_env().context("failed to read configuration")?;
    info!(?config, "starting viewer");

    let mut app = App::new(config);

    let event_loop =
        EventLoop::new().context("failed to initialize event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run_app(&mut app)
        .context("failed to run event loop")?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
