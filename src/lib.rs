// Client core for the Maman & Bébé health companion: chat, pregnancy progress
// and vaccine reminders kept in sync with the backend.

// Declare the modules
pub mod api;
pub mod capabilities;
pub mod chat;
pub mod clock;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod notify;
pub mod pregnancy;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod vaccine;

use crate::api::{HealthApi, HttpHealthApi};
use crate::capabilities::DeviceCapabilities;
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::console::ConsoleConfirm;
use crate::notify::ConfirmGate;
use crate::state::AppState;
use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;

/// Wires every collaborator once and hands the state to the terminal front-end.
pub async fn run() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    log::info!("Starting client against {}", config.api_url);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let api: Arc<dyn HealthApi> = Arc::new(HttpHealthApi::new(config.api_url.clone(), clock.clone()));
    let device: Arc<dyn DeviceCapabilities> = console::select_device(std::io::stdout().is_terminal());
    let confirm: Arc<dyn ConfirmGate> = Arc::new(ConsoleConfirm);

    let state = AppState::new(config, api, clock, device, confirm);
    console::run(state).await
}
