//! Console Host Example
//!
//! A terminal host for the request coordinator:
//! - permission batches are typed at the prompt
//! - the "platform" asks the user y/N for every permission it is prompted for
//! - outcomes are printed in request order, followed by the aggregated result
//!
//! Permissions granted once stay granted for the rest of the session.
//!
//! Run with: cargo run --example console_host

use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;

use grantflow::{
    cli::Console,
    coordinator::{CoordinatorConfig, PermissionOutcome, RequestCoordinator},
    logging,
    platform::{InMemoryPlatform, PlatformBindings},
};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let config = match std::env::var("GRANTFLOW_CONFIG") {
        Ok(json) => CoordinatorConfig::from_json(&json)?,
        Err(_) => CoordinatorConfig::default().with_logging(true),
    };

    let (platform, mut prompts) = InMemoryPlatform::with_prompt_channel();
    let platform = Arc::new(platform);
    let coordinator =
        RequestCoordinator::new(config, PlatformBindings::from_platform(platform.clone()));

    let console = Console::new();
    console.print_banner();

    loop {
        let input = match console.read_input() {
            Ok(input) => input,
            Err(e) => {
                tracing::error!("Failed to read user input: {}", e);
                console.print_error(&format!("Failed to read input: {}", e));
                continue;
            }
        };

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            console.print_system("Goodbye!");
            break;
        }

        let identifiers: Vec<&str> = input.split_whitespace().collect();
        let mut outcomes = match coordinator.request_each(&identifiers) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                console.print_error(&e.to_string());
                continue;
            }
        };

        let mut received: Vec<PermissionOutcome> = Vec::new();
        loop {
            tokio::select! {
                next = outcomes.next() => match next {
                    Some(outcome) => {
                        console.print_outcome(&outcome);
                        received.push(outcome);
                    }
                    None => break,
                },
                Some(batch) = prompts.recv() => {
                    let answers = console.ask_batch(&batch)?;
                    platform.apply_answers(&batch, &answers);
                    coordinator.on_prompt_result(&batch, &answers)?;
                }
            }
        }

        if received.len() == identifiers.len() {
            if let Some(combined) = PermissionOutcome::combine(&received) {
                console.print_all_granted(combined.granted);
            }
        }
        console.print_separator();
    }

    Ok(())
}
