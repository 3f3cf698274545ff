// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read an EPEVER Tracer charge controller from the command line.

use std::{io::Write as _, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tracer_modbus::{codec::labels, prelude::*};

/// Poll an EPEVER Tracer solar charge controller
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port the controller is attached to
    #[arg(long)]
    port: Option<String>,

    /// Modbus slave address
    #[arg(long)]
    address: Option<u8>,

    #[arg(long)]
    baud_rate: Option<u32>,

    /// Response timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Log debug messages
    #[arg(long)]
    debug: bool,

    /// Print the device identification and exit
    #[arg(long, conflicts_with = "poll_loop")]
    info: bool,

    /// Keep polling and print one JSON line per packet
    #[arg(long = "loop")]
    poll_loop: bool,
}

impl Args {
    fn config(&self) -> anyhow::Result<DriverConfig> {
        let mut config = DriverConfig::load(self.config.as_deref())
            .context("loading configuration")?;
        if let Some(port) = &self.port {
            config.port.clone_from(port);
        }
        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(baud_rate) = self.baud_rate {
            config.baud_rate = baud_rate;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Writes packets as JSON lines to stdout.
struct JsonLines;

impl Sink for JsonLines {
    fn accept(&mut self, packet: Packet) {
        match serde_json::to_string(&packet) {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(err) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
                    log::error!("writing packet failed: {err}");
                }
            }
            Err(err) => log::error!("serializing packet failed: {err}"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = if args.debug { "debug" } else { "info" };
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level),
    );

    let config = args.config()?;
    let connector = config.rtu_connector()?;
    let mut driver = Driver::new(config, Box::new(connector))
        .context("connecting to the charge controller")?;
    log::info!("hardware is {}", driver.hardware_name());

    if args.info {
        let outcome = driver.run(Operation::Info)?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if args.poll_loop {
        driver.pump(&mut JsonLines, None);
    } else {
        let outcome = driver.run(Operation::All)?;
        if let Outcome::Reading(reading) = &outcome {
            for (name, label) in labels::status_labels(reading) {
                log::info!("{name}: {label}");
            }
        }
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    driver.close()?;
    Ok(())
}
