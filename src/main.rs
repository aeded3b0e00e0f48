use anyhow::{bail, Context, Result};
use astra_rs::astra::checksum::{packet_checksum, stored_checksum};
use astra_rs::astra::decoder::read_modem_id;
use astra_rs::device::candidate_ids;
use astra_rs::util::hex::{encode_hex_upper, parse_hex_lenient, pretty_hex};
use astra_rs::{
    init_logger, log_info, DeviceRecord, HandlerConfig, InMemoryDeviceDirectory,
    MemoryEventSink, PacketLength, TrackSession,
};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "astra-cli")]
#[command(about = "CLI tool for Astra Telematics tracker packets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the protocol and declared length of a packet
    Frame { hex: String },
    /// Compute the CRC-16 of a packet and compare it with the stored one
    Crc { hex: String },
    /// Decode a complete packet
    Decode {
        hex: String,
        /// JSON file with a `handler` config and a `devices` list
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Register the sending modem as ACCOUNT/DEVICE before decoding
        #[arg(short, long)]
        device: Option<String>,
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
    handler: HandlerConfig,
    devices: Vec<DeviceRecord>,
}

fn load_config(path: Option<&PathBuf>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: CliConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.handler.validate()?;
    Ok(config)
}

fn parse_packet(hex: &str) -> Result<Vec<u8>> {
    parse_hex_lenient(hex).with_context(|| format!("invalid hex input: {hex}"))
}

fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Frame { hex } => {
            let packet = parse_packet(&hex)?;
            match astra_rs::packet_length(&packet)? {
                PacketLength::Complete { variant, length } => {
                    log_info(&format!(
                        "{variant}: {length} bytes declared, {} received",
                        packet.len()
                    ));
                }
                PacketLength::NeedMoreData => {
                    log_info("Need at least 3 bytes to frame a packet");
                }
            }
        }
        Commands::Crc { hex } => {
            let packet = parse_packet(&hex)?;
            let Some(stored) = stored_checksum(&packet) else {
                bail!("packet too short for a checksum");
            };
            let calculated = packet_checksum(&packet);
            log_info(&format!(
                "CRC-16: calculated {calculated:04X}, stored {stored:04X} ({})",
                if calculated == stored { "ok" } else { "mismatch" }
            ));
        }
        Commands::Decode {
            hex,
            config,
            device,
            json,
        } => {
            let packet = parse_packet(&hex)?;
            let cli_config = load_config(config.as_ref())?;
            log::debug!("Packet:\n{}", pretty_hex(&packet, 16));

            let directory = InMemoryDeviceDirectory::with_devices(cli_config.devices);
            if let Some(entry) = device {
                let Some((account_id, device_id)) = entry.split_once('/') else {
                    bail!("--device expects ACCOUNT/DEVICE, got {entry}");
                };
                let modem_id = read_modem_id(&packet)?;
                let unique_id = candidate_ids(&cli_config.handler.unique_id_prefixes, &modem_id)
                    .into_iter()
                    .next()
                    .unwrap_or(modem_id);
                directory.insert(DeviceRecord::new(account_id, device_id, &unique_id));
            }

            let sink = MemoryEventSink::new();
            let mut session = TrackSession::new(
                Arc::new(cli_config.handler),
                Arc::new(directory),
                Arc::new(sink.clone()),
            );
            let handled = session.handle_raw(&packet)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&handled.reports)?);
            } else {
                log_info(&format!(
                    "{} from {} ({}/{})",
                    handled.variant,
                    handled.modem_id,
                    handled.device.account_id,
                    handled.device.device_id
                ));
                for report in &handled.reports {
                    log_info(&format!(
                        "#{} {} {} {:?}km/h {:?}deg {}",
                        report.sequence,
                        report.status_code,
                        report.point,
                        report.speed_kph,
                        report.heading_deg,
                        report.raw_data.as_deref().unwrap_or("")
                    ));
                }
            }
            log_info(&format!("Events stored: {}", sink.len()));
            if let Some(ack) = handled.ack {
                log_info(&format!("ACK: {}", encode_hex_upper(&ack)));
            }
        }
    }

    Ok(())
}
