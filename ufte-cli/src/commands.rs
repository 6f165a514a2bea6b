//! One-shot command execution and output formatting.

use crate::{Commands, HostCommands, RemoteCommands};
use colored::Colorize;
use serialport::SerialPortType;
use ufte_client::Client;
use ufte_protocol::{DirEntry, EntryKind};

/// Executes a device-facing command and returns the formatted output.
pub fn execute(client: &mut Client, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        // Handled in main.rs before a connection exists.
        Commands::Shell | Commands::Host { .. } | Commands::Ports => unreachable!(),

        Commands::Remote { command } => match command {
            RemoteCommands::Cd { path } => {
                client.cd(&path)?;
                Ok(format!("{} {}", "Changed to".green(), path.cyan()))
            }
            RemoteCommands::Ls { path } => {
                let entries = client.ls(&path)?;
                Ok(format_entries(&entries))
            }
            RemoteCommands::Rm { path } => {
                client.rm(&path)?;
                Ok(format!("{} {}", "Removed".green(), path.cyan()))
            }
        },

        Commands::Transfer {
            direction,
            local,
            remote,
            chunk,
        } => {
            let bytes = client.transfer(&direction, &local, &remote, chunk)?;
            let (verb, from, to) = match direction.as_str() {
                "up" => ("Uploaded", local.display().to_string(), remote),
                _ => ("Downloaded", remote, local.display().to_string()),
            };
            Ok(format!(
                "{} {} ({} bytes) to {}",
                verb.green(),
                from.cyan(),
                bytes,
                to.cyan()
            ))
        }

        Commands::Reboot => {
            client.reboot()?;
            Ok("Device is rebooting".yellow().to_string())
        }
    }
}

/// Executes a host-side helper.
pub fn host(cmd: HostCommands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        HostCommands::Cd { path } => {
            std::env::set_current_dir(&path)?;
            Ok(std::env::current_dir()?.display().to_string())
        }
        HostCommands::Ls { path } => {
            let mut lines = Vec::new();
            for entry in std::fs::read_dir(&path)? {
                let entry = entry?;
                let meta = entry.metadata()?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if meta.is_dir() {
                    lines.push(format!("d {:>10} {}", "-", name.cyan()));
                } else {
                    lines.push(format!("f {:>10} {}", meta.len(), name));
                }
            }
            lines.sort();
            Ok(lines.join("\n"))
        }
    }
}

/// Lists serial devices attached to this machine, with USB metadata when
/// the platform reports it.
pub fn format_ports() -> Result<String, Box<dyn std::error::Error>> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        return Ok(format!("{}\n", "No serial ports found".yellow()));
    }

    let mut out = String::new();
    for port in ports {
        match port.port_type {
            SerialPortType::UsbPort(info) => {
                out.push_str(&format!(
                    "{}  ({} / {})\n",
                    port.port_name.cyan(),
                    info.manufacturer.as_deref().unwrap_or("?"),
                    info.product.as_deref().unwrap_or("?"),
                ));
            }
            _ => {
                out.push_str(&format!("{}\n", port.port_name.cyan()));
            }
        }
    }
    Ok(out)
}

/// Renders an LS listing: kind, size, name.
pub fn format_entries(entries: &[DirEntry]) -> String {
    if entries.is_empty() {
        return "(empty)".dimmed().to_string();
    }

    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.kind {
            EntryKind::Dir => {
                lines.push(format!("d {:>10} {}", "-", entry.name.cyan()));
            }
            EntryKind::File => {
                lines.push(format!("f {:>10} {}", entry.size, entry.name));
            }
        }
    }
    lines.join("\n")
}
