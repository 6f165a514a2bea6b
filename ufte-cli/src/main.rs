//! ufte - client for the UFTE serial file-transfer protocol
//!
//! Provides one-shot subcommands and an interactive shell.

mod commands;
mod repl;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ufte_client::{Client, SessionConfig};

#[derive(Parser)]
#[command(name = "ufte")]
#[command(about = "Client for the UFTE serial file-transfer protocol")]
#[command(version)]
struct Cli {
    /// Serial port device (e.g. /dev/ttyUSB0)
    #[arg(short, long, env = "UFTE_PORT")]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, default_value_t = ufte_protocol::DEFAULT_BAUD)]
    baud: u32,

    /// Hardware RTS/CTS flow control
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    rtscts: bool,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = 5.0, value_name = "SECONDS")]
    timeout: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive shell on the device connection
    Shell,

    /// Run one remote file-system command
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },

    /// Host-side helpers (no device connection)
    Host {
        #[command(subcommand)]
        command: HostCommands,
    },

    /// Stream a file between host and device
    Transfer {
        /// "up" (host to device) or "down" (device to host)
        direction: String,

        /// Host-side file path
        local: PathBuf,

        /// Device-side file path
        remote: String,

        /// Bytes per upload chunk
        #[arg(long, default_value_t = ufte_protocol::DEFAULT_CHUNK_SIZE)]
        chunk: usize,
    },

    /// Reboot the device
    Reboot,

    /// List serial ports on this machine
    Ports,
}

#[derive(Subcommand)]
enum RemoteCommands {
    /// Change the device working directory
    Cd { path: String },

    /// List a device directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },

    /// Remove a device file
    Rm { path: String },
}

#[derive(Subcommand)]
enum HostCommands {
    /// Change the host working directory
    Cd { path: PathBuf },

    /// List a host directory
    Ls {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        port,
        baud,
        rtscts,
        timeout,
        command,
    } = cli;

    match command {
        Commands::Ports => {
            print!("{}", commands::format_ports()?);
            Ok(())
        }
        Commands::Host { command } => {
            let output = commands::host(command)?;
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
        Commands::Shell => {
            let client = connect(port, baud, rtscts, timeout)?;
            repl::run(client)
        }
        command => {
            let mut client = connect(port, baud, rtscts, timeout)?;
            let output = commands::execute(&mut client, command)?;
            if !output.is_empty() {
                println!("{}", output);
            }
            client.close();
            Ok(())
        }
    }
}

fn connect(
    port: Option<String>,
    baud: u32,
    rtscts: bool,
    timeout: f64,
) -> Result<Client, Box<dyn std::error::Error>> {
    let port = port.ok_or("a serial port is required (--port or UFTE_PORT)")?;
    if !timeout.is_finite() || timeout <= 0.0 {
        return Err("timeout must be a positive number of seconds".into());
    }

    let config = SessionConfig::new(port)
        .with_baud(baud)
        .with_rtscts(rtscts)
        .with_timeout(Duration::from_secs_f64(timeout));

    Ok(Client::open(&config)?)
}
