//! Interactive shell.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use ufte_client::Client;
use ufte_protocol::DEFAULT_CHUNK_SIZE;

use crate::commands::format_entries;

const HELP_TEXT: &str = r#"
Available commands:
  cd <path>               Change the device working directory
  ls [path]               List a device directory
  rm <path>               Remove a device file
  put <local> <remote>    Upload a file to the device
  get <remote> <local>    Download a file from the device
  reboot                  Reboot the device
  sync                    Re-sync after a timeout or reboot

  lcd <path>              Change the host working directory
  lls [path]              List a host directory

  help                    Show this help
  quit, exit              Leave the shell
"#;

pub fn run(mut client: Client) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "ufte shell".bold().cyan());
    println!("Type 'help' for available commands.\n");

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".ufte_history"))
        .unwrap_or_else(|_| ".ufte_history".into());
    let _ = rl.load_history(&history_path);

    loop {
        let prompt = format!("{} ", "ufte>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_line(&mut client, line) {
                    Ok(Some(output)) => {
                        if !output.is_empty() {
                            println!("{}\n", output);
                        }
                    }
                    Ok(None) => break, // Exit command
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    client.close();
    println!("{}", "Disconnected.".dimmed());

    Ok(())
}

fn execute_line(
    client: &mut Client,
    line: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let cmd = parts[0].to_lowercase();
    let args = &parts[1..];

    match cmd.as_str() {
        "help" => Ok(Some(HELP_TEXT.to_string())),

        "cd" => {
            expect_args(args, 1, "cd <path>")?;
            client.cd(args[0])?;
            Ok(Some(String::new()))
        }

        "ls" => {
            let path = args.first().copied().unwrap_or(".");
            let entries = client.ls(path)?;
            Ok(Some(format_entries(&entries)))
        }

        "rm" => {
            expect_args(args, 1, "rm <path>")?;
            client.rm(args[0])?;
            Ok(Some(format!("{} {}", "Removed".green(), args[0].cyan())))
        }

        "put" => {
            expect_args(args, 2, "put <local> <remote>")?;
            let bytes = client.put(args[0], args[1], DEFAULT_CHUNK_SIZE)?;
            Ok(Some(format!(
                "{} {} ({} bytes)",
                "Uploaded".green(),
                args[1].cyan(),
                bytes
            )))
        }

        "get" => {
            expect_args(args, 2, "get <remote> <local>")?;
            let bytes = client.get(args[0], args[1])?;
            Ok(Some(format!(
                "{} {} ({} bytes)",
                "Downloaded".green(),
                args[0].cyan(),
                bytes
            )))
        }

        "reboot" => {
            client.reboot()?;
            Ok(Some(format!(
                "{}",
                "Device is rebooting; run 'sync' once it is back".yellow()
            )))
        }

        "sync" => {
            client.resync()?;
            Ok(Some("Synced".green().to_string()))
        }

        "lcd" => {
            expect_args(args, 1, "lcd <path>")?;
            std::env::set_current_dir(args[0])?;
            Ok(Some(std::env::current_dir()?.display().to_string()))
        }

        "lls" => {
            let path = args.first().copied().unwrap_or(".");
            let output = crate::commands::host(crate::HostCommands::Ls { path: path.into() })?;
            Ok(Some(output))
        }

        "quit" | "exit" => Ok(None),

        unknown => Err(format!("unknown command {:?} (try 'help')", unknown).into()),
    }
}

fn expect_args(args: &[&str], n: usize, usage: &str) -> Result<(), Box<dyn std::error::Error>> {
    if args.len() != n {
        return Err(format!("usage: {}", usage).into());
    }
    Ok(())
}
