use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use sheet_sdk::prelude::*;
use sheet_sdk::weather::WeatherClient;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cybersheet")]
#[command(about = "Cybersheet - CLI editor for the Cyberpunk 2020 character sheet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Remote API URL
    #[arg(long, global = true, default_value = sheet_sdk::client::DEFAULT_API_URL)]
    api_url: String,

    /// Directory for the local block store (defaults to the user data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep blocks on the remote API instead of the local store
    #[arg(long, global = true)]
    remote: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the character sheet
    Show,

    /// Toggle edit mode, or set it explicitly
    EditMode {
        switch: Option<Switch>,
    },

    /// Add a new block (avatar, info, stats, inventory, cyber-implants)
    AddBlock {
        kind: String,
    },

    /// Remove a block by id
    RemoveBlock {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Edit one field of a block (use --index for list entries)
    Edit {
        id: String,
        field: String,
        value: String,

        /// Position inside the list field
        #[arg(short, long)]
        index: Option<usize>,
    },

    /// Append an item/implant to a list block
    AddItem {
        id: String,
        value: String,
    },

    /// Remove an item/implant from a list block by index
    RemoveItem {
        id: String,
        index: usize,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export the sheet as a JSON document
    Export {
        /// Output file (default: character-data.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reset the character to a fresh random identity
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show current weather for the sheet header
    Weather,

    /// Check remote API reachability
    Status,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cybersheet")
}

fn ask(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

async fn open_session(cli: &Cli, data_dir: &PathBuf, edit_mode: bool) -> Result<Session> {
    let adapter: Box<dyn PersistenceAdapter> = if cli.remote {
        Box::new(RemoteStore::new(PlaceholderClient::new(cli.api_url.clone())))
    } else {
        Box::new(LocalStore::open(data_dir)?)
    };
    let mut session = Session::new(adapter, Box::new(RandomUserApi::default()), edit_mode);
    session.load().await?;
    Ok(session)
}

fn print_sheet(session: &Session, weather: &sheet_sdk::WeatherReport) {
    println!("\n{}", "Cyberpunk 2020 Character Sheet".cyan().bold());
    println!(
        "{}",
        format!(
            "Weather in Moscow: {}°C, {}",
            weather.temperature, weather.condition
        )
        .bright_black()
    );
    println!("{}", "═".repeat(50).cyan());

    let view = project(session.store(), session.edit_mode());
    for section in &view.sections {
        println!(
            "\n{} {}",
            section.title.bright_white().bold(),
            format!("({})", section.id).bright_black()
        );
        for line in &section.lines {
            println!("  {}", line);
        }
    }
    if view.edit_mode {
        println!("\n{}", "Edit mode is ON".yellow());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let flags = LocalStore::open(&data_dir)?;
    let edit_mode = flags.load_edit_mode();

    match &cli.command {
        Commands::Show => {
            let session = open_session(&cli, &data_dir, edit_mode).await?;
            let weather = WeatherClient::default()
                .current()
                .await
                .unwrap_or_else(|_| sheet_sdk::WeatherReport::unavailable());
            print_sheet(&session, &weather);
        }

        Commands::EditMode { switch } => {
            let mut session = open_session(&cli, &data_dir, edit_mode).await?;
            match switch {
                Some(Switch::On) => session.set_edit_mode(true),
                Some(Switch::Off) => session.set_edit_mode(false),
                None => {
                    session.toggle_edit_mode();
                }
            }
            flags.save_edit_mode(session.edit_mode())?;
            if session.edit_mode() {
                println!("{}", "Edit mode enabled".green());
            } else {
                println!("{}", "Edit mode disabled".yellow());
            }
        }

        Commands::AddBlock { kind } => {
            let mut session = open_session(&cli, &data_dir, edit_mode).await?;
            match session.add_block(kind).await {
                Ok(Some(id)) => {
                    println!("{}", format!("Added {} block: {}", kind, id).green())
                }
                Ok(None) => println!("{}", "Edit mode is off (cybersheet edit-mode on)".yellow()),
                Err(e) => return Err(anyhow!("{}", e)),
            }
        }

        Commands::RemoveBlock { id, yes } => {
            let mut session = open_session(&cli, &data_dir, edit_mode).await?;
            let removed = session
                .remove_block(id, || *yes || ask("Really delete this block?"))
                .await?;
            if removed {
                println!("{}", format!("Removed block {}", id).green());
            } else if !session.edit_mode() {
                println!("{}", "Edit mode is off (cybersheet edit-mode on)".yellow());
            } else {
                println!("{}", format!("No block removed ({})", id).yellow());
            }
        }

        Commands::Edit {
            id,
            field,
            value,
            index,
        } => {
            let mut session = open_session(&cli, &data_dir, edit_mode).await?;
            let changed = session.edit_field(id, field, *index, value).await?;
            if changed {
                println!("{}", format!("Updated {} of {}", field, id).green());
            } else if !session.edit_mode() {
                println!("{}", "Edit mode is off (cybersheet edit-mode on)".yellow());
            } else {
                println!("{}", "Nothing changed (empty value)".yellow());
            }
        }

        Commands::AddItem { id, value } => {
            let mut session = open_session(&cli, &data_dir, edit_mode).await?;
            let added = session.add_item(id, value).await?;
            if added {
                println!("{}", format!("Added '{}' to {}", value, id).green());
            } else if !session.edit_mode() {
                println!("{}", "Edit mode is off (cybersheet edit-mode on)".yellow());
            } else {
                println!("{}", "Nothing added (empty value)".yellow());
            }
        }

        Commands::RemoveItem { id, index, yes } => {
            let mut session = open_session(&cli, &data_dir, edit_mode).await?;
            let removed = session
                .remove_item(id, *index, || {
                    *yes || ask("Really delete this entry from the list?")
                })
                .await?;
            if removed {
                println!("{}", format!("Removed entry {} from {}", index, id).green());
            } else if !session.edit_mode() {
                println!("{}", "Edit mode is off (cybersheet edit-mode on)".yellow());
            } else {
                println!("{}", "Nothing removed".yellow());
            }
        }

        Commands::Export { output } => {
            let session = open_session(&cli, &data_dir, edit_mode).await?;
            let doc = session.export_json();
            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from("character-data.json"));
            std::fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
            println!(
                "{}",
                format!("Exported {} blocks to {}", session.store().len(), path.display()).green()
            );
        }

        Commands::Reset { yes } => {
            let mut session = open_session(&cli, &data_dir, edit_mode).await?;
            let reset = session
                .reset(|| {
                    *yes || ask("Really reset the character? All sheet data will be replaced.")
                })
                .await?;
            if reset {
                flags.save_edit_mode(session.edit_mode())?;
                println!("{}", "Character reset".green().bold());
                let weather = sheet_sdk::WeatherReport::unavailable();
                print_sheet(&session, &weather);
            } else {
                println!("{}", "Reset cancelled".yellow());
            }
        }

        Commands::Weather => {
            println!("{}", "Fetching weather...".cyan());
            match WeatherClient::default().current().await {
                Ok(report) => println!(
                    "{}",
                    format!(
                        "Weather in Moscow: {}°C, {}",
                        report.temperature, report.condition
                    )
                    .green()
                ),
                Err(e) => {
                    println!("{}", format!("Weather unavailable: {}", e).red());
                }
            }
        }

        Commands::Status => {
            println!("{}", "Checking remote API...".cyan());
            let client = PlaceholderClient::new(cli.api_url.clone());
            match client.ping().await {
                Ok(true) => println!("{}", "Remote API is reachable".green()),
                _ => {
                    println!("{}", "Remote API is unreachable".red());
                    println!(
                        "{}",
                        format!("Tried to connect to: {}", cli.api_url).yellow()
                    );
                }
            }
        }
    }

    Ok(())
}
