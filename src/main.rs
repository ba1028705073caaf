use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use salon_turn_board_lib::application::commands::BoardSession;
use salon_turn_board_lib::application::dto::BoardView;
use salon_turn_board_lib::application::time::now_local;
use salon_turn_board_lib::config::BoardConfig;
use salon_turn_board_lib::domain::date_key::DateKey;
use salon_turn_board_lib::domain::schedule_model::{ColumnIndex, Placement, RowSlot};
use salon_turn_board_lib::domain::service_model::ServiceCatalog;
use salon_turn_board_lib::error::Result;
use salon_turn_board_lib::{open_pool, AppServices};

#[derive(Parser, Debug)]
#[command(name = "salon-board")]
#[command(version)]
#[command(about = "Salon turn board: daily sign-in sheet with fair service rotation")]
#[command(propagate_version = true)]
struct Cli {
    /// SQLite database file (created if missing)
    #[arg(long, global = true, default_value = "salon-board.db")]
    db: PathBuf,

    /// Board date (YYYY-MM-DD). Defaults to the last viewed date, then today
    #[arg(long, global = true)]
    date: Option<DateKey>,

    /// Accept service codes a worker is not registered for
    #[arg(long, global = true)]
    no_skill_check: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the board for the current date
    Show {
        /// Include empty rows
        #[arg(long)]
        all: bool,
    },

    /// Enter a worker name into a row (stamps time-in for a new row)
    Name {
        row: u32,
        /// Worker name; empty string clears the row name
        name: String,
    },

    /// Set or clear the time-in of a row (HH:MM)
    TimeIn {
        row: u32,
        #[arg(default_value = "")]
        time: String,
    },

    /// Record (or clear with an empty code) a service in a cell
    Service {
        row: u32,
        column: u32,
        /// Service code, e.g. P, M, GX. Empty clears
        #[arg(default_value = "")]
        code: String,
        /// top | bottom | full | unified
        #[arg(long, short, default_value = "unified")]
        placement: Placement,
    },

    /// Select a service and highlight the next worker in rotation
    Select {
        /// Service code; omit to clear the selection
        #[arg(default_value = "")]
        code: String,
    },

    /// Move the highlight to the next eligible worker
    Next,

    /// Toggle the highlight on a worker
    Toggle { name: String },

    /// Suggest worker names for a row
    Suggest {
        row: u32,
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Change the board date
    Day {
        #[command(subcommand)]
        command: DayCommands,
    },

    /// Manage the worker catalog
    Workers {
        #[command(subcommand)]
        command: WorkerCommands,
    },

    /// List the service menu
    Services,

    /// List dates that have a saved board
    Dates,

    /// Import a browser-storage JSON snapshot
    Import { file: PathBuf },

    /// Export all saved boards as a browser-storage JSON snapshot
    Export { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum DayCommands {
    Prev,
    Next,
    Goto { date: DateKey },
}

#[derive(Subcommand, Debug)]
enum WorkerCommands {
    List,
    Add {
        name: String,
        /// Comma-separated service codes ("P, M, G")
        #[arg(default_value = "")]
        skills: String,
    },
    Rename { old: String, new: String },
    Skills { name: String, skills: String },
    Remove { name: String },
}

// =============================================================================
// Output
// =============================================================================

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_board(view: &BoardView, all: bool) {
    println!("{}", view.date_label);
    if let Some(code) = &view.selected_service {
        println!("Selected: {}", code);
    }
    if !view.highlights.is_empty() {
        println!("Next up: {}", view.highlights.join(", "));
    }
    println!();
    println!("{:<4} {:<2}{:<14} {:<6} {:>5}  SERVICES", "ROW", "", "NAME", "IN", "LOAD");

    let rows: Vec<_> = if all {
        view.rows.iter().collect()
    } else {
        view.occupied_rows().collect()
    };
    for row in rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(i, cell)| format!("{}:{}", i + 1, cell))
            .collect();
        println!(
            "{:<4} {:<2}{:<14} {:<6} {:>5.1}  {}",
            row.row,
            if row.highlighted { "*" } else { "" },
            row.worker_name,
            row.time_in,
            row.load,
            cells.join(" ")
        );
    }
}

fn print_picked(json: bool, picked: Option<String>) -> Result<()> {
    if json {
        return print_json(&picked);
    }
    match picked {
        Some(name) => println!("Next up: {}", name),
        None => println!("No eligible worker"),
    }
    Ok(())
}

// =============================================================================
// Main
// =============================================================================

async fn run(cli: Cli) -> Result<()> {
    let config = BoardConfig {
        db_path: cli.db.clone(),
        validate_skills: !cli.no_skill_check,
        ..BoardConfig::default()
    };

    let pool = open_pool(&config).await?;
    let mut session = BoardSession::open(
        AppServices::new(pool),
        ServiceCatalog::standard()?,
        &config,
        cli.date,
    )
    .await?;

    match cli.command {
        Commands::Show { all } => {
            let view = session.view();
            if cli.json {
                print_json(&view)?;
            } else {
                print_board(&view, all);
            }
        }
        Commands::Name { row, name } => {
            session.set_worker_name(RowSlot::new(row)?, &name, now_local()).await?;
            print_board(&session.view(), false);
        }
        Commands::TimeIn { row, time } => {
            session.set_time_in(RowSlot::new(row)?, &time).await?;
            print_board(&session.view(), false);
        }
        Commands::Service { row, column, code, placement } => {
            session
                .record_service(RowSlot::new(row)?, ColumnIndex::new(column)?, placement, &code)
                .await?;
            print_board(&session.view(), false);
        }
        Commands::Select { code } => {
            let picked = session.select_service(&code).await?;
            print_picked(cli.json, picked)?;
        }
        Commands::Next => {
            let picked = session.advance().await?;
            print_picked(cli.json, picked)?;
        }
        Commands::Toggle { name } => {
            let on = session.toggle_highlight(&name).await?;
            println!("{} {}", name.trim(), if on { "highlighted" } else { "unhighlighted" });
        }
        Commands::Suggest { row, prefix } => {
            let names = session.suggest(RowSlot::new(row)?, &prefix);
            if cli.json {
                print_json(&names)?;
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }
        Commands::Day { command } => {
            match command {
                DayCommands::Prev => session.previous_day().await?,
                DayCommands::Next => session.next_day().await?,
                DayCommands::Goto { date } => session.goto(date).await?,
            };
            print_board(&session.view(), false);
        }
        Commands::Workers { command } => match command {
            WorkerCommands::List => {
                if cli.json {
                    print_json(session.workers())?;
                } else {
                    for (name, skills) in session.workers().iter() {
                        println!("{:<14} {}", name, skills.join(", "));
                    }
                }
            }
            WorkerCommands::Add { name, skills } => {
                session.add_worker(&name, &skills).await?;
                println!("Added {}", name.trim());
            }
            WorkerCommands::Rename { old, new } => {
                session.rename_worker(&old, &new).await?;
                println!("Renamed {} -> {}", old, new.trim());
            }
            WorkerCommands::Skills { name, skills } => {
                session.set_worker_skills(&name, &skills).await?;
                println!("Updated {}", name);
            }
            WorkerCommands::Remove { name } => {
                session.remove_worker(&name).await?;
                println!("Removed {}", name);
            }
        },
        Commands::Services => {
            let view = session.view();
            if cli.json {
                print_json(&view.services)?;
            } else {
                for service in &view.services {
                    println!("{:<4} {:<18} {}", service.code, service.name, service.weight);
                }
            }
        }
        Commands::Dates => {
            let dates = session.list_dates().await?;
            if cli.json {
                print_json(&dates)?;
            } else {
                for date in dates {
                    println!("{}  {}", date, date.display_label());
                }
            }
        }
        Commands::Import { file } => {
            let days = session.import_snapshot(&file).await?;
            println!("Imported {} day(s) from {}", days, file.display());
        }
        Commands::Export { file } => {
            let days = session.export_snapshot(&file).await?;
            println!("Exported {} day(s) to {}", days, file.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
