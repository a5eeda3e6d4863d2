mod commands;
mod output;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stowage",
    version,
    about = "Spreadsheet ingestion tool for warehouse goods receipts and loading lists"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the header row in a messy spreadsheet and extract records below it
    Sniff {
        /// Path to a spreadsheet (xlsx, xls, xlsb or ods)
        input_file: PathBuf,

        /// Target column as NAME or NAME:SEMANTIC (text, count, volume, weight, currency)
        #[arg(short, long = "target", value_name = "COLUMN", required = true)]
        target: Vec<String>,

        /// How many leading rows of each sheet to search
        #[arg(long, default_value_t = 20)]
        max_rows: usize,

        /// Fraction of targets a row must match to qualify as the header
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,

        /// Keep raw cell text instead of cleaning values by semantic
        #[arg(long)]
        raw: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Import a fixed-layout sheet into a receipt store
    Import {
        /// Path to a spreadsheet (xlsx, xls, xlsb or ods)
        input_file: PathBuf,

        /// Column contract: a preset name or a path to a JSON contract file
        #[arg(short, long, value_name = "NAME|FILE", default_value = "goods_receipt")]
        contract: String,

        /// Path to the JSON store file (created on first write)
        #[arg(short, long, value_name = "FILE")]
        store: PathBuf,

        /// Sheet to import (default: the first sheet)
        #[arg(long, value_name = "NAME")]
        sheet: Option<String>,

        /// Report what would happen without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Manage and inspect column contracts
    Contracts {
        #[command(subcommand)]
        action: ContractsAction,
    },
    /// Manage consignee shipping marks in a store file
    Marks {
        #[command(subcommand)]
        action: MarksAction,
    },
}

#[derive(Subcommand)]
enum ContractsAction {
    /// List built-in contracts
    List,
    /// Print a built-in contract as JSON
    Show {
        /// Preset name (e.g., "goods_receipt")
        name: String,
    },
    /// Validate a custom contract file
    Validate {
        /// Path to a JSON contract file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum MarksAction {
    /// Register a consignee under a shipping mark
    Add {
        /// Path to the JSON store file
        store: PathBuf,
        /// Shipping mark, matched case-insensitively on import
        mark: String,
        /// Consignee name
        name: String,
    },
    /// List registered consignees
    List {
        /// Path to the JSON store file
        store: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sniff {
            input_file,
            target,
            max_rows,
            threshold,
            raw,
            output,
        } => commands::sniff::run(input_file, target, max_rows, threshold, raw, &output),
        Commands::Import {
            input_file,
            contract,
            store,
            sheet,
            dry_run,
            output,
        } => commands::import::run(input_file, &contract, store, sheet.as_deref(), dry_run, &output),
        Commands::Contracts { action } => match action {
            ContractsAction::List => commands::contracts::list(),
            ContractsAction::Show { name } => commands::contracts::show(&name),
            ContractsAction::Validate { file } => commands::contracts::validate(&file),
        },
        Commands::Marks { action } => match action {
            MarksAction::Add { store, mark, name } => commands::marks::add(&store, &mark, &name),
            MarksAction::List { store } => commands::marks::list(&store),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
