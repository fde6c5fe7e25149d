//! Command-line front end for the person store.
//!
//! # Responsibility
//! - Map subcommands onto the `/persons` request handlers.
//! - Print the JSON response body and exit non-zero on failure.

use clap::{Parser, Subcommand};
use log::error;
use personstore_core::api::{self, ApiResponse};
use personstore_core::{
    default_log_level, init_logging, HashPersonRepository, PersonService, SqliteHashBackend,
    StoreConfig,
};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;

/// Person records stored in a SQLite-backed hash collection
#[derive(Parser, Debug)]
#[command(name = "personstore")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, default_value = "./personstore.sqlite3")]
    db: PathBuf,

    /// Optional JSON store configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a person and print it with its generated id
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        age: i64,
    },

    /// Print one person
    Get { id: String },

    /// Print one page of persons
    List {
        #[arg(long, allow_hyphen_values = true)]
        page: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        size: Option<String>,
    },

    /// Replace name and age of an existing person
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        age: i64,
    },

    /// Delete one person
    Delete { id: String },

    /// Print the number of stored persons
    Count,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("personstore: {err}");
            return ExitCode::FAILURE;
        }
    }

    let response = match run(&cli) {
        Ok(response) => response,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("personstore: {message}");
            return ExitCode::FAILURE;
        }
    };

    println!("{}", response.body);
    ExitCode::from(exit_status(&response))
}

/// 0 for a 200 response, 1 for anything else.
fn exit_status(response: &ApiResponse) -> u8 {
    if response.is_success() {
        0
    } else {
        1
    }
}

fn run(cli: &Cli) -> Result<ApiResponse, String> {
    let config = match &cli.config {
        Some(path) => StoreConfig::load(path).map_err(|err| err.to_string())?,
        None => StoreConfig::default(),
    };
    let backend = SqliteHashBackend::open(&cli.db, config.busy_timeout())
        .map_err(|err| format!("failed to open `{}`: {err}", cli.db.display()))?;
    let service = PersonService::new(HashPersonRepository::with_config(backend, &config));

    let response = match &cli.command {
        Command::Create { name, age } => {
            api::create_person(&service, &draft_body(name, *age))
        }
        Command::Get { id } => api::get_person(&service, id),
        Command::List { page, size } => {
            api::list_persons(&service, page.as_deref(), size.as_deref())
        }
        Command::Update { id, name, age } => {
            api::update_person(&service, id, &draft_body(name, *age))
        }
        Command::Delete { id } => api::delete_person(&service, id),
        Command::Count => {
            let count = service.count_persons().map_err(|err| err.to_string())?;
            return Ok(ApiResponse {
                status: api::STATUS_OK,
                body: json!({ "count": count }),
            });
        }
    };
    Ok(response)
}

fn draft_body(name: &str, age: i64) -> String {
    json!({ "name": name, "age": age }).to_string()
}
