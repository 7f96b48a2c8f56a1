//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `foodjournal_core` linkage and store bootstrap outside any UI.
//! - Walk one record/browse cycle against a real store file.
//!
//! Usage: `foodjournal_cli [data_dir]` (defaults to `FOODJOURNAL_DATA_DIR`,
//! then the current directory). Logs go to `<data_dir>/logs`.

use foodjournal_core::{
    default_log_level, init_logging, Category, CategoryFilter, JournalService, Store,
    StoreConfig, StoreJournalRepository, StoreUserRepository, UserRepository,
};
use std::path::PathBuf;
use std::process::ExitCode;

const DEMO_EMAIL: &str = "demo@foodjournal.local";

fn main() -> ExitCode {
    println!("foodjournal_core ping={}", foodjournal_core::ping());
    println!("foodjournal_core version={}", foodjournal_core::core_version());

    let config = match std::env::args().nth(1) {
        Some(dir) => StoreConfig::in_dir(dir),
        None => StoreConfig::from_env(),
    };
    match start_logging(&config) {
        Ok(Some(log_dir)) => println!("logging to {}", log_dir.display()),
        Ok(None) => {}
        Err(err) => eprintln!("foodjournal_cli: logging disabled: {err}"),
    }
    let store = Store::new(config);

    match run(&store) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("foodjournal_cli failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging(config: &StoreConfig) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let Some(log_dir) = config.log_dir() else {
        return Ok(None);
    };
    let log_dir = if log_dir.is_absolute() {
        log_dir
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    init_logging(default_log_level(), &log_dir)?;
    Ok(Some(log_dir))
}

fn run(store: &Store) -> Result<(), Box<dyn std::error::Error>> {
    store.ensure_ready()?;
    println!("store ready: {:?}", store.config().location);

    let users = StoreUserRepository::new(store);
    let user_id = match users.find_user_by_email(DEMO_EMAIL)? {
        Some(user) => user.id,
        None => users.create_user(DEMO_EMAIL, "demo")?,
    };

    let service = JournalService::new(StoreJournalRepository::new(store));
    let entry = service.record_entry(
        user_id,
        "file:///demo/oatmeal.jpg",
        "Oatmeal",
        Category::Breakfast.as_str(),
    )?;
    println!("recorded entry id={}", entry.id);

    let breakfasts =
        service.entries_for_user(user_id, &CategoryFilter::from(Category::Breakfast))?;
    println!("{}", serde_json::to_string_pretty(&breakfasts)?);
    Ok(())
}
