//! Command-line probe for `checklist_core`.
//!
//! # Responsibility
//! - Run checklist operations against a local SQLite file.
//! - Sync through the SQLite-backed remote table when an account is
//!   configured via `CHECKLIST_USER_EMAIL`.
//!
//! Usage: `checklist_cli <ping|show|add|export|import> [args]`

use checklist_core::db::open_db;
use checklist_core::{
    default_log_level, export_checklist, export_collection, init_logging, parse_import, Action,
    ChecklistApp, Clock, Identity, SqliteLocalStore, SqliteRemoteStore, StaticIdentityProvider,
    SyncConfig, SystemClock,
};
use log::info;
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

const DB_FILE_NAME: &str = "checklist.sqlite3";

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> CliResult<()> {
    let Some((command, rest)) = args.split_first() else {
        print_usage();
        return Ok(());
    };

    if command == "ping" {
        println!("checklist_core ping={}", checklist_core::ping());
        println!("checklist_core version={}", checklist_core::core_version());
        return Ok(());
    }

    if let Ok(log_dir) = env::var("CHECKLIST_LOG_DIR") {
        init_logging(default_log_level(), &log_dir)?;
    }

    let db_path = db_path();
    let conn = open_db(&db_path)?;
    let local = SqliteLocalStore::try_new(&conn)?;
    let remote = SqliteRemoteStore::try_new(&conn)?;
    let config = SyncConfig::from_env();

    let provider = match env::var("CHECKLIST_USER_EMAIL") {
        Ok(email) => {
            let user_ref = email.split('@').next().unwrap_or_default().to_string();
            StaticIdentityProvider::signed_in(Identity::new(user_ref, email))
        }
        Err(_) => StaticIdentityProvider::new(Identity::new("", "")),
    };
    let mut app = ChecklistApp::new(provider, &local, &remote, SystemClock, config);
    app.start()?;
    info!(
        "event=cli_command module=cli status=start command={command} synced={}",
        app.controller().session().is_authenticated()
    );

    match command.as_str() {
        "show" => show(&app),
        "add" => {
            let text = rest.join(" ");
            app.controller_mut().dispatch(Action::AddTask { text })?;
            app.controller_mut().flush()?;
            show(&app);
        }
        "export" => {
            let out_dir = rest
                .iter()
                .find(|arg| !arg.starts_with("--"))
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            let collection = app.controller().collection();
            let file = if rest.iter().any(|arg| arg == "--all") {
                export_collection(collection)?
            } else {
                export_checklist(collection.active())?
            };
            let out_path = out_dir.join(&file.file_name);
            fs::write(&out_path, file.contents)?;
            println!("exported {}", out_path.display());
        }
        "import" => {
            let path = rest.first().ok_or("import needs a file path")?;
            let text = fs::read_to_string(path)?;
            let payload = parse_import(&text, SystemClock.now_ms())?;
            let count = payload.len();
            app.controller_mut().dispatch(Action::Import(payload))?;
            println!("imported {count} checklist(s)");
        }
        other => {
            print_usage();
            return Err(format!("unknown command `{other}`").into());
        }
    }

    app.shutdown();
    Ok(())
}

fn show<P, L, R, C>(app: &ChecklistApp<P, L, R, C>)
where
    P: checklist_core::IdentityProvider,
    L: checklist_core::LocalStore,
    R: checklist_core::RemoteStore,
    C: Clock,
{
    let collection = app.controller().collection();
    for list in collection.lists() {
        let marker = if list.id == collection.active_id() { "*" } else { " " };
        let (done, total) = list.progress();
        println!("{marker} {} ({done}/{total})", list.name);
    }
    for task in &collection.active().tasks {
        let check = if task.completed { "x" } else { " " };
        println!("    [{check}] {}", task.text);
    }
}

fn db_path() -> PathBuf {
    env::var_os("CHECKLIST_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join(DB_FILE_NAME))
}

fn print_usage() {
    println!("usage: checklist_cli <ping|show|add <text>|export [dir] [--all]|import <file>>");
}
