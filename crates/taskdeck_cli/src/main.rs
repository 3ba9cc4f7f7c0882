//! Offline dashboard probe.
//!
//! # Responsibility
//! - Open the local mirror database named by the environment.
//! - Print the dashboard statistics and theme from mirrored state only.

use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;
use taskdeck_core::{
    compute_stats, core_version, init_logging, open_db, Clock, CoreConfig, LocalMirror,
    Priority, SqliteSlotStore, SystemClock, TaskCategory,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_exit module=cli status=error error={message}");
            eprintln!("taskdeck: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log directory is not UTF-8: {}", log_dir.display()))?;
        init_logging(config.log_level.as_str(), log_dir)?;
    }

    let conn = open_db(&config.db_path).map_err(|err| {
        format!(
            "cannot open mirror database `{}`: {err}",
            config.db_path.display()
        )
    })?;
    let mirror = LocalMirror::new(Arc::new(SqliteSlotStore::new(conn)));

    let tasks = mirror.tasks();
    let stats = compute_stats(&tasks, SystemClock.now_ms());
    info!(
        "event=cli_dashboard module=cli status=ok total={} db={}",
        stats.total,
        config.db_path.display()
    );

    println!("taskdeck {}", core_version());
    match mirror.profile() {
        Some(profile) => println!("user        {} <{}>", profile.name, profile.email),
        None => println!("user        (signed out)"),
    }
    println!("theme       {}", mirror.theme().as_str());
    println!("total       {}", stats.total);
    println!("completed   {} ({}%)", stats.completed, stats.completion_rate());
    println!("in progress {}", stats.in_progress);
    println!("overdue     {}", stats.overdue);
    for category in TaskCategory::ALL {
        println!("  {:<20} {}", category.as_str(), stats.category_count(category));
    }
    for priority in Priority::ALL {
        println!("  {:<20} {}", priority.as_str(), stats.priority_count(priority));
    }
    let unsynced = tasks.iter().filter(|task| task.is_unsynced()).count();
    if unsynced > 0 {
        println!("unsynced    {unsynced}");
    }
    Ok(())
}
