//! Process-wide logging setup, performed once at startup.
//!
//! File output goes to `<log_dir>/ej_scraper_log_<date>.log`, appending when
//! the file already exists.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use chrono::{Local, NaiveDate};
use log::LevelFilter;
use serde::Deserialize;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogDestination {
    /// Write to the dated file in the log directory.
    File,
    /// Write to terminal (stdout).
    Terminal,
    /// Write to both file and terminal.
    Both,
}

pub fn initialize(destination: LogDestination, log_dir: &Path) {
    let level = LevelFilter::Info;
    let config = build_config();

    let loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File => {
            if let Some(file_logger) = create_file_logger(level, config, log_dir) {
                vec![file_logger]
            } else {
                return;
            }
        }
        LogDestination::Terminal => vec![terminal_logger(level, config)],
        LogDestination::Both => {
            let mut loggers: Vec<Box<dyn SharedLogger>> =
                vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(level, config, log_dir) {
                loggers.push(file_logger);
            }
            loggers
        }
    };

    let _ = CombinedLogger::init(loggers);
}

pub fn log_file_name(date: NaiveDate) -> String {
    format!("ej_scraper_log_{}.log", date.format("%Y-%m-%d"))
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    log_dir: &Path,
) -> Option<Box<WriteLogger<File>>> {
    let log_path = log_dir.join(log_file_name(Local::now().date_naive()));
    match open_log_file(log_dir, &log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}

fn open_log_file(log_dir: &Path, log_path: &Path) -> std::io::Result<File> {
    fs::create_dir_all(log_dir)?;
    OpenOptions::new().create(true).append(true).open(log_path)
}
