//! CLI error type.

use std::error::Error;
use std::fmt;
use std::process;

use netupvim::config::ConfigError;
use netupvim::logging::LogError;
use netupvim::UpdateError;

/// Errors that end the program.
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line or configuration value.
    Config(String),
    /// `netupvim.ini` could not be loaded.
    ConfigFile(ConfigError),
    /// Logging could not be set up.
    Logging(LogError),
    /// The update itself failed.
    Update(UpdateError),
}

impl CliError {
    /// Print the error with its cause chain and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        let mut source = self.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Update(e) => write!(f, "{}", e),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::ConfigFile(e) => e.source(),
            CliError::Logging(e) => e.source(),
            CliError::Update(e) => e.source(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LogError> for CliError {
    fn from(e: LogError) -> Self {
        CliError::Logging(e)
    }
}

impl From<UpdateError> for CliError {
    fn from(e: UpdateError) -> Self {
        CliError::Update(e)
    }
}
