//! Configuration and CLI argument handling

use clap::Parser;

use crate::state::DEFAULT_TICK_FREQUENCY_HZ;

/// Longest meeting accepted from the command line or the API (one day)
pub const MAX_LENGTH_IN_MINUTES: u64 = 24 * 60;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "scrum-timer")]
#[command(about = "Splits a meeting evenly between speakers and keeps time")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Total meeting length in minutes
    #[arg(short, long, default_value = "15", value_parser = clap::value_parser!(u64).range(0..=MAX_LENGTH_IN_MINUTES))]
    pub length: u64,

    /// Attendee names in speaking order (repeat or comma separate)
    #[arg(short, long = "attendee", value_delimiter = ',')]
    pub attendees: Vec<String>,

    /// Timer ticks per second
    #[arg(long, default_value_t = DEFAULT_TICK_FREQUENCY_HZ, value_parser = clap::value_parser!(u32).range(1..))]
    pub tick_hz: u32,

    /// Start the meeting as soon as the server is up
    #[arg(long)]
    pub auto_start: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Attendee names with surrounding whitespace and empty entries removed
    pub fn attendee_names(&self) -> Vec<String> {
        self.attendees
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}
