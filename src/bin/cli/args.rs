use clap::{Parser, Subcommand};
use mq_stomp::Domain;

use super::logging::{LogFormat, LogLevel};

#[derive(Parser)]
#[command(name = "mq-stomp")]
#[command(version)]
#[command(about = "Send or receive messages over STOMP")]
pub struct Cli {
    /// STOMP broker address (host:port)
    #[arg(short, long, env = "MQ_STOMP_ADDRESS", default_value = mq_stomp::config::DEFAULT_ADDRESS)]
    pub address: String,

    /// Login username
    #[arg(short, long, default_value = "guest")]
    pub login: String,

    /// Passcode
    #[arg(short, long, env = "MQ_STOMP_PASSCODE", default_value = "guest")]
    pub passcode: String,

    /// Destination name (without the /queue or /topic prefix)
    #[arg(short, long, default_value = "simpleQ")]
    pub destination: String,

    /// Destination domain: queue or topic
    #[arg(long, default_value = "queue", value_parser = parse_domain)]
    pub domain: Domain,

    /// Log verbosity (overridden by RUST_LOG)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Send a text message one or more times
    Send {
        /// Message body
        #[arg(short, long, default_value = "Hello World")]
        message: String,

        /// Number of times to send the message
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
    /// Subscribe and print replies until interrupted
    Receive,
}

fn parse_domain(s: &str) -> Result<Domain, String> {
    s.parse::<Domain>().map_err(|e| e.to_string())
}
