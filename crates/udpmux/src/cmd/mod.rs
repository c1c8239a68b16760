use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach to a UDP port and print received values.
    Listen(ListenArgs),
    /// Encode and send a single value.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// UDP port to receive on (0 = OS-assigned, printed to stderr).
    pub port: u16,
    /// Channels to attach and print (comma-separated).
    #[arg(long, value_delimiter = ',', default_value = "0")]
    pub channels: Vec<u32>,
    /// Exit after printing N values.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Destination address (host:port).
    pub dest: String,
    /// Channel to send on.
    #[arg(long, short = 'c', default_value = "0")]
    pub channel: u32,
    /// UTF-8 string payload.
    #[arg(long, conflicts_with_all = ["json", "int", "uint", "boolean", "null"])]
    pub data: Option<String>,
    /// JSON payload mapped onto the wire types (objects unsupported).
    #[arg(long, conflicts_with_all = ["data", "int", "uint", "boolean", "null"])]
    pub json: Option<String>,
    /// Signed 64-bit integer payload.
    #[arg(long, conflicts_with_all = ["data", "json", "uint", "boolean", "null"])]
    pub int: Option<i64>,
    /// Unsigned 64-bit integer payload.
    #[arg(long, conflicts_with_all = ["data", "json", "int", "boolean", "null"])]
    pub uint: Option<u64>,
    /// Boolean payload.
    #[arg(long, conflicts_with_all = ["data", "json", "int", "uint", "null"])]
    pub boolean: Option<bool>,
    /// Null payload.
    #[arg(long, conflicts_with_all = ["data", "json", "int", "uint", "boolean"])]
    pub null: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
