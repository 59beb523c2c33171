use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "ecap",
    author,
    version,
    about = "Embeds an authenticated-encrypted message into a carrier file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Embed a message into a carrier file.")]
    Encode(EncodeArgs),
    #[command(about = "Extract a message previously embedded with `encode`.")]
    Decode(DecodeArgs),
}

#[derive(Debug, Args)]
pub struct EncodeArgs {
    #[arg(long, value_name = "PATH", help = "Carrier file to embed into.")]
    pub carrier: std::path::PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        help = "Message file to embed, or '-' to read from stdin."
    )]
    pub message: std::path::PathBuf,

    #[arg(long, value_name = "PATH", help = "Where to write the new carrier.")]
    pub out: std::path::PathBuf,

    #[arg(
        long = "bits-per-channel",
        value_name = "1|2",
        help = "PNG LSB planes per RGB channel. Ignored for non-PNG carriers."
    )]
    pub bits_per_channel: Option<u8>,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    #[arg(long, value_name = "PATH", help = "Carrier file to extract from.")]
    pub carrier: std::path::PathBuf,

    #[arg(
        long,
        value_name = "PATH",
        help = "Where to write the recovered message, or '-' for stdout."
    )]
    pub out: std::path::PathBuf,
}
