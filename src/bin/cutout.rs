//! Cutout CLI tool
//!
//! Command-line interface for removing the background of a single image
//! using the cutout library.

use cutout::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
