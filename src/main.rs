use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use std::path::PathBuf;
use tracing::trace;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use volfmt::{format_volume, VolumeParams};

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lay out and write a fresh volume image
    Format {
        #[arg(index = 1, default_value = "myvolume.dat")]
        image: PathBuf,
        /// Bytes per block
        #[arg(short = 'b', long, default_value_t = 512)]
        block_size: u32,
        /// Total blocks in the volume
        #[arg(short = 'c', long, default_value_t = 4096)]
        total_blocks: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
    trace!("Starting up volfmt cli");
    match cli.command {
        Command::Format {
            image,
            block_size,
            total_blocks,
        } => {
            let params = VolumeParams {
                block_size,
                total_blocks,
            };
            println!("Formatting volume: {}", image.display());
            let map = format_volume(&image, params).wrap_err("Failed to format volume")?;
            println!("Layout:");
            println!(
                "  VCB: start={}, len={}",
                map.vcb.start_block, map.vcb.length_blocks
            );
            println!(
                "  Free space: start={}, len={}",
                map.free_bitmap.start_block, map.free_bitmap.length_blocks
            );
            println!(
                "  Root dir: start={}, len={}",
                map.root_dir.start_block, map.root_dir.length_blocks
            );
            println!("Volume formatted successfully.");
        }
    }
    Ok(())
}
