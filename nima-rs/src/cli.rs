//! Root CLI structure for nima-rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nima-rs")]
#[command(about = "Command-line tools for Nima 2D skeletal actor files", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display information about an actor file
    Info {
        /// Path to the .nima file
        file: PathBuf,
    },

    /// Show the component hierarchy of an actor file
    Tree {
        /// Path to the .nima file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(long)]
        depth: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Show compact metadata inline
        #[arg(long)]
        compact: bool,
    },

    /// List the animations of an actor file
    Animations {
        /// Path to the .nima file
        file: PathBuf,
    },

    /// Play an animation and print the resulting world transforms
    Sample {
        /// Path to the .nima file
        file: PathBuf,

        /// Name of the animation to play
        animation: String,

        /// Start time in seconds
        #[arg(short, long, default_value = "0")]
        time: f32,

        /// Number of frames to sample
        #[arg(short, long, default_value = "1")]
        steps: usize,

        /// Frames per second used to advance between samples
        #[arg(long, default_value = "30")]
        fps: f32,

        /// Blend factor applied to every sampled value
        #[arg(short, long, default_value = "1")]
        mix: f32,

        /// Print samples as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
