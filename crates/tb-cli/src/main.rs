//! toxicblend CLI
//!
//! Sends a mesh from an OBJ file to the toxicblend geometry server, runs
//! one of its operators, and writes the resulting objects back out as OBJ.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tb_core::config::ClientConfig;
use tb_core::operators::{
    BrushMode, BrushType, MedianAxis, ParametricCircle, ProjectionPlane, Volume,
};
use tb_core::{UnitSettings, UnitSystem};
use toxicblend::commands;
use toxicblend::output::print_error;

#[derive(Parser)]
#[command(name = "toxicblend")]
#[command(author, version, about = "Client for the toxicblend geometry server")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Server host (overrides config)
    #[arg(long, global = true, env = "TOXICBLEND_HOST")]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(long, global = true, env = "TOXICBLEND_PORT")]
    port: Option<u16>,

    /// Directory received objects are written to
    #[arg(short, long, global = true, default_value = ".")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Median axis of a flat outline
    MedianAxis {
        /// OBJ file holding the outline
        input: PathBuf,
        #[command(flatten)]
        plane: PlaneArgs,
        /// Z values below this count as zero
        #[arg(long, default_value_t = 1.5)]
        z_epsilon: f64,
        /// Filter for internal edges
        #[arg(long, default_value_t = 0.5)]
        dot_product_limit: f64,
    },

    /// Let the server generate a circle
    Circle {
        #[command(flatten)]
        plane: PlaneArgs,
        /// Maximum deviation before a segment is split
        #[arg(long, default_value_t = 0.5)]
        simplify_limit: f64,
        #[arg(long, default_value_t = 1.5)]
        z_epsilon: f64,
        #[arg(long, default_value_t = 0.95)]
        dot_product_limit: f64,
    },

    /// Voxel volume brushed along the edges of a lattice
    Volume {
        /// OBJ file holding the lattice
        input: PathBuf,
        /// sphere or box
        #[arg(long, default_value = "sphere")]
        brush_type: BrushType,
        /// additive, multiply, replace or peak
        #[arg(long, default_value = "peak")]
        brush_mode: BrushMode,
        #[arg(long, default_value_t = 1.0)]
        brush_size: f64,
        /// Voxel grid resolution
        #[arg(long, default_value_t = 32.0)]
        resolution: f64,
        #[arg(long, default_value_t = 0.66)]
        iso_value: f64,
        #[arg(long, default_value_t = 1.0)]
        draw_step: f64,
    },

    /// Send any command with raw properties
    Send {
        /// Command identifier, e.g. object.toxicblend_medianaxis
        command: String,
        /// OBJ file to send as the active object
        input: Option<PathBuf>,
        /// Property as key=value (repeatable)
        #[arg(short, long = "property")]
        properties: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Settings shared by the planar operators
#[derive(Args)]
struct PlaneArgs {
    /// Projection plane: xy, xz or yz
    #[arg(long, default_value = "xy")]
    plane: ProjectionPlane,
    /// Let the server use several threads
    #[arg(long)]
    multithreading: bool,
    /// Scene unit system: none, metric or imperial
    #[arg(long, default_value = "metric")]
    unit_system: UnitSystem,
    /// Scene unit scale
    #[arg(long, default_value_t = 1.0)]
    unit_scale: f64,
}

impl PlaneArgs {
    fn units(&self) -> UnitSettings {
        UnitSettings {
            system: self.unit_system,
            scale_length: self.unit_scale,
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the settings in effect
    Show,
    /// Show config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => {
                commands::config_show(cli.config.as_ref(), &effective_config(&cli)?)
            }
            ConfigAction::Path => {
                commands::config_path(cli.config.as_ref());
                Ok(())
            }
            ConfigAction::Init { force } => commands::config_init(cli.config.as_ref(), *force),
        };
    }

    let config = effective_config(&cli)?;
    tracing::debug!(address = %config.address(), "Using server");

    match cli.command {
        Commands::MedianAxis {
            input,
            plane,
            z_epsilon,
            dot_product_limit,
        } => {
            let operator = MedianAxis {
                projection_plane: plane.plane,
                use_multithreading: plane.multithreading,
                z_epsilon,
                dot_product_limit,
                units: plane.units(),
            };
            commands::operator_command(&config, &operator, Some(&input), &cli.output_dir)?;
        }

        Commands::Circle {
            plane,
            simplify_limit,
            z_epsilon,
            dot_product_limit,
        } => {
            let operator = ParametricCircle {
                projection_plane: plane.plane,
                use_multithreading: plane.multithreading,
                simplify_limit,
                z_epsilon,
                dot_product_limit,
                units: plane.units(),
            };
            commands::operator_command(&config, &operator, None, &cli.output_dir)?;
        }

        Commands::Volume {
            input,
            brush_type,
            brush_mode,
            brush_size,
            resolution,
            iso_value,
            draw_step,
        } => {
            let operator = Volume {
                brush_type,
                brush_mode,
                brush_size,
                resolution,
                iso_value,
                draw_step,
            };
            commands::operator_command(&config, &operator, Some(&input), &cli.output_dir)?;
        }

        Commands::Send {
            command,
            input,
            properties,
        } => {
            commands::send_command(
                &config,
                &command,
                input.as_deref(),
                &properties,
                &cli.output_dir,
            )?;
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

/// Config file settings with command-line overrides applied
fn effective_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = commands::resolve_config(cli.config.as_ref())?;
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    Ok(config)
}
