//! Available subcommands.

use std::path::PathBuf;

use clap::Subcommand;
use packsmith_core::PackageType;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PACKSMITH_PORT")]
        port: Option<u16>,
        /// Allowed CORS origin (repeatable); all origins when omitted
        #[arg(long = "allow-origin")]
        allow_origins: Vec<String>,
    },

    /// Print the dieline layout for a package as JSON or SVG
    Dieline {
        /// Package shape: box or cylinder
        #[arg(short = 't', long = "type", default_value = "box")]
        package_type: PackageType,
        /// Width in mm (diameter for cylinders)
        #[arg(long)]
        width: Option<f64>,
        /// Height in mm
        #[arg(long)]
        height: Option<f64>,
        /// Depth in mm (ignored for cylinders)
        #[arg(long)]
        depth: Option<f64>,
        /// Circle segments for cylinder caps
        #[arg(long)]
        segments: Option<usize>,
        /// Render cut and fold lines as SVG instead of JSON
        #[arg(long)]
        svg: bool,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a new product and wait for its 3D model
    Create {
        /// Product description
        prompt: String,
        /// Number of concept views to generate (1-6)
        #[arg(short = 'n', long = "images", default_value_t = 3)]
        image_count: u32,
    },

    /// Edit the current product and wait for the new model
    Edit {
        /// Change to apply
        prompt: String,
    },

    /// Wait for a running generation (e.g. started through the API)
    Wait {
        /// Give up after this many seconds
        #[arg(long, default_value_t = 900)]
        timeout: u64,
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 2000)]
        interval: u64,
    },

    /// Show product and packaging status
    Status,
}

#[cfg(test)]
mod tests {
    use crate::parser::Cli;
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_dieline_options() {
        let cli = Cli::parse_from([
            "packsmith", "dieline", "--type", "cylinder", "--width", "80", "--segments", "32",
        ]);
        match cli.command {
            Some(Commands::Dieline {
                package_type,
                width,
                segments,
                svg,
                ..
            }) => {
                assert_eq!(package_type, PackageType::Cylinder);
                assert_eq!(width, Some(80.0));
                assert_eq!(segments, Some(32));
                assert!(!svg);
            }
            _ => panic!("expected dieline"),
        }
    }

    #[test]
    fn create_defaults_to_three_images() {
        let cli = Cli::parse_from(["packsmith", "create", "a ceramic coffee mug"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Create { image_count: 3, .. })
        ));
    }

    #[test]
    fn rejects_unknown_package_type() {
        assert!(Cli::try_parse_from(["packsmith", "dieline", "--type", "sphere"]).is_err());
    }
}
