use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the plugin manifest the host installer consumes
    Manifest {
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },

    /// List the declared permissions
    Permissions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the declared storage tables
    Storages {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a plugin manifest
    Check {
        /// Manifest JSON file to validate instead of the built-in one
        #[arg(long)]
        manifest: Option<String>,
    },

    /// Store and list catches against an in-memory host
    Simulate {
        /// Owner address of the simulated catches
        #[arg(long)]
        owner: String,

        /// Number of catches to store
        #[arg(long, short, default_value = "3")]
        count: u32,

        /// Bridge configuration file (TOML)
        #[arg(long)]
        config: Option<String>,
    },
}
