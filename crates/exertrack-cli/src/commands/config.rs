use clap::Subcommand;
use exertrack_core::SessionConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the default configuration as TOML
    Show {
        /// Use the short-threshold test profile
        #[arg(long)]
        test_profile: bool,
    },
    /// Parse and validate a configuration file
    Check {
        /// Path to a TOML configuration file
        path: std::path::PathBuf,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show { test_profile } => {
            let config = if test_profile {
                SessionConfig::test_profile()
            } else {
                SessionConfig::default()
            };
            println!("{}", config.to_toml_string()?);
        }
        ConfigAction::Check { path } => {
            let raw = std::fs::read_to_string(&path)?;
            let config = SessionConfig::from_toml_str(&raw)?;
            println!("ok: {}", path.display());
            println!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}
