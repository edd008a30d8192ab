use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use registry_types::RegistryConfig;

#[derive(Parser, Debug)]
#[command(name = "registry-server", about = "Versioned, channel-aware artifact registry")]
pub struct Cli {
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// YAML file overriding `RegistryConfig` defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for `FileBlobstore`; in-memory storage is used when absent.
    #[arg(long)]
    pub blob_dir: Option<PathBuf>,

    #[arg(long)]
    pub read_only: bool,

    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Loads `RegistryConfig` from `--config` if given, falling back to
/// defaults, then applies the CLI overrides that always win regardless of
/// the file (SPEC_FULL.md §6.1).
pub fn load_config(cli: &Cli) -> anyhow::Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&contents)?
        }
        None => RegistryConfig::default(),
    };
    if cli.read_only {
        config.read_only = true;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_flag_overrides_default_config() {
        let cli = Cli {
            bind: "127.0.0.1:0".parse().unwrap(),
            config: None,
            blob_dir: None,
            read_only: true,
            verbose: 0,
        };
        let config = load_config(&cli).unwrap();
        assert!(config.read_only);
    }
}
