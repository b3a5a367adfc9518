//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Reverse proxy exposing exactly the operations an OpenAPI document
/// declares and forwarding them to one backend.
#[derive(Debug, Parser)]
#[command(name = "specgate")]
#[command(about = "Forward the routes declared in an OpenAPI document to a backend")]
#[command(version)]
pub struct Cli {
    /// Gateway configuration file (.yaml, .yml or .json)
    #[arg(short = 'c', long, env = "SPECGATE_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// OpenAPI document, used when the config sets no openAPISpecURL
    #[arg(long, env = "SPECGATE_OPENAPI", default_value = "openapi.yaml")]
    pub openapi: PathBuf,

    /// Address to bind the listener to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_explicit_args() {
        let cli = Cli::parse_from([
            "specgate",
            "--config",
            "/etc/specgate/gateway.json",
            "--openapi",
            "/srv/api.yaml",
            "--host",
            "127.0.0.1",
            "-v",
        ]);
        assert_eq!(cli.config, PathBuf::from("/etc/specgate/gateway.json"));
        assert_eq!(cli.openapi, PathBuf::from("/srv/api.yaml"));
        assert_eq!(cli.host, "127.0.0.1");
        assert!(cli.verbose);
    }

    #[test]
    fn test_default_host() {
        let cli = Cli::parse_from(["specgate", "-c", "gw.yaml"]);
        assert_eq!(cli.host, "0.0.0.0");
        assert!(!cli.verbose);
    }
}
