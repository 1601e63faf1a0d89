use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tagstore-server", about = "Conditional-request user store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to TOML configuration file. Built-in defaults when omitted.
    #[arg(long, env = "TAGSTORE_CONFIG")]
    pub config: Option<String>,

    /// Override `api_port` from the config.
    #[arg(long, env = "TAGSTORE_PORT")]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_args() {
        let cli = Cli::try_parse_from(["tagstore-server", "serve", "--config", "x.toml", "--port", "8081"])
            .unwrap();
        let Commands::Serve(args) = cli.command;
        assert_eq!(args.config.as_deref(), Some("x.toml"));
        assert_eq!(args.port, Some(8081));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["tagstore-server"]).is_err());
    }
}
