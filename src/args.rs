use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Review capture and distribution API server")]
pub struct Cli {
    /// Port to listen on; overrides SERVER_API_PORT
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Apply embedded migrations before serving
    #[arg(short, long)]
    pub migrate: bool,
}

pub fn parse_cli_args() -> Cli {
    let args = Cli::parse();
    tracing::debug!(?args, "parsed command line");
    args
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let args = Cli::try_parse_from(["reviewhub-server", "--port", "8080", "--migrate"]).unwrap();
        assert_eq!(args.port, Some(8080));
        assert!(args.migrate);

        let args = Cli::try_parse_from(["reviewhub-server"]).unwrap();
        assert_eq!(args.port, None);
        assert!(!args.migrate);
    }
}
