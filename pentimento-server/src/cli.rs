//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pentimento_protocol::CodecKind;

use crate::loader::LoaderKind;

/// Overlay images onto terminal windows
#[derive(Parser, Debug)]
#[command(name = "pentimento")]
#[command(about = "Draw images on top of terminal emulators")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read commands from stdin and display the requested images
    Layer(LayerArgs),

    /// Ask running layer daemons to re-read the visible tmux clients
    #[command(name = "query_windows", alias = "query-windows")]
    QueryWindows {
        /// Process ids of the daemons to notify
        #[arg(required = true)]
        pids: Vec<u32>,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct LayerArgs {
    /// Redirect stderr to /dev/null, error records included
    #[arg(short, long)]
    pub silent: bool,

    /// Command encoding used on stdin and for error records
    #[arg(short, long, value_parser = parse_codec)]
    pub parser: Option<CodecKind>,

    /// Where images are decoded
    #[arg(short, long, value_parser = parse_loader)]
    pub loader: Option<LoaderKind>,

    /// Configuration file (default: $XDG_CONFIG_HOME/pentimento/config.toml)
    #[arg(long, env = "PENTIMENTO_CONFIG")]
    pub config: Option<PathBuf>,
}

fn parse_codec(s: &str) -> Result<CodecKind, String> {
    s.parse().map_err(|e: pentimento_protocol::CodecError| e.to_string())
}

fn parse_loader(s: &str) -> Result<LoaderKind, String> {
    s.parse()
        .map_err(|e: pentimento_utils::PentimentoError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_defaults() {
        let cli = Cli::try_parse_from(["pentimento", "layer"]).unwrap();
        let Command::Layer(args) = cli.command else {
            panic!("expected layer");
        };
        assert!(!args.silent);
        assert!(args.parser.is_none());
        assert!(args.loader.is_none());
    }

    #[test]
    fn test_parse_layer_flags() {
        let cli = Cli::try_parse_from([
            "pentimento",
            "layer",
            "--silent",
            "--parser",
            "bash",
            "--loader",
            "synchronous",
            "--config",
            "/tmp/p.toml",
        ])
        .unwrap();

        let Command::Layer(args) = cli.command else {
            panic!("expected layer");
        };
        assert!(args.silent);
        assert_eq!(args.parser, Some(CodecKind::Bash));
        assert_eq!(args.loader, Some(LoaderKind::Synchronous));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/p.toml")));
    }

    #[test]
    fn test_parse_unknown_parser() {
        assert!(Cli::try_parse_from(["pentimento", "layer", "--parser", "xml"]).is_err());
    }

    #[test]
    fn test_parse_query_windows() {
        let cli = Cli::try_parse_from(["pentimento", "query_windows", "12", "34"]).unwrap();
        let Command::QueryWindows { pids } = cli.command else {
            panic!("expected query_windows");
        };
        assert_eq!(pids, vec![12, 34]);
    }

    #[test]
    fn test_query_windows_requires_pids() {
        assert!(Cli::try_parse_from(["pentimento", "query_windows"]).is_err());
    }
}
