// CLI module for httpdump
// Author: kelexine (https://github.com/kelexine)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// httpdump - HTTP traffic dumping with secret masking and retries
#[derive(Parser, Debug)]
#[command(name = "httpdump", version, about, long_about = None)]
pub struct Args {
    /// Configuration file (default: ~/.httpdump/config.toml)
    #[arg(long, short, env = "HTTPDUMP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a reverse proxy that dumps inbound and upstream traffic
    Serve {
        /// Upstream base URL, overrides `upstream.base_url`
        #[arg(long)]
        upstream: Option<String>,

        /// Listen port, overrides `server.port`
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Perform one request through the retry and dump pipeline
    Fetch {
        url: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as `Name: value`; repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,
    },
}

/// Splits a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let args = Args::parse_from([
            "httpdump",
            "fetch",
            "https://example.com/?token=abc",
            "-X",
            "POST",
            "-H",
            "Authorization: Bearer secret",
            "-d",
            "{}",
        ]);

        match args.command {
            Command::Fetch {
                url,
                method,
                headers,
                data,
            } => {
                assert_eq!(url, "https://example.com/?token=abc");
                assert_eq!(method, "POST");
                assert_eq!(headers, vec!["Authorization: Bearer secret"]);
                assert_eq!(data.as_deref(), Some("{}"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_with_global_config() {
        let args = Args::parse_from(["httpdump", "serve", "--port", "9090", "--config", "x.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            args.command,
            Command::Serve {
                port: Some(9090),
                upstream: None
            }
        ));
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Content-Type: application/json"),
            Some(("Content-Type", "application/json"))
        );
        assert_eq!(parse_header("X-Empty:"), Some(("X-Empty", "")));
        assert_eq!(parse_header("no colon"), None);
        assert_eq!(parse_header(": value"), None);
    }
}
