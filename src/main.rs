//! Purpose: `jsonsieve` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.

use std::io::{self, IsTerminal};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueHint};
use serde_json::{Value, json};

mod init_data;
mod serve;

use jsonsieve::api::{Error, ErrorKind, FileSource, RemoteSource, Source, to_exit_code};

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => {
            let config = serve_config_from_args(args)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))
        }
        Command::Init(args) => {
            let timeout = positive_timeout(args.timeout_ms)?;
            let result = init_data::init(init_data::InitConfig {
                url: args.url,
                out: args.out,
                timeout,
                force: args.force,
            })?;
            emit_json(json!({
                "initialized": {
                    "path": result.path,
                    "records": result.records,
                    "overwrote_existing": result.overwrote_existing,
                }
            }));
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(
    name = "jsonsieve",
    version,
    about = "Serve a JSON dataset over HTTP with filtering and sorting",
    after_help = r#"EXAMPLES
  $ jsonsieve init --url https://data.example.com/records.json
  $ jsonsieve serve --data data/records.json
  $ curl 'http://127.0.0.1:3000/api/data?filter=status:active&sort=id:asc'"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Run the HTTP server",
        after_help = r#"EXAMPLES
  $ jsonsieve serve --data data/records.json
  $ jsonsieve serve --fetch-url https://data.example.com/records.json
  $ curl 'http://127.0.0.1:3000/api/data?filter=status:active'"#
    )]
    Serve(ServeArgs),
    #[command(
        about = "Fetch a dataset from a remote URL and write the local data file",
        after_help = r#"EXAMPLES
  $ jsonsieve init --url https://data.example.com/records.json
  $ jsonsieve init --url https://data.example.com/records.json --out data/records.json --force"#
    )]
    Init(InitArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:3000", help = "Address to bind")]
    bind: SocketAddr,
    #[arg(
        long,
        default_value = "data/records.json",
        value_hint = ValueHint::FilePath,
        help = "Path to the JSON data file"
    )]
    data: PathBuf,
    #[arg(
        long,
        conflicts_with = "data",
        value_hint = ValueHint::Url,
        help = "Fetch data from this URL on every request instead of reading a file"
    )]
    fetch_url: Option<String>,
    #[arg(long, default_value_t = 5000, help = "Remote fetch timeout in milliseconds")]
    timeout_ms: u64,
    #[arg(
        long = "cors-origin",
        value_name = "ORIGIN",
        help = "Allowed CORS origin (repeatable)"
    )]
    cors_origin: Vec<String>,
}

#[derive(Args)]
struct InitArgs {
    #[arg(long, value_hint = ValueHint::Url, help = "URL returning a JSON array of records")]
    url: String,
    #[arg(
        long,
        default_value = "data/records.json",
        value_hint = ValueHint::FilePath,
        help = "Output path for the data file"
    )]
    out: PathBuf,
    #[arg(long, default_value_t = 5000, help = "Fetch timeout in milliseconds")]
    timeout_ms: u64,
    #[arg(long, help = "Overwrite an existing data file")]
    force: bool,
}

fn serve_config_from_args(args: ServeArgs) -> Result<serve::ServeConfig, Error> {
    let timeout = positive_timeout(args.timeout_ms)?;
    let source = match args.fetch_url {
        Some(url) => Source::Remote(RemoteSource::new(&url)?.with_timeout(timeout)),
        None => Source::File(FileSource::new(args.data)),
    };
    Ok(serve::ServeConfig {
        bind: args.bind,
        source,
        cors_origins: args.cors_origin,
    })
}

fn positive_timeout(timeout_ms: u64) -> Result<Duration, Error> {
    if timeout_ms == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--timeout-ms must be greater than zero")
            .with_hint("Use a positive value like 5000."));
    }
    Ok(Duration::from_millis(timeout_ms))
}

fn emit_json(value: Value) {
    let json = serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }

    let value = json!({
        "error": {
            "kind": format!("{:?}", err.kind()),
            "message": err.message(),
            "hint": err.hint(),
            "path": err.path().map(|path| path.display().to_string()),
            "url": err.url(),
        }
    });
    let json = serde_json::to_string(&value)
        .unwrap_or_else(|_| "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string());
    eprintln!("{json}");
}
