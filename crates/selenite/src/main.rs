//
// main.rs
//
// Command-line entry point
//

use std::env;
use std::fs::File;

use anyhow::Context;

fn print_usage() {
    println!("selenite {}, a Lua Language Server.", env!("CARGO_PKG_VERSION"));
    print!(
        r#"
Usage: selenite [OPTIONS]

Available options:

--stdio                      Start the LSP server using stdio transport
--log-file <PATH>            Write logs to PATH instead of stderr
--version                    Print the version
--help                       Print this help message

"#
    );
}

fn init_logging(log_file: Option<String>) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(path) = log_file {
        let file = File::create(&path).with_context(|| format!("Cannot open log file '{path}'"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut argv = env::args();
    argv.next(); // skip executable name

    let mut use_stdio = false;
    let mut log_file = None;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--stdio" => use_stdio = true,
            "--log-file" => {
                let path = argv
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Missing value for '--log-file'"))?;
                log_file = Some(path);
            }
            "--version" => {
                println!("selenite {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_usage();
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("Unknown argument: '{other}'"));
            }
        }
    }

    if !use_stdio {
        print_usage();
        return Ok(());
    }

    init_logging(log_file)?;

    selenite::backend::start_lsp().await
}
