use smallsh::flags::Flags;
use smallsh::shell::Shell;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = flags.parse(&args) {
        eprintln!("smallsh: {}", e);
        flags.print_help();
        return ExitCode::from(2);
    }

    if flags.is_set("help") {
        flags.print_help();
        return ExitCode::SUCCESS;
    }

    if flags.is_set("version") {
        println!("smallsh {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_logging(flags.is_set("debug"));

    match Shell::new(flags).and_then(|mut shell| shell.run()) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("smallsh: {}", e);
            ExitCode::FAILURE
        }
    }
}

// Diagnostics go to stderr so they never mix with the prompt protocol.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("smallsh=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
