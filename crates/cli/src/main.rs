use clap::Parser;
use envrunner_cli::Cli;

fn main() {
    // Initialize tracing based on RUST_LOG env var
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli.command.execute() {
        eprintln!("Error: {err:#}");
        // a failed child's exit code passes through unchanged
        let code = err
            .downcast_ref::<envrunner_core::Error>()
            .and_then(envrunner_core::Error::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
