//! formstore CLI entry point.

use clap::Parser;
use formstore::cli::commands;
use formstore::cli::{Cli, Commands, OutputFormat};
use formstore::error::Error;
use std::process::ExitCode;

/// Rewrite named flags to positional args.
///
/// Scripts and agents tend to write `--form survey` instead of the
/// positional `survey`. Known aliases are stripped so both forms work.
fn preprocess_args(args: impl Iterator<Item = String>) -> Vec<String> {
    // Only flags that shadow positional args belong here.
    const POSITIONAL_ALIASES: &[&str] = &[
        "--form",    // submit, list, export
        "--form-id", // submit, list, export
        "--file",    // import
    ];

    let mut result = Vec::new();
    let mut iter = args.peekable();

    while let Some(arg) = iter.next() {
        if POSITIONAL_ALIASES.contains(&arg.as_str()) {
            if let Some(value) = iter.next() {
                result.push(value);
            }
        } else if let Some(flag) = POSITIONAL_ALIASES
            .iter()
            .find(|f| arg.starts_with(&format!("{f}=")))
        {
            result.push(arg[flag.len() + 1..].to_string());
        } else {
            result.push(arg);
        }
    }

    result
}

fn main() -> ExitCode {
    let args = preprocess_args(std::env::args());
    let cli = Cli::parse_from(args);

    if cli.silent {
        formstore::SILENT.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.dry_run {
        formstore::DRY_RUN.store(true, std::sync::atomic::Ordering::Relaxed);
    }
    if cli.format == OutputFormat::Csv {
        formstore::CSV_OUTPUT.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    init_tracing(cli.verbose, cli.quiet);

    // --json OR --format json OR non-TTY stdout
    let json = cli.json
        || cli.format == OutputFormat::Json
        || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // RUST_LOG wins over -v
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let db = cli.db.as_ref();
    let actor = cli.actor.as_deref();

    match &cli.command {
        Commands::Init { force } => commands::init::execute(db, *force, json),
        Commands::Version => commands::version::execute(json),
        Commands::Submit(args) => commands::submit::execute(args, db, actor, json),
        Commands::List { form_id } => commands::list::execute(form_id, db, json),
        Commands::Forms => commands::list::execute_forms(db, json),
        Commands::Export(args) => commands::sync::export(args, db, json),
        Commands::Import { file } => commands::sync::import(file, db, actor, json),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
