use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use csv_bulk_import::app::{self, Outcome};
use csv_bulk_import::conf::Config;
use csv_bulk_import::input::{ArgsInput, InputProvider, MixedInput, PromptInput};

#[derive(Parser, Debug)]
#[command(name = "csv-bulk-import", version, about = "Load a CSV file into an index through the _bulk API")]
struct Args {
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,
    #[arg(short, long, value_name = "NAME")]
    index: Option<String>,
    #[arg(short = 'H', long, value_name = "HOST:PORT")]
    host: Option<String>,
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Never prompt; omitted index and host take their defaults.
    #[arg(short, long)]
    yes: bool,
    /// Print the bulk body instead of sending it.
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.json_logs);

    info!(
        "Args file={:?}, index={:?}, host={:?}, config={:?}, yes={}, dry_run={}",
        args.file, args.index, args.host, args.config, args.yes, args.dry_run
    );

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let flags = ArgsInput::new(args.file, args.index, args.host);
    let mut provider: Box<dyn InputProvider> = if args.yes {
        Box::new(flags)
    } else {
        let prompt = PromptInput::new(BufReader::new(io::stdin()), io::stderr());
        Box::new(MixedInput::new(flags, prompt))
    };

    let mut stdout = io::stdout();
    match app::run(provider.as_mut(), &config, args.dry_run, &mut stdout).await {
        Ok(Outcome::Rejected { error }) => {
            error!("{}", error);
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
