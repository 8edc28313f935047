use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ivr_agent::IvrAgent;
use ivr_core::{advance, classify_intent, normalize_text, DemoIdentifiers, Route, Terminal};
use ivr_observability::{init_cli_tracing, AppMetrics};
use ivr_storage::{MemoryStore, RecordRepository, SqliteStore, Store};

#[derive(Debug, Parser)]
#[command(name = "ivr")]
#[command(about = "Rail enquiry IVR operator tools")]
struct Cli {
    /// JSON record file (id -> ticket or train timing).
    #[arg(long, env = "IVR_RECORDS_PATH")]
    records: Option<PathBuf>,

    #[arg(long, env = "IVR_DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "IVR_DEMO_PNR", default_value = "PNR123")]
    demo_pnr: String,

    #[arg(long, env = "IVR_DEMO_TRAIN", default_value = "12345")]
    demo_train: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the stored record for a PNR or train number.
    Lookup { id: String },
    /// Print the intent a free-text request is classified as.
    Classify { text: String },
    /// Render the document a callback route returns for the given digits.
    Simulate {
        route: Route,
        #[arg(long)]
        digits: Option<String>,
    },
    /// Run the text shortcut and print its document.
    Process { text: String },
    /// Walk the digit menu interactively from the entry route.
    Call,
    /// Copy every record of the JSON file into the sqlite database.
    Import,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_cli_tracing("ivr_cli");
    let cli = Cli::parse();

    match &cli.command {
        Command::Lookup { id } => {
            let store = open_store(&cli).await?;
            match store.lookup(id).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("{id}: not found"),
            }
        }
        Command::Classify { text } => {
            let intent = classify_intent(&normalize_text(text));
            println!("{}", intent.as_str());
        }
        Command::Simulate { route, digits } => {
            let transition = advance(route.stage(), digits.as_deref());
            eprintln!("{} -> {}", route.stage(), transition.next);
            println!("{}", transition.prompt.render().as_str());
        }
        Command::Process { text } => {
            let store = open_store(&cli).await?;
            let agent = IvrAgent::new(
                Arc::new(store),
                AppMetrics::shared(),
                DemoIdentifiers {
                    pnr: cli.demo_pnr.clone(),
                    train_number: cli.demo_train.clone(),
                },
            );
            let document = agent.process_text(Some(text)).await;
            println!("{}", document.as_str());
        }
        Command::Call => run_call()?,
        Command::Import => {
            let (Some(records), Some(database_url)) = (&cli.records, &cli.database_url) else {
                bail!("import needs both --records and --database-url");
            };
            let source = MemoryStore::from_json_file(records).await?;
            let target = SqliteStore::connect(database_url).await?;
            let written = target.import(source.records()).await?;
            println!("imported {written} records into {database_url}");
        }
    }

    Ok(())
}

async fn open_store(cli: &Cli) -> Result<Store> {
    match (&cli.database_url, &cli.records) {
        (Some(database_url), _) => Store::sqlite(database_url).await,
        (None, Some(records)) => Store::json_file(records)
            .await
            .with_context(|| format!("failed loading records from {}", records.display())),
        (None, None) => bail!("set --records or --database-url"),
    }
}

/// Plays the flow the way the provider would: speak, collect digits for a
/// gather, follow redirects, stop on hangup.
fn run_call() -> Result<()> {
    let mut route = Route::Voice;
    let mut digits: Option<String> = None;

    println!("Calling the enquiry line. type 'exit' to hang up.");

    loop {
        let transition = advance(route.stage(), digits.take().as_deref());
        let prompt = transition.prompt;

        if let Some(gather) = &prompt.gather {
            for text in &gather.prompts {
                println!("[say] {text}");
            }
            print!("[{} digit(s)] > ", gather.num_digits);
            io::stdout().flush()?;

            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            let entered = line.trim();
            if entered.eq_ignore_ascii_case("exit") {
                break;
            }

            if !entered.is_empty() {
                route = gather.action;
                digits = Some(entered.chars().take(gather.num_digits.into()).collect());
                continue;
            }
        }

        for text in &prompt.segments {
            println!("[say] {text}");
        }

        match prompt.terminal {
            Some(Terminal::Redirect(next)) => route = next,
            Some(Terminal::Hangup) | None => {
                println!("[hangup]");
                break;
            }
        }
    }

    Ok(())
}
