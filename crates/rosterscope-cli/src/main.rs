// rosterscope entry point.
//
// Startup sequence:
// 1. Parse arguments and resolve the base directory
// 2. Initialize tracing (log to file, stdout is for results)
// 3. Load config, copying defaults on first run
// 4. Open a session over the player table
// 5. Run the requested command and print plain text

mod output;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use rosterscope_app::Session;
use rosterscope_baseball::filter::FilterRequest;
use rosterscope_baseball::leaderboard::{distinct_values, value_counts, GroupKey, SortOrder};
use rosterscope_baseball::metrics::negative_singles;
use rosterscope_baseball::stats::StatId;
use rosterscope_baseball::table::TableCache;
use rosterscope_core::config;

/// Filter and rank college baseball roster data
#[derive(Parser, Debug)]
#[command(name = "rosterscope")]
#[command(about = "Filter, rank and summarize college baseball player seasons")]
#[command(version)]
struct Args {
    /// Directory holding config/ (or defaults/) and relative data paths
    #[arg(long = "base-dir", global = true)]
    base_dir: Option<PathBuf>,

    /// Filter request file (TOML); omitted means no filtering
    #[arg(long, global = true)]
    request: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the filtered players
    Filter {
        /// Write the filtered view to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print at most this many rows
        #[arg(long)]
        limit: Option<usize>,

        /// Explain which criterion excludes players whose name contains this text
        #[arg(long)]
        why: Option<String>,
    },

    /// Rank the filtered players by a statistic
    Leaders {
        /// Column identifier, e.g. T90_per_PA, ERA, HR
        #[arg(long)]
        stat: StatId,

        /// Number of rows (default: leaderboard.top_n)
        #[arg(short, long)]
        n: Option<usize>,

        /// Smallest values first
        #[arg(long, conflicts_with = "descending")]
        ascending: bool,

        /// Largest values first
        #[arg(long)]
        descending: bool,
    },

    /// Group counts with small groups folded into "Other"
    Legend {
        /// Outer grouping column: role, league, team, year, state, region, conference, position
        #[arg(long, default_value = "region")]
        outer: GroupKey,

        /// Inner grouping column
        #[arg(long, default_value = "team")]
        inner: GroupKey,

        /// Inner groups kept per outer group (default: leaderboard.legend_top_k)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Count filtered players per value of a column
    Values {
        #[arg(long)]
        column: GroupKey,

        /// Print the sorted distinct values only, without counts
        #[arg(long)]
        distinct: bool,
    },

    /// List hitters whose computed singles are negative
    Quality,

    /// Ask the assistant about the filtered players
    Ask {
        question: String,
    },

    /// Ask repeated questions from stdin in one session.
    /// `/history` prints recent exchanges, `/clear` forgets them, `/quit` exits.
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let base_dir = match args.base_dir.clone() {
        Some(dir) => dir,
        None => config::default_base_dir().context("failed to resolve base directory")?,
    };

    init_tracing(&base_dir)?;
    info!("rosterscope starting in {}", base_dir.display());

    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    let request = load_request(args.request.as_deref())?;

    let mut cache = TableCache::new();
    let mut session = Session::open(config, &mut cache)?;

    match args.command {
        Command::Filter { export, limit, why } => {
            let view = session.filter(&request)?;
            print!("{}", output::render_rows(&view, limit));

            if let Some(path) = export {
                let written = session.export(&request, &path)?;
                println!("wrote {written} rows to {}", path.display());
            }
            if let Some(needle) = why {
                explain(&session, &request, &needle);
            }
        }
        Command::Leaders {
            stat,
            n,
            ascending,
            descending,
        } => {
            let order = match (ascending, descending) {
                (true, _) => Some(SortOrder::Ascending),
                (_, true) => Some(SortOrder::Descending),
                _ => None,
            };
            let rows = session.leaders(&request, stat, n, order)?;
            print!("{}", output::render_leaders(&rows, stat));
        }
        Command::Legend { outer, inner, k } => {
            let entries = session.legend(&request, outer, inner, k)?;
            print!("{}", output::render_legend(&entries));
        }
        Command::Values { column, distinct } => {
            let view = session.filter(&request)?;
            if distinct {
                for value in distinct_values(&view, column) {
                    println!("{value}");
                }
            } else {
                print!("{}", output::render_counts(&value_counts(&view, column)));
            }
        }
        Command::Quality => {
            let view = session.filter(&request)?;
            let flagged = negative_singles(&view);
            println!("{} rows with negative singles", flagged.len());
            print!("{}", output::render_rows(&flagged, None));
        }
        Command::Ask { question } => {
            ask_and_print(&mut session, &question, &request).await?;
        }
        Command::Chat => {
            chat(&mut session, &request).await?;
        }
    }

    info!("rosterscope finished");
    Ok(())
}

async fn ask_and_print(
    session: &mut Session,
    question: &str,
    request: &FilterRequest,
) -> anyhow::Result<()> {
    let exchange = session
        .ask(question, request, |token| {
            print!("{token}");
            let _ = std::io::stdout().flush();
        })
        .await?;
    if exchange.failed {
        println!("Error: {}", exchange.answer);
    } else {
        println!();
    }
    Ok(())
}

/// Read questions line by line until `/quit` or end of input.
async fn chat(session: &mut Session, request: &FilterRequest) -> anyhow::Result<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/history" => print!("{}", output::render_history(session.conversation())),
            "/clear" => {
                session.clear_history();
                println!("history cleared");
            }
            question => ask_and_print(session, question, request).await?,
        }
    }
    info!(exchanges = session.conversation().len(), "chat ended");
    Ok(())
}

fn load_request(path: Option<&Path>) -> anyhow::Result<FilterRequest> {
    let Some(path) = path else {
        return Ok(FilterRequest::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read filter request {}", path.display()))?;
    FilterRequest::from_toml_str(&text)
        .with_context(|| format!("invalid filter request {}", path.display()))
}

/// Print, for every player whose name contains `needle`, the first criterion
/// that excludes them.
fn explain(session: &Session, request: &FilterRequest, needle: &str) {
    let needle = needle.to_lowercase();
    let table = session.table();
    for row in table.rows() {
        if !row.full_name().to_lowercase().contains(&needle) {
            continue;
        }
        match request.first_failing(row, table.bounds()) {
            Some(criterion) => println!(
                "{} ({}, {}): excluded by {criterion}",
                row.full_name(),
                row.role,
                row.year
            ),
            None => println!("{} ({}, {}): included", row.full_name(), row.role, row.year),
        }
    }
}

/// Initialize tracing to log to `<base_dir>/logs/rosterscope.log`.
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("rosterscope.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rosterscope=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
