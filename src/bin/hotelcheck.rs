//! hotelcheck CLI: hotel accessibility analysis.
//!
//! Usage:
//!   hotelcheck analyze --url <url> --name <name> --location <location> [--db path | --remote]
//!   hotelcheck show <hotel-id> [--db path | --remote]
//!   hotelcheck list [--db path | --remote]

use clap::{Args, Parser, Subcommand};
use hotelcheck::config::{self, RemoteConfig};
use hotelcheck::report;
use hotelcheck::{
    AnalysisOrchestrator, AnalysisSession, AuthProvider, HotelId, HotelInput, HotelStore,
    MockScoringEngine, OpenStore, RestAuth, RestStore, RollbackPolicy, SqliteStore, StaticAuth,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hotelcheck",
    version,
    about = "Analyze and record hotel accessibility"
)]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BackendArgs {
    /// Path to SQLite database file
    #[arg(long, global = true, conflicts_with = "remote")]
    db: Option<PathBuf>,

    /// Use the hosted store (needs SUPABASE_URL and SUPABASE_ANON_KEY)
    #[arg(long, global = true)]
    remote: bool,

    /// Local user to act as (defaults to $HOTELCHECK_USER)
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a hotel and store the result
    Analyze {
        /// Hotel website URL
        #[arg(long)]
        url: String,
        /// Hotel name
        #[arg(long)]
        name: String,
        /// Hotel location, e.g. "Paris, France"
        #[arg(long)]
        location: String,
        /// Keep partially written rows when a later step fails
        #[arg(long)]
        keep_partial: bool,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a stored analysis
    Show {
        /// Hotel ID as printed by `analyze` or `list`
        hotel_id: String,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// List your analyzed hotels
    List,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "hotelcheck=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Prefix an error with what was being attempted
fn context<E: std::fmt::Display>(what: &'static str) -> impl Fn(E) -> String {
    move |e| format!("{}: {}", what, e)
}

fn open_orchestrator(backend: &BackendArgs) -> Result<AnalysisOrchestrator, String> {
    let (auth, store): (Arc<dyn AuthProvider>, Arc<dyn HotelStore>) = if backend.remote {
        let remote = RemoteConfig::from_env().map_err(context("Configuration error"))?;
        let auth = RestAuth::new(&remote).map_err(context("Failed to set up auth"))?;
        let store = RestStore::new(&remote).map_err(context("Failed to set up hosted store"))?;
        let auth: Arc<dyn AuthProvider> = Arc::new(auth);
        let store: Arc<dyn HotelStore> = Arc::new(store);
        (auth, store)
    } else {
        let db_path = backend.db.clone().unwrap_or_else(config::default_db_path);
        let store = SqliteStore::open(&db_path).map_err(context("Failed to open database"))?;
        let user = backend
            .user
            .clone()
            .or_else(|| std::env::var(config::ENV_LOCAL_USER).ok());
        let auth: Arc<dyn AuthProvider> = Arc::new(StaticAuth::from_user_name(user.as_deref()));
        let store: Arc<dyn HotelStore> = Arc::new(store);
        (auth, store)
    };

    Ok(AnalysisOrchestrator::new(
        auth,
        store,
        Arc::new(MockScoringEngine::new()),
    ))
}

async fn cmd_analyze(
    orchestrator: AnalysisOrchestrator,
    input: HotelInput,
    keep_partial: bool,
    json: bool,
) -> i32 {
    let policy = if keep_partial {
        RollbackPolicy::Leave
    } else {
        RollbackPolicy::Compensate
    };
    let session = AnalysisSession::new(Arc::new(orchestrator.with_rollback(policy)));

    eprintln!("Analyzing {}...", input.name);
    match session.submit(&input).await {
        Ok(analysis) => print_analysis(&analysis, json),
        Err(e) => {
            tracing::debug!(error = %e, "analyze failed");
            eprintln!("Error: {}", e.user_message());
            1
        }
    }
}

async fn cmd_show(orchestrator: &AnalysisOrchestrator, hotel_id: &str, json: bool) -> i32 {
    let id: HotelId = match hotel_id.parse() {
        Ok(id) => id,
        Err(_) => {
            eprintln!("Error: '{}' is not a hotel ID", hotel_id);
            return 1;
        }
    };
    match orchestrator.load_analysis(&id).await {
        Ok(Some(analysis)) => print_analysis(&analysis, json),
        Ok(None) => {
            eprintln!("Error: hotel '{}' not found", hotel_id);
            1
        }
        Err(e) => {
            tracing::debug!(error = %e, "show failed");
            eprintln!("Error: {}", e.user_message());
            1
        }
    }
}

async fn cmd_list(orchestrator: &AnalysisOrchestrator) -> i32 {
    let hotels = match orchestrator.list_hotels().await {
        Ok(hotels) => hotels,
        Err(e) => {
            tracing::debug!(error = %e, "list failed");
            eprintln!("Error: {}", e.user_message());
            return 1;
        }
    };
    if hotels.is_empty() {
        println!("No hotels analyzed yet.");
        return 0;
    }
    println!(
        "{:<36}  {:<24}  {:<20}  {:>5}  {}",
        "ID", "NAME", "LOCATION", "SCORE", "CREATED"
    );
    println!("{}", "-".repeat(106));
    for hotel in &hotels {
        println!("{}", report::render_hotel_line(hotel));
    }
    0
}

fn print_analysis(analysis: &hotelcheck::HotelAnalysis, json: bool) -> i32 {
    if json {
        match report::render_json(analysis) {
            Ok(text) => {
                println!("{}", text);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    } else {
        print!("{}", report::render_text(analysis));
        0
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let orchestrator = match open_orchestrator(&cli.backend) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Analyze {
            url,
            name,
            location,
            keep_partial,
            json,
        } => {
            let input = HotelInput::new(url, name, location);
            cmd_analyze(orchestrator, input, keep_partial, json).await
        }
        Commands::Show { hotel_id, json } => cmd_show(&orchestrator, &hotel_id, json).await,
        Commands::List => cmd_list(&orchestrator).await,
    };
    std::process::exit(code);
}
