use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use ulid::Ulid;

use bliss::compactor;
use bliss::config::Settings;
use bliss::engine::{Engine, SlotBoard};
use bliss::model::Zone;
use bliss::notify::NotifyHub;
use bliss::store::MemoryStore;

const USAGE: &str = "usage:
  bliss board <YYYY-MM-DD> <service-id>... [--json]
  bliss capacity <YYYY-MM-DD> [hair|nail]
  bliss services";

enum Command {
    Board { date: NaiveDate, service_ids: Vec<Ulid>, json: bool },
    Capacity { date: NaiveDate, zones: Vec<Zone> },
    Services,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("bad date {s:?}: {e}"))
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let (name, rest) = args.split_first().ok_or("missing command")?;
    match name.as_str() {
        "board" => {
            let json = rest.iter().any(|a| a == "--json");
            let mut positional = rest.iter().filter(|a| *a != "--json");
            let date = parse_date(positional.next().ok_or("missing date")?)?;
            let service_ids = positional
                .map(|s| Ulid::from_string(s).map_err(|e| format!("bad service id {s:?}: {e}")))
                .collect::<Result<Vec<_>, _>>()?;
            if service_ids.is_empty() {
                return Err("pick at least one service".into());
            }
            Ok(Command::Board { date, service_ids, json })
        }
        "capacity" => {
            let date = parse_date(rest.first().ok_or("missing date")?)?;
            let zones = match rest.get(1) {
                Some(zone) => vec![zone.parse()?],
                None => Zone::ALL.to_vec(),
            };
            Ok(Command::Capacity { date, zones })
        }
        "services" => Ok(Command::Services),
        other => Err(format!("unknown command {other:?}")),
    }
}

fn print_board(board: &SlotBoard) {
    println!(
        "{} {} ({} min, capacity {})",
        board.date, board.zone, board.total_duration, board.capacity
    );
    if board.closed {
        println!("  closed: no staff working");
    }
    if board.slots.is_empty() {
        println!("  no slots fit the selected services");
    }
    for slot in &board.slots {
        println!("  {}  {}", slot.time, if slot.available { "open" } else { "full" });
    }
}

async fn run(engine: &Engine, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Board { date, service_ids, json } => {
            let now = chrono::Local::now().naive_local();
            let board = engine.slot_board(date, &service_ids, now).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print_board(&board);
            }
        }
        Command::Capacity { date, zones } => {
            for zone in zones {
                println!("{zone}: {}", engine.zone_capacity(zone, date).await?);
            }
        }
        Command::Services => {
            for s in engine.services().await? {
                println!(
                    "{}  {:<4}  #{:<2} {:>3} min  {}-{}  {}{}",
                    s.id,
                    s.zone.as_str(),
                    s.sort_order,
                    s.duration,
                    bliss::clock::minutes_to_time(s.available_from),
                    bliss::clock::minutes_to_time(s.available_to),
                    s.name,
                    if s.is_active { "" } else { " (inactive)" }
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return Ok(ExitCode::from(2));
        }
    };

    let settings = Settings::from_env();
    bliss::observability::init(settings.metrics_port)?;

    // Ensure data directory exists
    std::fs::create_dir_all(&settings.data_dir)?;
    let store = Arc::new(MemoryStore::open(&settings.journal_path())?);
    info!("journal: {}", settings.journal_path().display());

    let compact_threshold = settings.compact_threshold;
    tokio::spawn(compactor::run_compactor(store.clone(), compact_threshold));

    let engine = Engine::new(store.clone(), Arc::new(NotifyHub::new()), settings);
    engine.seed_default_services().await?;

    let result = run(&engine, command).await;
    compactor::compact_if_needed(&store, compact_threshold).await;
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
