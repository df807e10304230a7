//! Maintenance commands for the chess bracket database.

use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cb_server::config::{ConfigOverrides, ServerConfig};
use chess_bracket::{
    BracketManager,
    availability::{DaySet, Period},
    bracket::TournamentId,
    competitor::{CompetitorFilter, NewCompetitor},
    db::Database,
};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Administer the chess bracket database

USAGE:
  cb_admin [OPTIONS] <COMMAND>

COMMANDS:
  migrate                  Apply pending migrations
  seed                     Register the sample competitors
  export                   Write scheduled matches as CSV

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --torneio    ID          Export one tournament only  [default: all]
  --output     FILE        Export destination          [default: stdout]

FLAGS:
  -h, --help               Print help information
";

/// Sample pool: name, course, phone, period, weekdays
const SAMPLE_COMPETITORS: [(&str, &str, &str, Period, &str); 10] = [
    ("Enner David Mamani Quispe", "LOG T1", "11 96549-8578", Period::Morning, "segunda a sexta"),
    ("Wellington de Jesus Andrade", "LOG T1", "11 94849-0469", Period::Morning, "segunda a sexta"),
    ("Vitor Antonio J. de Souza", "DEV S4", "11 94947-9289", Period::Afternoon, "segunda a sexta"),
    ("Cesar Henry Villalobos Gutierrez", "LOG F1", "11 94882-9588", Period::Afternoon, "segunda a sexta"),
    ("Nicoly Kelly Villalba Gonsalez", "2BT 4-6E", "11 94880-6988", Period::Afternoon, "quarta e sexta"),
    ("Gabriel Pedro de Souza", "DEV SESI 4", "11 98316-1432", Period::FullDay, "segunda e terca"),
    ("Antonio Carlos Coelho Cajutio", "AUTOCAD/Excel", "11 99264-3674", Period::Afternoon, "sexta"),
    ("Maria Silva Santos", "LOG T2", "11 98765-4321", Period::Morning, "segunda a sexta"),
    ("João Pedro Oliveira", "DEV S3", "11 97654-3210", Period::Afternoon, "segunda a sexta"),
    ("Ana Carolina Ferreira", "LOG T3", "11 96543-2109", Period::FullDay, "segunda a sexta"),
];

struct Args {
    command: String,
    database_url: Option<String>,
    tournament: Option<TournamentId>,
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        database_url: pargs.opt_value_from_str("--db-url")?,
        tournament: pargs.opt_value_from_str("--torneio")?,
        output: pargs.opt_value_from_str("--output")?,
        command: match pargs.opt_free_from_str::<String>()? {
            Some(command) => command,
            None => {
                print!("{HELP}");
                std::process::exit(2);
            }
        },
    };

    env_logger::builder().format_target(false).init();

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let config = ServerConfig::from_env(ConfigOverrides {
        database_url: args.database_url,
        ..ConfigOverrides::default()
    })?;

    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    let manager = BracketManager::new(Arc::new(db.store()));

    match args.command.as_str() {
        "migrate" => {
            db.migrate().await.context("Failed to apply migrations")?;
            println!("Migrations applied");
        }
        "seed" => seed(&manager).await?,
        "export" => {
            let written = match &args.output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Failed to create {}", path))?;
                    manager.export_schedule(args.tournament, file).await?
                }
                None => {
                    let stdout = io::stdout();
                    let written = manager.export_schedule(args.tournament, stdout.lock()).await?;
                    stdout.lock().flush()?;
                    written
                }
            };
            info!("Exported {} scheduled matches", written);
        }
        other => bail!("Unknown command '{}'\n\n{}", other, HELP),
    }

    db.close().await;
    Ok(())
}

async fn seed(manager: &BracketManager) -> Result<()> {
    for (name, course, phone, period, days) in SAMPLE_COMPETITORS {
        let competitor = NewCompetitor {
            name: name.to_string(),
            course: course.to_string(),
            phone: phone.to_string(),
            period,
            days: DaySet::parse(days)?,
        };
        manager.register_competitor(competitor).await?;
    }

    let total = manager
        .list_competitors(&CompetitorFilter::default())
        .await?
        .len();
    println!(
        "{} competitors added, {} registered in total",
        SAMPLE_COMPETITORS.len(),
        total
    );

    Ok(())
}
