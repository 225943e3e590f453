use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use serde::Serialize;

use lattice::{
    components::{Name, Position, Velocity},
    config::WorldConfig,
    ecs::{Entity, QuerySpec, World},
    scenario::ScenarioLoader,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Run a lattice scenario and print every tick")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/drift.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// World config YAML replacing the scenario's `world` section
    #[arg(long)]
    world_config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// Print rows as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct BodyRow<'a> {
    tick: u64,
    entity: Entity,
    name: &'a str,
    position: Position,
    velocity: Option<Velocity>,
}

fn print_tick(world: &World, json: bool) -> Result<()> {
    let spec = QuerySpec::new()
        .with::<Name>()
        .with::<Position>()
        .maybe::<Velocity>();
    let query = world.query(spec);
    for row in &query {
        let name = row.fetch::<Name>()?;
        let body = BodyRow {
            tick: world.tick(),
            entity: row.entity(),
            name: &name.0,
            position: *row.fetch::<Position>()?,
            velocity: row.get::<Velocity>().map(|velocity| *velocity),
        };
        if json {
            println!("{}", serde_json::to_string(&body)?);
        } else {
            let velocity = body
                .velocity
                .map(|v| format!("({:.3}, {:.3})", v.x, v.y))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "tick {:>4} {:>5} {:<12} pos ({:.3}, {:.3}) vel {}",
                body.tick, body.entity, body.name, body.position.x, body.position.y, velocity
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let level = cli
        .log_level
        .unwrap_or_else(|| scenario.logging.level_filter());
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let mut world = match &cli.world_config {
        Some(path) => scenario.build_world_with(WorldConfig::from_yaml(path)?)?,
        None => scenario.build_world()?,
    };
    let ticks = scenario.ticks(cli.ticks);

    for _ in 0..ticks {
        let report = world.run()?;
        for skipped in report.skipped() {
            log::debug!("tick {}: {skipped} skipped", report.tick);
        }
        print_tick(&world, cli.json)?;
    }

    if let Some(average) = world.average_run_time() {
        log::info!("average run time {average:?}");
    }
    println!(
        "Scenario '{}' completed for {} ticks. Bodies remaining: {}",
        scenario.name,
        ticks,
        world.entity_count()
    );
    Ok(())
}
