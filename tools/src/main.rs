//! ev-population: headless runner for the EV customer population model.
//!
//! Usage:
//!   ev-population --seed 12345 --hours 168 --db run.db
//!   ev-population --db run.db --restore <run_id>
//!   ev-population --data-dir ./data --json

use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use evcustomer_core::{
    beans::EvBeans,
    clock::SimClock,
    config::{ConfigLayer, ConfigStore},
    configurator::{BootstrapRecorder, Configurator},
    ev_customer::HourlyUsage,
    services::ServiceAccessor,
    social_class::EvSocialClass,
    store::SimStore,
};
use std::env;

#[derive(serde::Serialize)]
struct ClassSummary {
    name:        String,
    population:  usize,
    driving_now: usize,
    km:          f64,
    charged_kwh: f64,
}

#[derive(serde::Serialize)]
struct RunSummary {
    run_id:        String,
    restored_from: Option<String>,
    seed:          u64,
    hours:         u64,
    customers:     usize,
    classes:       Vec<ClassSummary>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let hours = parse_arg(&args, "--hours", 168u64);
    let json_out = args.iter().any(|a| a == "--json");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let restore = string_arg(&args, "--restore").map(str::to_string);

    let store = SimStore::open(db)?;
    store.migrate()?;

    let mut config = ConfigStore::new();
    config.add_layer(ConfigLayer::from_json_file(format!("{data_dir}/ev_customers.json"))?);

    // A restored run reuses its recorded seed unless one is given.
    let mut seed = parse_arg(&args, "--seed", 42u64);
    if let Some(from) = &restore {
        let layer = store.load_bootstrap_layer(from)?;
        if layer.is_empty() {
            bail!("no bootstrap state recorded for run '{from}' in {db}");
        }
        if !args.iter().any(|a| a == "--seed") {
            seed = store.run_seed(from)?.unwrap_or(seed);
        }
        config.add_layer(layer);
    }

    if !json_out {
        println!("EV population runner");
        println!("  seed:      {seed}");
        println!("  hours:     {hours}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        if let Some(from) = &restore {
            println!("  restore:   {from}");
        }
        println!();
    }

    let run_id = format!("run-{seed}-{}", uuid::Uuid::new_v4());
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

    let beans = EvBeans::load(&config)?;
    let mut services = ServiceAccessor::seeded(seed);
    let mut classes: Vec<EvSocialClass> = Configurator::configure_instances(&config)?;
    for class in &mut classes {
        class.initialize(&beans, &mut services)?;
    }

    let base = Utc.with_ymd_and_hms(2011, 1, 10, 0, 0, 0).single().unwrap_or_else(Utc::now);
    let mut clock = SimClock::new(base);
    let mut totals = vec![HourlyUsage::default(); classes.len()];
    for _ in 0..hours {
        let now = clock.current_time();
        for (class, total) in classes.iter_mut().zip(totals.iter_mut()) {
            *total += class.step(&now);
        }
        clock.advance();
    }

    let mut recorder = BootstrapRecorder::new();
    Configurator::gather_instances_bootstrap_state(&classes, &mut recorder);
    let saved = store.save_bootstrap(&run_id, &recorder)?;
    log::info!("saved {saved} bootstrap item(s) under {run_id}");

    let summary = RunSummary {
        run_id,
        restored_from: restore,
        seed,
        hours,
        customers: services.customer_repo.len(),
        classes: classes
            .iter()
            .zip(&totals)
            .map(|(class, total)| ClassSummary {
                name:        class.name().to_string(),
                population:  class.population(),
                driving_now: class.ev_customers().iter().filter(|c| c.is_driving()).count(),
                km:          total.km,
                charged_kwh: total.charged_kwh,
            })
            .collect(),
    };

    if json_out {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", summary.run_id);
    println!("  hours run:      {}", summary.hours);
    println!("  customers:      {}", summary.customers);
    println!();
    println!("=== CLASSES ===");
    for c in &summary.classes {
        println!(
            "  {:<16} | pop {:>4} | driving {:>3} | {:>9.1} km | {:>9.1} kWh charged",
            c.name, c.population, c.driving_now, c.km, c.charged_kwh
        );
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
