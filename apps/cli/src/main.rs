#![deny(warnings)]

//! Console front end: interactive play on a save slot, or a headless
//! simulation with the greedy autoplayer.

use anyhow::{bail, Context, Result};
use persistence::{default_save_path, default_settings_path, SaveSlot, Settings};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tycoon_core::{format_number, Campaign};
use tycoon_econ::{current_price, multiplier_for, prestige, production, upgrade_price};
use tycoon_runtime::{autoplay, LevelOffer, RuntimeError, Session, Start};

struct Args {
    save: PathBuf,
    settings: PathBuf,
    campaign: Option<PathBuf>,
    new_game: bool,
    simulate: Option<f64>,
    step: f64,
    json: bool,
    version: bool,
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args {
        save: PathBuf::from(default_save_path()),
        settings: PathBuf::from(default_settings_path()),
        campaign: None,
        new_game: false,
        simulate: None,
        step: 1.0,
        json: false,
        version: false,
    };
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--save" => args.save = it.next().context("--save needs a path")?.into(),
            "--settings" => args.settings = it.next().context("--settings needs a path")?.into(),
            "--campaign" => {
                args.campaign = Some(it.next().context("--campaign needs a path")?.into())
            }
            "--new" => args.new_game = true,
            "--simulate" => {
                let secs = it.next().context("--simulate needs seconds")?;
                args.simulate = Some(secs.parse().context("--simulate expects a number")?);
            }
            "--step" => {
                let secs = it.next().context("--step needs seconds")?;
                args.step = secs.parse().context("--step expects a number")?;
            }
            "--json" => args.json = true,
            "--version" | "-V" => args.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "idle-tycoon {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    // Interactive play keeps the console quiet unless RUST_LOG says otherwise.
    init_logging(if args.simulate.is_some() { "info" } else { "warn" });

    let campaign = match &args.campaign {
        Some(path) => Campaign::from_yaml_file(path)
            .with_context(|| format!("loading campaign {}", path.display()))?,
        None => Campaign::builtin()?,
    };
    info!(levels = campaign.levels().len(), "campaign loaded");

    if let Some(seconds) = args.simulate {
        return simulate(campaign, seconds, args.step, args.json);
    }

    let settings = Settings::load(&args.settings);
    let slot = SaveSlot::new(&args.save);
    let (session, start) = if args.new_game {
        (Session::new_game(campaign, settings, Some(slot))?, Start::New)
    } else {
        Session::resume_or_new(campaign, settings, slot)?
    };
    play(session, start, &args.settings)
}

fn simulate(campaign: Campaign, seconds: f64, step: f64, json: bool) -> Result<()> {
    let settings = Settings {
        autosave_seconds: 0,
    };
    let mut session = Session::new_game(campaign, settings, None)?;
    let kpi = autoplay::run_headless(&mut session, seconds, step)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&kpi)?);
        return Ok(());
    }
    println!(
        "KPI | time: {:.0}s | level: {} | money: {} | prod/s: {} | lifetime: {} | goal: {:.1}% | prestiges: {} | credits: {} (x{:.2})",
        kpi.elapsed_seconds,
        kpi.level_name,
        format_number(kpi.money, 2),
        format_number(kpi.rate_per_second, 2),
        format_number(kpi.lifetime_earnings, 2),
        kpi.goal_progress * 100.0,
        kpi.prestiges,
        kpi.prestige_credits,
        kpi.prestige_multiplier
    );
    Ok(())
}

const HELP: &str = "\
Commands:
  <enter>, c, collect     collect 1 by hand
  s, status               money, production and owned producers
  shop                    list producers and prices
  b, buy <id|#>           buy one producer
  upgrades                list upgrades for owned producers
  u, upgrade <id|#>       upgrade an owned producer by one level
  l, level                check the level goal
  advance                 move on to the next level (goal must be met)
  p, prestige [now]       show prestige info, or reset for credits
  autosave <seconds>      set autosave interval (0 disables)
  save                    save now
  q, quit                 save and exit";

fn play(mut session: Session, start: Start, settings_path: &Path) -> Result<()> {
    match start {
        Start::Resumed => println!("Welcome back."),
        Start::New => println!("New game started. Type 'help' for commands."),
    }
    print_status(&session)?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        session.pump();

        let mut words = line.split_whitespace();
        let cmd = words.next().unwrap_or("");
        let arg = words.next();
        match cmd {
            "" | "c" | "collect" => {
                session.collect();
                println!("+1  money: {}", format_number(session.state().money, 2));
            }
            "s" | "status" => print_status(&session)?,
            "shop" => print_shop(&session),
            "b" | "buy" => match resolve_item(&session, arg) {
                Some(id) => report(session.buy(&id), "Bought 1", &id)?,
                None => println!("Which producer? Try 'shop'."),
            },
            "upgrades" => print_upgrades(&session),
            "u" | "upgrade" => match resolve_item(&session, arg) {
                Some(id) => report(session.upgrade(&id), "Upgraded", &id)?,
                None => println!("Which producer? Try 'upgrades'."),
            },
            "l" | "level" => match session.level_offer()? {
                LevelOffer::NotReached { goal, money } => println!(
                    "Level goal not yet reached: {} / {}.",
                    format_number(money, 2),
                    format_number(goal, 2)
                ),
                LevelOffer::Advance { next_name, .. } => println!(
                    "Level complete! Next: {next_name}. Type 'advance' to move on, or keep playing here."
                ),
                LevelOffer::CampaignComplete => {
                    println!("Level complete! This is the last level in the campaign.")
                }
            },
            "advance" => match session.advance_level() {
                Ok(Some(_)) => {
                    let level = session.campaign().current(session.state())?;
                    println!("Advanced to {}!", level.name);
                }
                Ok(None) => println!("This is the last level in the campaign."),
                Err(RuntimeError::GoalNotReached { .. }) => println!("Level goal not yet reached."),
                Err(e) => return Err(e.into()),
            },
            "p" | "prestige" => {
                if arg == Some("now") {
                    match session.prestige()? {
                        0 => println!("No prestige credits available yet."),
                        earned => println!("Prestiged! +{earned} credits, production boosted."),
                    }
                } else {
                    print_prestige(&session);
                }
            }
            "autosave" => match arg.and_then(|a| a.parse::<u32>().ok()) {
                Some(secs) => {
                    session.set_autosave_seconds(secs);
                    if let Err(e) = session.settings().save(settings_path) {
                        warn!(error = %e, "could not store settings");
                    }
                    println!("Autosave every {secs}s (0 = off).");
                }
                None => println!("Usage: autosave <seconds>"),
            },
            "save" => {
                session.save()?;
                println!("Game saved.");
            }
            "h" | "help" | "?" => println!("{HELP}"),
            "q" | "quit" | "exit" => break,
            other => println!("Unknown command '{other}'. Type 'help'."),
        }
    }
    session.save()?;
    println!("Saved. Bye!");
    Ok(())
}

/// Accepts a catalog id or a 1-based row number from the shop list.
fn resolve_item(session: &Session, arg: Option<&str>) -> Option<String> {
    let arg = arg?;
    let catalog = session.catalog();
    if let Ok(n) = arg.parse::<usize>() {
        return catalog.all().get(n.checked_sub(1)?).map(|d| d.id.clone());
    }
    catalog.get(arg).map(|d| d.id.clone())
}

fn report(result: Result<f64, RuntimeError>, verb: &str, id: &str) -> Result<()> {
    match result {
        Ok(price) => println!("{verb} {id} for {}.", format_number(price, 2)),
        Err(RuntimeError::Econ(e)) => println!("{e}"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = (width as f64 * fraction.clamp(0.0, 1.0)).round() as usize;
    format!(
        "[{}{}] {:.1}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        fraction * 100.0
    )
}

fn print_status(session: &Session) -> Result<()> {
    let kpi = session.snapshot()?;
    println!();
    println!(
        "Level: {}   Goal: {}",
        kpi.level_name,
        format_number(kpi.goal_money, 2)
    );
    println!("{}", progress_bar(kpi.goal_progress, 40));
    println!(
        "Money: {}   Prod/s: {}",
        format_number(kpi.money, 2),
        format_number(kpi.rate_per_second, 2)
    );
    println!(
        "Prestige: {} (x{:.2})",
        kpi.prestige_credits, kpi.prestige_multiplier
    );
    println!("Owned Producers:");
    let rows = production::item_production(session.state(), session.catalog());
    if rows.is_empty() {
        println!("  (None yet - visit the shop)");
        return Ok(());
    }
    println!(
        "  {:<20} {:>6} {:>4} {:>10} {:>10}",
        "Name", "Qty", "Lv", "Unit/s", "Total/s"
    );
    for row in rows {
        println!(
            "  {:<20} {:>6} {:>4} {:>10} {:>10}",
            row.def.name,
            row.quantity,
            row.upgrade_level,
            format_number(row.per_unit, 2),
            format_number(row.total, 2)
        );
    }
    Ok(())
}

fn print_shop(session: &Session) {
    let state = session.state();
    let bonus = prestige::prod_multiplier(state.prestige_credits);
    println!("Money: {}", format_number(state.money, 2));
    println!(
        "  #  {:<20} {:>10} {:>12} {:>6} {:>4}",
        "Name", "Unit/s", "Price", "Owned", "Lv"
    );
    for (i, def) in session.catalog().all().iter().enumerate() {
        let qty = state.quantity_of(&def.id);
        let lvl = state.upgrade_level_of(&def.id);
        println!(
            "  {:<2} {:<20} {:>10} {:>12} {:>6} {:>4}",
            i + 1,
            def.name,
            format_number(def.base_production_per_second * multiplier_for(lvl) * bonus, 2),
            format_number(current_price(def, qty), 2),
            qty,
            lvl
        );
    }
}

fn print_upgrades(session: &Session) {
    let state = session.state();
    let owned: Vec<_> = session
        .catalog()
        .all()
        .iter()
        .enumerate()
        .filter(|(_, d)| state.quantity_of(&d.id) > 0)
        .collect();
    if owned.is_empty() {
        println!("You don't own any producers yet.");
        return;
    }
    println!("Money: {}", format_number(state.money, 2));
    println!(
        "  #  {:<20} {:>4} {:<18} {:>12}",
        "Name", "Lv", "Mult (cur->next)", "Upgrade"
    );
    for (i, def) in owned {
        let lvl = state.upgrade_level_of(&def.id);
        println!(
            "  {:<2} {:<20} {:>4} {:<18} {:>12}",
            i + 1,
            def.name,
            lvl,
            format!("x{:.2}->x{:.2}", multiplier_for(lvl), multiplier_for(lvl + 1)),
            format_number(upgrade_price(def, lvl), 2)
        );
    }
}

fn print_prestige(session: &Session) {
    let state = session.state();
    let available = prestige::credits_earned_now(state);
    println!("Lifetime:      {}", format_number(state.lifetime_earnings, 2));
    println!("Credits:       {}", state.prestige_credits);
    println!("Now available: {available}");
    println!("Next target:   {}", format_number(prestige::next_target(state), 2));
    println!(
        "Remaining:     {}",
        format_number(prestige::remaining_to_next_target(state), 2)
    );
    if available > 0 {
        println!("Type 'prestige now' to reset to the first level for +{available} credits.");
    }
}
