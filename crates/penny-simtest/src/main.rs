//! Penny World Headless Simulation Harness
//!
//! Plays several months with a scripted bot and checks the money rules
//! hold the whole way through. Runs entirely in-process: no renderer, no
//! network, collaborator calls answered inline.
//!
//! Usage:
//!   cargo run -p penny-simtest
//!   cargo run -p penny-simtest -- --months 6 --seed 3 --verbose
//!   cargo run -p penny-simtest -- --offline --config game.json

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use penny_core::generator::{CannedCoach, OfflineGenerator, StaticGenerator, TaskGenerator};
use penny_core::prelude::*;
use penny_core::scheduler::TaskSource;
use penny_core::staging::InlineExecutor;
use penny_logic::config::GameConfig;
use penny_logic::generation::TaskDefinition;
use penny_logic::ledger::EntryCategory;
use penny_logic::tasks::{Task, TaskCategory, TaskStatus};
use penny_logic::time::{Millis, SECOND_MS};

const FRAME_DT: f32 = 1.0 / 60.0;
/// Pay a task from the list once it is this close to due.
const PAY_BEFORE_DUE_MS: Millis = 5 * SECOND_MS;

#[derive(Debug, Parser)]
#[command(name = "penny-simtest", about = "Headless month-by-month run of Penny World")]
struct Args {
    /// Months to play
    #[arg(long, default_value_t = 3)]
    months: u32,

    /// Seed for pickup placement
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Month length in seconds (overrides the config file)
    #[arg(long)]
    month_secs: Option<i64>,

    /// Game config as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run without a task generator, so every month uses the fallback list
    #[arg(long)]
    offline: bool,

    /// Print every check and debug logs
    #[arg(long)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    println!("=== Penny World Simulation Harness ===\n");

    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            std::process::exit(2);
        }
    };

    let mut results = Vec::new();

    // 1. Config sanity
    results.extend(validate_config(&config));

    // 2. Scripted months
    let engine = match GameEngine::new(config, 0) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("engine error: {}", e);
            std::process::exit(2);
        }
    };
    let run = play_months(&args, engine);
    results.extend(run.results);

    // 3. Save / load / statement
    results.extend(validate_persistence(&run.engine));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<GameConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => GameConfig {
            month_duration_ms: 60 * SECOND_MS,
            ..GameConfig::default()
        },
    };
    if let Some(secs) = args.month_secs {
        config.month_duration_ms = secs * SECOND_MS;
    }
    config.seed = Some(args.seed);
    config.validate()?;
    Ok(config)
}

/// Tasks the harness generator hands out every month. Two rent entries on
/// purpose: the registry must keep only one.
fn practice_tasks() -> Vec<TaskDefinition> {
    vec![
        TaskDefinition::new("Pay Rent", TaskCategory::Rent, 2000).with_minutes_to_due(4),
        TaskDefinition::new("Groceries", TaskCategory::Food, 650).with_minutes_to_due(2),
        TaskDefinition::new("Water bill", TaskCategory::Bill, 400),
        TaskDefinition::new("Landlord fee", TaskCategory::Rent, 300),
        TaskDefinition::new("Movie night", TaskCategory::Fun, 900)
            .with_text("Tickets for two.", "Fun is fine when bills are covered."),
    ]
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_config(config: &GameConfig) -> Vec<TestResult> {
    println!("--- Config ---");
    let mut results = Vec::new();

    results.push(TestResult {
        name: "config_valid".into(),
        passed: config.validate().is_ok(),
        detail: format!(
            "month {} s, checking {}, savings {}",
            config.month_duration_ms / SECOND_MS,
            config.starting_checking_cents,
            config.starting_savings_cents
        ),
    });

    let roundtrip = serde_json::to_string(config)
        .ok()
        .and_then(|json| GameConfig::from_json_str(&json).ok());
    results.push(TestResult {
        name: "config_json_roundtrip".into(),
        passed: roundtrip.as_ref() == Some(config),
        detail: "config survives JSON".into(),
    });

    results
}

// ── 2. Scripted months ──────────────────────────────────────────────────

struct Run {
    engine: GameEngine,
    results: Vec<TestResult>,
}

/// Violations seen while playing, counted per rule.
#[derive(Default)]
struct Watch {
    negative_balance_frames: u32,
    multi_rent_frames: u32,
    sticky_violations: u32,
    frames: u64,
}

fn play_months(args: &Args, engine: GameEngine) -> Run {
    println!("--- Months ---");
    let month_ms = engine.config().month_duration_ms;
    let generator: Arc<dyn TaskGenerator> = if args.offline {
        Arc::new(OfflineGenerator)
    } else {
        Arc::new(StaticGenerator::new(practice_tasks()))
    };

    let mut results = Vec::new();
    let mut engine = engine
        .with_generator(generator)
        .with_executor(Arc::new(InlineExecutor))
        .with_coach(Arc::new(CannedCoach::new(
            "Pay rent first, then use savings for the rest.",
        )));

    let mut watch = Watch::default();
    let mut terminal: Vec<(String, TaskStatus)> = Vec::new();
    let mut asked_coach = false;
    let mut coach_tips = 0;
    let deadline = month_ms * args.months as Millis + 5 * SECOND_MS;
    let mut frame: i64 = 0;

    loop {
        let now = frame * 1000 / 60;
        if now > deadline || engine.scheduler().month_index() > args.months {
            break;
        }

        engine.set_input(steer_toward_pickup(&engine));
        engine.update(FRAME_DT, now);
        bot_pay(&mut engine, now);

        if !asked_coach && engine.selected_task().is_some() {
            asked_coach = engine.request_advice(now);
        }

        observe(&engine, &mut watch, &mut terminal);
        for note in engine.drain_notifications() {
            if note == Notification::CoachTip {
                coach_tips += 1;
            }
            if args.verbose {
                println!("  [{:>6.1}s] {}", now as f64 / 1000.0, note.text());
            }
        }
        frame += 1;
    }

    let closed = engine.scheduler().month_index() - 1;
    results.push(TestResult {
        name: "months_completed".into(),
        passed: closed >= args.months,
        detail: format!("{} of {} months closed", closed, args.months),
    });
    // Oldest first; only the most recent months are kept
    let mut history: Vec<_> = engine.scheduler().history().iter().cloned().collect();
    history.reverse();
    results.push(TestResult {
        name: "balances_never_negative".into(),
        passed: watch.negative_balance_frames == 0,
        detail: format!(
            "{} of {} frames had a negative balance",
            watch.negative_balance_frames, watch.frames
        ),
    });
    results.push(TestResult {
        name: "single_rent_per_month".into(),
        passed: watch.multi_rent_frames == 0,
        detail: format!("{} frames held more than one rent task", watch.multi_rent_frames),
    });
    results.push(TestResult {
        name: "terminal_status_sticky".into(),
        passed: watch.sticky_violations == 0,
        detail: format!("{} paid/failed tasks changed status", watch.sticky_violations),
    });

    let rent_months = history.iter().filter(|s| s.rent_paid).count();
    results.push(TestResult {
        name: "bot_pays_rent".into(),
        passed: rent_months == history.len(),
        detail: format!("rent paid in {} of {} months", rent_months, history.len()),
    });
    for s in &history {
        println!(
            "  month {:>2}: rent {} | paid {} | failed {} | net {}",
            s.month_index,
            if s.rent_paid { "paid" } else { "MISSED" },
            s.tasks_paid,
            s.tasks_failed,
            penny_logic::money::format_cents(s.net_cents)
        );
    }

    let expected_source = if args.offline {
        TaskSource::Fallback
    } else {
        TaskSource::Generated
    };
    results.push(TestResult {
        name: "task_source".into(),
        passed: engine.scheduler().task_source() == Some(expected_source),
        detail: format!("latest month used {:?}", engine.scheduler().task_source()),
    });

    let transfer_net: i64 = engine
        .ledger()
        .entries()
        .filter(|e| e.category == EntryCategory::Transfer)
        .map(|e| e.amount_cents)
        .sum();
    results.push(TestResult {
        name: "transfers_conserve_money".into(),
        passed: transfer_net == 0 || engine.ledger().len() == engine.ledger().capacity(),
        detail: format!("transfer entries net {}", transfer_net),
    });

    results.push(TestResult {
        name: "coach_answered".into(),
        passed: !asked_coach || coach_tips > 0,
        detail: format!("{} tips received", coach_tips),
    });

    Run { engine, results }
}

/// Head for the nearest task marker, or wander toward the world centre.
fn steer_toward_pickup(engine: &GameEngine) -> InputState {
    let here = engine.avatar().position;
    let target = engine
        .task_pickups()
        .into_iter()
        .map(|(pos, _)| pos)
        .min_by(|a, b| a.distance(&here).total_cmp(&b.distance(&here)))
        .unwrap_or_else(|| {
            let world = engine.config().world;
            Vec2::new(world.width / 2.0, world.height / 2.0)
        });

    let delta = target - here;
    let dead_zone = 8.0;
    InputState::keys(
        delta.y < -dead_zone,
        delta.y > dead_zone,
        delta.x < -dead_zone,
        delta.x > dead_zone,
    )
}

/// Pay what the bot has found, and anything about to fall due. Rent comes
/// first; other bills only if rent stays covered afterwards.
fn bot_pay(engine: &mut GameEngine, now: Millis) {
    let mut due: Vec<Task> = engine
        .tasks()
        .open_by_due()
        .into_iter()
        .filter(|t| {
            engine.selected_task() == Some(t.id.as_str()) || t.due_at - now <= PAY_BEFORE_DUE_MS
        })
        .cloned()
        .collect();
    due.sort_by_key(|t| (t.category != TaskCategory::Rent, t.due_at));

    for task in due {
        let rent_reserve: Cents = engine
            .tasks()
            .open_tasks()
            .filter(|t| t.category == TaskCategory::Rent && t.id != task.id)
            .map(|t| t.cost_cents)
            .sum();
        let total = engine.ledger().total();
        if total - task.cost_cents < rent_reserve {
            continue;
        }

        let checking = engine.ledger().balance(Account::Checking);
        if checking < task.cost_cents {
            let shortfall = task.cost_cents - checking;
            if engine
                .transfer(Account::Savings, Account::Checking, shortfall, now)
                .is_err()
            {
                continue;
            }
        }
        if let Err(e) = engine.pay_task(&task.id, now) {
            log::debug!("bot could not pay {}: {}", task.id, e);
        }
    }
}

fn observe(engine: &GameEngine, watch: &mut Watch, terminal: &mut Vec<(String, TaskStatus)>) {
    watch.frames += 1;
    let balances = engine.ledger().balances();
    if balances.checking_cents < 0 || balances.savings_cents < 0 {
        watch.negative_balance_frames += 1;
    }

    let rents = engine
        .tasks()
        .tasks()
        .iter()
        .filter(|t| t.category == TaskCategory::Rent)
        .count();
    if rents > 1 {
        watch.multi_rent_frames += 1;
    }

    for (id, status) in terminal.iter() {
        if let Some(task) = engine.tasks().get(id) {
            if task.status != *status {
                watch.sticky_violations += 1;
            }
        }
    }
    for task in engine.tasks().tasks() {
        if task.status.is_terminal() && !terminal.iter().any(|(id, _)| id == &task.id) {
            terminal.push((task.id.clone(), task.status));
        }
    }
}

// ── 3. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(engine: &GameEngine) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    let saved = engine.save(&mut buffer);
    results.push(TestResult {
        name: "save".into(),
        passed: saved.is_ok(),
        detail: match &saved {
            Ok(()) => format!("{} bytes", buffer.len()),
            Err(e) => e.to_string(),
        },
    });

    let mut restored = match GameEngine::new(engine.config().clone(), 0) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(TestResult {
                name: "load_restores_state".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };
    let loaded = restored.load(&buffer[..]);
    let same = loaded.is_ok()
        && restored.ledger().balances() == engine.ledger().balances()
        && restored.scheduler().month_index() == engine.scheduler().month_index()
        && restored.tasks().tasks() == engine.tasks().tasks();
    results.push(TestResult {
        name: "load_restores_state".into(),
        passed: same,
        detail: match loaded {
            Ok(()) => format!("month {} restored", restored.scheduler().month_index()),
            Err(e) => e.to_string(),
        },
    });

    let statement = engine.statement();
    let json = statement.to_json();
    let back = json
        .as_ref()
        .ok()
        .and_then(|j| penny_core::persistence::StatementSnapshot::from_json(j).ok());
    results.push(TestResult {
        name: "statement_json".into(),
        passed: back.as_ref() == Some(&statement),
        detail: format!("{} ledger entries in statement", statement.ledger.len()),
    });

    results
}
