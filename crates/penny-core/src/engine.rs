//! Game engine - main entry point for running Penny World
//!
//! [`GameEngine::update`] is driven by the front end once per rendered
//! frame with the frame delta and the current wall-clock time. Every call
//! runs the frame stages (physics, camera, pickups, expiry); once per
//! `clock_tick_ms` of wall time it also runs the month clock (staged
//! results, scheduler, settlement). Player actions (paying, transferring,
//! ending the month) are plain method calls made between updates.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use hecs::World;
use penny_logic::advice::{advice_context, tidy_advice};
use penny_logic::avatar::{clamp_frame_dt, coin_growth, payment_growth};
use penny_logic::config::{ConfigError, GameConfig};
use penny_logic::generation::{CollaboratorError, Difficulty};
use penny_logic::ledger::{EntryCategory, Ledger, LedgerError};
use penny_logic::money::{parse_dollars, Account, Cents};
use penny_logic::month::MonthSummary;
use penny_logic::tasks::{TaskRegistry, TaskStatus};
use penny_logic::time::{format_countdown, Millis};
use penny_logic::world::{Landmark, LANDMARKS};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::*;
use crate::generator::{AdviceProvider, OfflineCoach, OfflineGenerator, TaskGenerator};
use crate::input::InputState;
use crate::narration::{deliver, LogSink, NarrationSink, Notification};
use crate::persistence::{
    read_save, serialize_entities, spawn_entities, write_save, SaveData, SaveError,
    StatementSnapshot, SAVE_VERSION, STATEMENT_LEDGER_ENTRIES,
};
use crate::scheduler::{MonthScheduler, TaskSource};
use crate::staging::{dispatch, Executor, Poll, Staged, ThreadExecutor};
use crate::systems::*;

const DEFAULT_PLAYER_NAME: &str = "Player";
const MAX_PLAYER_NAME_CHARS: usize = 24;
const COACH_UNAVAILABLE: &str = "Coach unavailable.";
/// Undrained notifications kept; the oldest are dropped first.
const MAX_QUEUED_NOTIFICATIONS: usize = 64;

/// Who is playing. The user id comes from an outside session and is only
/// carried along, never checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub user_id: Option<String>,
    pub narration_enabled: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PLAYER_NAME.to_string(),
            user_id: None,
            narration_enabled: true,
        }
    }
}

/// Why a payment was refused. A refused payment changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("no task selected")]
    NothingSelected,
    #[error("unknown task {0}")]
    UnknownTask(String),
    #[error("task {id} is already {status:?}")]
    NotOpen { id: String, status: TaskStatus },
    #[error("task costs {cost} but checking only has {balance}")]
    InsufficientFunds { cost: Cents, balance: Cents },
    #[error("payment rejected: {0}")]
    Rejected(#[from] LedgerError),
}

/// Counters a front end shows around the play area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hud {
    pub player_name: String,
    pub month_index: u32,
    pub month_ends_in_ms: Millis,
    /// `m:ss`
    pub countdown: String,
    pub checking_cents: Cents,
    pub savings_cents: Cents,
    pub open_tasks: u32,
    pub paid_tasks: u32,
    pub failed_tasks: u32,
    pub avatar_radius: f32,
    pub selected_task: Option<String>,
    pub tasks_pending: bool,
}

/// Main game engine
pub struct GameEngine {
    config: GameConfig,
    /// ECS world holding coins and task pickups
    pub world: World,
    ledger: Ledger,
    tasks: TaskRegistry,
    scheduler: MonthScheduler,
    avatar: Avatar,
    camera: Camera,
    input: InputState,
    profile: Profile,
    selected_task: Option<String>,
    revealed: HashSet<String>,
    notifications: VecDeque<Notification>,
    narration: Box<dyn NarrationSink>,
    executor: Arc<dyn Executor>,
    coach: Arc<dyn AdviceProvider>,
    pending_advice: Option<Staged<Result<String, CollaboratorError>>>,
    coach_text: Option<String>,
    rng: StdRng,
    last_clock_tick: Option<Millis>,
    running: bool,
}

impl GameEngine {
    /// Start a new game at `now` with no external collaborators: tasks
    /// come from the fallback list and the coach is unavailable.
    pub fn new(config: GameConfig, now: Millis) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let generator: Arc<dyn TaskGenerator> = Arc::new(OfflineGenerator);
        let mut engine = Self {
            world: World::new(),
            ledger: Ledger::new(
                config.starting_checking_cents,
                config.starting_savings_cents,
                config.ledger_capacity,
            ),
            tasks: TaskRegistry::new(config.task_capacity),
            scheduler: MonthScheduler::new(&config, generator, now),
            avatar: Avatar::default(),
            camera: Camera::default(),
            input: InputState::default(),
            profile: Profile {
                narration_enabled: config.narration_enabled,
                ..Profile::default()
            },
            selected_task: None,
            revealed: HashSet::new(),
            notifications: VecDeque::new(),
            narration: Box::new(LogSink),
            executor: Arc::new(ThreadExecutor),
            coach: Arc::new(OfflineCoach),
            pending_advice: None,
            coach_text: None,
            rng,
            last_clock_tick: None,
            running: true,
            config,
        };
        engine.populate_world();
        Ok(engine)
    }

    pub fn with_generator(mut self, generator: Arc<dyn TaskGenerator>) -> Self {
        self.scheduler.set_generator(generator);
        self
    }

    pub fn with_coach(mut self, coach: Arc<dyn AdviceProvider>) -> Self {
        self.coach = coach;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_narration(mut self, sink: Box<dyn NarrationSink>) -> Self {
        self.narration = sink;
        self
    }

    /// Coins, avatar and camera for a fresh game.
    fn populate_world(&mut self) {
        self.world.clear();
        let world_cfg = self.config.world;
        spawn_coins(&mut self.world, &world_cfg, self.config.coin_count, &mut self.rng);
        self.avatar = Avatar::spawn(&world_cfg, self.ledger.total());
        self.camera = Camera::centered_on(self.avatar.position, &world_cfg);
    }

    /// Advance the game. `dt` is the frame delta in seconds, `now` the
    /// wall-clock time in milliseconds.
    pub fn update(&mut self, dt: f32, now: Millis) {
        if !self.running {
            return;
        }

        // T0: Avatar, camera, pickups, expiry (every frame)
        self.frame(dt, now);

        // T1: Month clock (once per clock period)
        let due = self
            .last_clock_tick
            .map_or(true, |last| now - last >= self.config.clock_tick_ms);
        if due {
            self.clock_tick(now);
            self.last_clock_tick = Some(now);
        }
    }

    fn frame(&mut self, dt: f32, now: Millis) {
        let dt = clamp_frame_dt(dt);
        let world_cfg = self.config.world;

        let steering = self.input.steering(world_cfg.viewport_center().into());
        integrate_avatar(&mut self.avatar, self.ledger.total(), steering, &world_cfg, dt);
        follow_camera(&mut self.camera, self.avatar.position, &world_cfg, dt);

        sync_task_pickups(&mut self.world, &self.tasks, &self.revealed, &world_cfg, &mut self.rng);
        let haul = collect_coins(&mut self.world, &self.avatar, &world_cfg, &mut self.rng);
        if haul.earned_cents > 0 {
            self.ledger.deposit(
                Account::Checking,
                haul.earned_cents,
                "Collected coins",
                EntryCategory::Income,
                now,
            );
            self.avatar.adjust_growth(coin_growth(haul.earned_cents));
            log::debug!("Collected {} coins worth {}", haul.count, haul.earned_cents);
        }
        if let Some(task_id) = reveal_task_pickup(&mut self.world, &self.avatar) {
            log::debug!("Revealed task {}", task_id);
            self.revealed.insert(task_id.clone());
            self.selected_task = Some(task_id);
        }

        expire_tasks(&mut self.tasks, &mut self.avatar, now);
    }

    fn clock_tick(&mut self, now: Millis) {
        self.poll_advice(now);

        let outcome = self
            .scheduler
            .tick(now, &mut self.tasks, &self.ledger, self.executor.as_ref());
        apply_expiry_penalties(&mut self.avatar, &outcome.expired);

        if let Some(installed) = outcome.installed {
            self.notify(match installed.source {
                TaskSource::Generated => Notification::TasksGenerated {
                    count: installed.count,
                },
                TaskSource::Fallback => Notification::FallbackTasksLoaded {
                    count: installed.count,
                },
            });
        }
        if let Some(summary) = outcome.closed {
            self.after_month_closed();
            self.notify(Notification::MonthEnded {
                month_index: summary.month_index,
            });
        }
    }

    /// Close the current month now ("End Month"). Returns the summary, or
    /// `None` if the engine is stopped.
    pub fn end_month(&mut self, now: Millis) -> Option<MonthSummary> {
        if !self.running {
            return None;
        }
        let month = self.scheduler.month_index();
        let close = self
            .scheduler
            .close_epoch(month, now, &mut self.tasks, &self.ledger)?;
        apply_expiry_penalties(&mut self.avatar, &close.expired);
        self.after_month_closed();
        self.notify(Notification::MonthClosedManually { month_index: month });
        Some(close.summary)
    }

    fn after_month_closed(&mut self) {
        self.selected_task = None;
        self.revealed.clear();
        self.pending_advice = None;
        self.coach_text = None;
    }

    /// Pay task `id` from checking.
    pub fn pay_task(&mut self, id: &str, now: Millis) -> Result<(), PaymentError> {
        let task = self
            .tasks
            .get(id)
            .ok_or_else(|| PaymentError::UnknownTask(id.to_string()))?;
        if !task.is_open() {
            return Err(PaymentError::NotOpen {
                id: id.to_string(),
                status: task.status,
            });
        }
        let (title, cost, category) = (task.title.clone(), task.cost_cents, task.category);

        match self
            .ledger
            .withdraw(Account::Checking, cost, title.as_str(), category.ledger_category(), now)
        {
            Ok(()) => {}
            Err(LedgerError::InsufficientFunds { balance, .. }) => {
                self.notify(Notification::InsufficientFunds {
                    title,
                    cost_cents: cost,
                });
                return Err(PaymentError::InsufficientFunds { cost, balance });
            }
            Err(e) => {
                log::warn!("Payment for {} refused: {}", id, e);
                return Err(e.into());
            }
        }

        self.tasks.mark_task(id, TaskStatus::Paid);
        self.avatar.adjust_growth(payment_growth(cost));
        log::info!("Paid '{}' for {}", title, cost);
        self.notify(Notification::TaskPaid { title });
        Ok(())
    }

    pub fn pay_selected(&mut self, now: Millis) -> Result<(), PaymentError> {
        let id = self
            .selected_task
            .clone()
            .ok_or(PaymentError::NothingSelected)?;
        self.pay_task(&id, now)
    }

    /// Move money between the two accounts.
    pub fn transfer(
        &mut self,
        from: Account,
        to: Account,
        amount: Cents,
        now: Millis,
    ) -> Result<(), LedgerError> {
        match self.ledger.transfer(from, to, amount, now) {
            Ok(()) => {
                self.notify(Notification::TransferComplete);
                Ok(())
            }
            Err(e) => {
                self.notify(Notification::TransferFailed);
                Err(e)
            }
        }
    }

    /// [`GameEngine::transfer`] with a user-typed dollar amount.
    pub fn transfer_input(
        &mut self,
        from: Account,
        to: Account,
        input: &str,
        now: Millis,
    ) -> Result<(), LedgerError> {
        let amount = parse_dollars(input)?;
        self.transfer(from, to, amount, now)
    }

    /// Select a known task. Returns false for unknown ids.
    pub fn select_task(&mut self, id: &str) -> bool {
        if self.tasks.get(id).is_some() {
            self.selected_task = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_task = None;
    }

    /// Ask the money coach about the selected task. The answer lands in
    /// [`GameEngine::coach_text`] on a later clock tick.
    pub fn request_advice(&mut self, now: Millis) -> bool {
        let Some(task) = self.selected_task.as_deref().and_then(|id| self.tasks.get(id)) else {
            return false;
        };
        let context = advice_context(task, &self.ledger.balances());
        let coach = Arc::clone(&self.coach);
        self.coach_text = None;
        self.pending_advice = Some(dispatch(
            self.executor.as_ref(),
            self.scheduler.month_index(),
            now,
            move || coach.advise(&context),
        ));
        true
    }

    fn poll_advice(&mut self, now: Millis) {
        let Some(pending) = self.pending_advice.as_ref() else {
            return;
        };
        let timeout = self.config.generation_timeout_ms;
        let reply = match pending.poll(now, timeout) {
            Poll::Pending => return,
            Poll::Ready(Ok(text)) => {
                tidy_advice(&text).ok_or_else(|| CollaboratorError::Malformed("empty advice".into()))
            }
            Poll::Ready(Err(e)) => Err(e),
            Poll::TimedOut => Err(CollaboratorError::TimedOut(timeout)),
            Poll::Disconnected => Err(CollaboratorError::Disconnected),
        };
        self.pending_advice = None;

        match reply {
            Ok(text) => {
                self.coach_text = Some(text);
                self.notify(Notification::CoachTip);
            }
            Err(e) => {
                log::warn!("Money coach failed: {}", e);
                self.coach_text = Some(COACH_UNAVAILABLE.to_string());
            }
        }
    }

    fn notify(&mut self, note: Notification) {
        if self.profile.narration_enabled {
            deliver(self.narration.as_mut(), std::slice::from_ref(&note));
        }
        if self.notifications.len() >= MAX_QUEUED_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(note);
    }

    /// Take the notifications raised since the last call, oldest first.
    /// At most the latest `MAX_QUEUED_NOTIFICATIONS` are kept in between.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Stop the game. Later updates do nothing and any in-flight
    /// collaborator answer is never applied.
    pub fn shutdown(&mut self) {
        if self.running {
            self.running = false;
            self.pending_advice = None;
            log::info!("Game engine shut down in month {}", self.scheduler.month_index());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start over from the configured opening state, keeping the signed-in
    /// user and the attached collaborators.
    pub fn reset(&mut self, now: Millis) {
        let user_id = self.profile.user_id.take();
        self.ledger = Ledger::new(
            self.config.starting_checking_cents,
            self.config.starting_savings_cents,
            self.config.ledger_capacity,
        );
        self.tasks = TaskRegistry::new(self.config.task_capacity);
        self.scheduler = MonthScheduler::new(&self.config, self.scheduler.generator(), now);
        self.input = InputState::default();
        self.profile = Profile {
            user_id,
            narration_enabled: self.config.narration_enabled,
            ..Profile::default()
        };
        self.selected_task = None;
        self.revealed.clear();
        self.notifications.clear();
        self.pending_advice = None;
        self.coach_text = None;
        self.last_clock_tick = None;
        self.running = true;
        self.populate_world();
        log::info!("Game reset");
    }

    pub fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    pub fn set_player_name(&mut self, name: &str) {
        let trimmed = name.trim();
        self.profile.name = if trimmed.is_empty() {
            DEFAULT_PLAYER_NAME.to_string()
        } else {
            trimmed.chars().take(MAX_PLAYER_NAME_CHARS).collect()
        };
    }

    /// Applies from the next month's generation request.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.config.difficulty = difficulty;
        self.scheduler.set_difficulty(difficulty);
    }

    pub fn set_narration_enabled(&mut self, enabled: bool) {
        self.profile.narration_enabled = enabled;
    }

    pub fn set_user(&mut self, user_id: Option<String>) {
        self.profile.user_id = user_id;
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn scheduler(&self) -> &MonthScheduler {
        &self.scheduler
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn selected_task(&self) -> Option<&str> {
        self.selected_task.as_deref()
    }

    pub fn coach_text(&self) -> Option<&str> {
        self.coach_text.as_deref()
    }

    pub fn is_advice_pending(&self) -> bool {
        self.pending_advice.is_some()
    }

    pub fn landmarks(&self) -> &'static [Landmark] {
        &LANDMARKS
    }

    /// Coin positions and values, for drawing.
    pub fn coins(&self) -> Vec<(Vec2, Cents)> {
        self.world
            .query::<(&Position, &Coin)>()
            .iter()
            .map(|(_, (pos, coin))| (pos.point, coin.value_cents))
            .collect()
    }

    /// Task markers still waiting to be found.
    pub fn task_pickups(&self) -> Vec<(Vec2, TaskPickup)> {
        self.world
            .query::<(&Position, &TaskPickup)>()
            .iter()
            .map(|(_, (pos, pickup))| (pos.point, pickup.clone()))
            .collect()
    }

    pub fn hud(&self, now: Millis) -> Hud {
        let counts = self.tasks.counts();
        let remaining = self.scheduler.epoch().remaining(now);
        let balances = self.ledger.balances();
        Hud {
            player_name: self.profile.name.clone(),
            month_index: self.scheduler.month_index(),
            month_ends_in_ms: remaining,
            countdown: format_countdown(remaining),
            checking_cents: balances.checking_cents,
            savings_cents: balances.savings_cents,
            open_tasks: counts.open,
            paid_tasks: counts.paid,
            failed_tasks: counts.failed,
            avatar_radius: self.avatar.radius,
            selected_task: self.selected_task.clone(),
            tasks_pending: self.scheduler.is_generation_pending(),
        }
    }

    /// Read-only record for a statement store.
    pub fn statement(&self) -> StatementSnapshot {
        StatementSnapshot {
            month_index: self.scheduler.month_index(),
            balances: self.ledger.balances(),
            ledger: self.ledger.recent(STATEMENT_LEDGER_ENTRIES),
            tasks: self.tasks.tasks().to_vec(),
            user_id: self.profile.user_id.clone(),
            latest_summary: self.scheduler.history().latest().cloned(),
            narrative: None,
        }
    }

    /// Save game state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        let mut revealed: Vec<String> = self.revealed.iter().cloned().collect();
        revealed.sort();
        let data = SaveData {
            version: SAVE_VERSION,
            config: self.config.clone(),
            ledger: self.ledger.clone(),
            tasks: self.tasks.clone(),
            scheduler: self.scheduler.state(),
            profile: self.profile.clone(),
            selected_task: self.selected_task.clone(),
            revealed,
            entities: serialize_entities(&self.world),
        };
        write_save(writer, &data)
    }

    /// Load game state from a reader. Collaborators stay as attached; the
    /// avatar respawns and the clock restarts on the next update.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let data = read_save(reader)?;

        self.config = data.config;
        self.ledger = data.ledger;
        self.tasks = data.tasks;
        self.scheduler = MonthScheduler::new(&self.config, self.scheduler.generator(), 0);
        self.scheduler.restore(data.scheduler);
        self.profile = data.profile;
        self.selected_task = data.selected_task;
        self.revealed = data.revealed.into_iter().collect();
        self.world = World::new();
        spawn_entities(&mut self.world, data.entities);

        let world_cfg = self.config.world;
        self.avatar = Avatar::spawn(&world_cfg, self.ledger.total());
        self.camera = Camera::centered_on(self.avatar.position, &world_cfg);
        self.input = InputState::default();
        self.pending_advice = None;
        self.coach_text = None;
        self.last_clock_tick = None;
        self.running = true;
        Ok(())
    }
}
