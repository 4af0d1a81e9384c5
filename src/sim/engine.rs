//! Session engine
//!
//! Owns the session, its timers and the RNG, and pushes every visible change
//! out through a `DisplaySurface`. Platforms drive it with `frame` (clicks,
//! then time, then start), or with `advance` and `apply` separately.

use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::milestone::{HAZARD_MESSAGE, WIN_MESSAGE, milestone_at, timeout_message};
use super::state::{GameSession, SessionOutcome, SpawnId, SpawnKind, SpawnTarget, Spawnable};
use super::timers::{Scheduler, TimerKind};
use crate::platform::{DisplaySurface, FeedbackKind, PlayerInput};
use crate::tuning::{Tuning, TuningError};

/// What a forwarded click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Session inactive, or the can is gone or of another kind
    Ignored,
    Collected,
    Penalized,
}

pub struct GameEngine<S: DisplaySurface> {
    tuning: Tuning,
    session: GameSession,
    scheduler: Scheduler,
    rng: Pcg32,
    seed: u64,
    surface: S,
    next_id: SpawnId,
}

impl<S: DisplaySurface> GameEngine<S> {
    /// Engine with the built-in balance
    pub fn new(surface: S, seed: u64) -> Self {
        Self::build(surface, seed, Tuning::default())
    }

    pub fn with_tuning(surface: S, seed: u64, tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::build(surface, seed, tuning))
    }

    fn build(mut surface: S, seed: u64, tuning: Tuning) -> Self {
        let session = GameSession::idle(&tuning);
        surface.render_grid(tuning.grid_cells);
        surface.set_score_display(session.collected);
        surface.set_timer_display(session.time_left_secs);
        Self {
            tuning,
            session,
            scheduler: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            surface,
            next_id: 1,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn is_active(&self) -> bool {
        self.session.active
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.session.outcome
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Begin a new session unless one is already running
    pub fn start(&mut self) {
        if self.session.active {
            log::debug!("Start ignored: session already running");
            return;
        }

        self.scheduler.cancel_all();
        self.session = GameSession::fresh(&self.tuning);

        self.surface.render_grid(self.tuning.grid_cells);
        self.surface.set_score_display(self.session.collected);
        self.surface.set_timer_display(self.session.time_left_secs);
        self.surface.clear_feedback();

        // Arm order decides which timer fires first on a shared instant
        self.scheduler
            .arm(TimerKind::Countdown, self.tuning.countdown_period_ms);
        self.on_spawn_tick();
        self.scheduler
            .arm(TimerKind::Spawn, self.session.spawn_interval_ms);
        self.scheduler
            .arm(TimerKind::Difficulty, self.tuning.difficulty_period_ms);

        log::info!(
            "Session started at {}ms (goal {}, {}s)",
            self.now_ms(),
            self.tuning.goal,
            self.tuning.duration_secs
        );
    }

    /// Clear the grid and drop `cans_per_spawn` new cans into distinct cells
    pub fn on_spawn_tick(&mut self) {
        if !self.session.active {
            return;
        }

        self.clear_grid();

        let cells = self.session.grid.len();
        let amount = (self.session.cans_per_spawn as usize).min(cells);
        let picks = sample(&mut self.rng, cells, amount);

        for cell in picks.into_iter() {
            let kind = if self.rng.random_bool(self.tuning.hazard_chance) {
                SpawnKind::Hazard
            } else {
                SpawnKind::Collectible
            };
            let id = self.next_spawn_id();
            self.session.grid[cell] = Some(Spawnable { id, kind });
            self.surface.render_spawnable(SpawnTarget { cell, id }, kind);
        }

        log::debug!("Spawned {} can(s) at {}ms", amount, self.now_ms());
    }

    pub fn on_collectible_clicked(&mut self, target: SpawnTarget) -> ClickOutcome {
        if !self.accepts(target, SpawnKind::Collectible) {
            return ClickOutcome::Ignored;
        }

        self.session.collected += 1;
        self.surface.set_score_display(self.session.collected);
        self.check_milestone();
        self.clear_cell(target.cell);

        if self.session.collected >= self.tuning.goal {
            self.end_session(true);
        }
        ClickOutcome::Collected
    }

    pub fn on_hazard_clicked(&mut self, target: SpawnTarget) -> ClickOutcome {
        if !self.accepts(target, SpawnKind::Hazard) {
            return ClickOutcome::Ignored;
        }

        self.session.collected = self.session.collected.saturating_sub(1);
        self.surface.set_score_display(self.session.collected);
        self.surface.show_feedback(HAZARD_MESSAGE, FeedbackKind::Bad);
        self.clear_cell(target.cell);
        ClickOutcome::Penalized
    }

    /// Route a forwarded click by whatever currently occupies the cell
    pub fn click(&mut self, target: SpawnTarget) -> ClickOutcome {
        match self.session.live(target).map(|s| s.kind) {
            Some(SpawnKind::Collectible) => self.on_collectible_clicked(target),
            Some(SpawnKind::Hazard) => self.on_hazard_clicked(target),
            None => {
                log::debug!("Stale click on cell {} (can {})", target.cell, target.id);
                ClickOutcome::Ignored
            }
        }
    }

    pub fn on_difficulty_tick(&mut self) {
        if !self.session.active {
            return;
        }

        self.session.cans_per_spawn = self.tuning.escalate_cans(self.session.cans_per_spawn);
        self.session.spawn_interval_ms =
            self.tuning.escalate_interval(self.session.spawn_interval_ms);
        // Fresh phase: time left on the old period is dropped
        self.scheduler
            .arm(TimerKind::Spawn, self.session.spawn_interval_ms);

        log::debug!(
            "Difficulty up: {} can(s) every {}ms",
            self.session.cans_per_spawn,
            self.session.spawn_interval_ms
        );
    }

    pub fn on_countdown_tick(&mut self) {
        if !self.session.active {
            return;
        }

        self.session.time_left_secs = self.session.time_left_secs.saturating_sub(1);
        self.surface.set_timer_display(self.session.time_left_secs);

        if self.session.time_left_secs == 0 {
            self.end_session(false);
        }
    }

    /// Stop the session. Calling this on an ended session does nothing.
    pub fn end_session(&mut self, won: bool) {
        if !self.session.active {
            return;
        }

        self.session.active = false;
        self.scheduler.cancel_all();
        self.clear_grid();

        let collected = self.session.collected;
        if won {
            self.session.outcome = Some(SessionOutcome::Won);
            self.surface.show_feedback(WIN_MESSAGE, FeedbackKind::Good);
        } else {
            self.session.outcome = Some(SessionOutcome::TimedOut { collected });
            self.surface
                .show_feedback(&timeout_message(collected), FeedbackKind::Bad);
        }

        log::info!(
            "Session ended at {}ms: {} ({} cans)",
            self.now_ms(),
            if won { "won" } else { "time up" },
            collected
        );
    }

    /// Run every timer due within the next `elapsed_ms`
    pub fn advance(&mut self, elapsed_ms: u64) {
        let until = self.scheduler.now_ms().saturating_add(elapsed_ms);
        while let Some(kind) = self.scheduler.pop_due(until) {
            match kind {
                TimerKind::Spawn => self.on_spawn_tick(),
                TimerKind::Countdown => self.on_countdown_tick(),
                TimerKind::Difficulty => self.on_difficulty_tick(),
            }
        }
        self.scheduler.settle(until);
    }

    /// One platform frame: clicks land on the cans they were aimed at, then
    /// time moves, then a queued start begins its session on the new clock.
    pub fn frame<I>(&mut self, inputs: I, elapsed_ms: u64)
    where
        I: IntoIterator<Item = PlayerInput>,
    {
        let mut start = false;
        for input in inputs {
            match input {
                PlayerInput::Start => start = true,
                PlayerInput::Click(target) => {
                    self.click(target);
                }
            }
        }

        self.advance(elapsed_ms);

        if start {
            self.start();
        }
    }

    pub fn apply(&mut self, input: PlayerInput) {
        match input {
            PlayerInput::Start => self.start(),
            PlayerInput::Click(target) => {
                self.click(target);
            }
        }
    }

    fn accepts(&self, target: SpawnTarget, kind: SpawnKind) -> bool {
        self.session.active && self.session.live(target).is_some_and(|s| s.kind == kind)
    }

    fn check_milestone(&mut self) {
        let collected = self.session.collected;
        if let Some(m) = milestone_at(collected) {
            if !self.session.milestones_hit.contains(&m.count) {
                self.session.milestones_hit.push(m.count);
                self.surface.show_feedback(m.message, FeedbackKind::Good);
            }
        }
    }

    fn clear_cell(&mut self, cell: usize) {
        if let Some(slot) = self.session.grid.get_mut(cell) {
            if slot.take().is_some() {
                self.surface.clear_cell(cell);
            }
        }
    }

    fn clear_grid(&mut self) {
        for cell in 0..self.session.grid.len() {
            self.clear_cell(cell);
        }
    }

    fn next_spawn_id(&mut self) -> SpawnId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{RecordingSurface, SurfaceCall};

    const SEED: u64 = 12345;

    fn engine() -> GameEngine<RecordingSurface> {
        GameEngine::new(RecordingSurface::new(), SEED)
    }

    fn engine_with(tuning: Tuning) -> GameEngine<RecordingSurface> {
        GameEngine::with_tuning(RecordingSurface::new(), SEED, tuning).unwrap()
    }

    /// Click drawn collectibles (stepping time between spawns) until `target`
    /// cans are held or the session ends.
    fn collect_until(engine: &mut GameEngine<RecordingSurface>, target: u32) {
        while engine.is_active() && engine.session().collected < target {
            match engine.surface().find(SpawnKind::Collectible) {
                Some(t) => {
                    assert_eq!(engine.click(t), ClickOutcome::Collected);
                }
                None => engine.advance(100),
            }
        }
    }

    fn wait_for_hazard(engine: &mut GameEngine<RecordingSurface>) -> SpawnTarget {
        loop {
            assert!(engine.is_active(), "session ended before a hazard spawned");
            if let Some(t) = engine.surface().find(SpawnKind::Hazard) {
                return t;
            }
            engine.advance(100);
        }
    }

    #[test]
    fn test_start_spawns_immediately() {
        let mut engine = engine();
        assert!(!engine.is_active());

        engine.start();
        let s = engine.session();
        assert!(s.active);
        assert_eq!(s.collected, 0);
        assert_eq!(s.time_left_secs, 30);
        assert_eq!(s.cans_per_spawn, 1);
        assert_eq!(s.spawn_interval_ms, 900);
        assert_eq!(s.occupied_cells().count(), 1);
        assert_eq!(engine.surface().drawn().len(), 1);
        assert_eq!(engine.surface().score, Some(0));
        assert_eq!(engine.surface().timer, Some(30));
        assert_eq!(engine.scheduler().armed_count(), 3);
    }

    #[test]
    fn test_second_start_is_noop() {
        let mut engine = engine();
        engine.start();
        let calls = engine.surface().calls.len();
        let first_can = engine.session().visible();

        engine.start();
        assert_eq!(engine.surface().calls.len(), calls);
        assert_eq!(engine.session().visible(), first_can);
        assert_eq!(engine.scheduler().armed_count(), 3);
    }

    #[test]
    fn test_win_at_goal() {
        let mut engine = engine();
        engine.start();
        collect_until(&mut engine, 25);

        assert!(!engine.is_active());
        assert_eq!(engine.outcome(), Some(SessionOutcome::Won));
        assert_eq!(engine.session().collected, 25);
        assert_eq!(
            engine.surface().feedback,
            Some((WIN_MESSAGE.to_string(), FeedbackKind::Good))
        );
        assert!(engine.surface().drawn().is_empty());
        assert_eq!(engine.scheduler().armed_count(), 0);
    }

    #[test]
    fn test_timeout_reports_count() {
        let mut engine = engine();
        engine.start();
        collect_until(&mut engine, 7);
        assert_eq!(engine.session().collected, 7);

        // Only let the clock run from here on
        engine.advance(30_000);

        assert!(!engine.is_active());
        assert_eq!(
            engine.outcome(),
            Some(SessionOutcome::TimedOut { collected: 7 })
        );
        let (msg, kind) = engine.surface().feedback.clone().unwrap();
        assert!(msg.contains('7'));
        assert_eq!(kind, FeedbackKind::Bad);
        assert_eq!(engine.surface().timer, Some(0));
    }

    #[test]
    fn test_countdown_ends_after_duration() {
        let mut engine = engine();
        engine.start();

        engine.advance(29_999);
        assert!(engine.is_active());
        assert_eq!(engine.session().time_left_secs, 1);

        engine.advance(1);
        assert!(!engine.is_active());
        assert_eq!(
            engine.outcome(),
            Some(SessionOutcome::TimedOut { collected: 0 })
        );

        let calls = engine.surface().calls.len();
        engine.advance(60_000);
        assert_eq!(engine.surface().calls.len(), calls);
    }

    #[test]
    fn test_hazard_floors_at_zero() {
        let mut engine = engine_with(Tuning {
            hazard_chance: 1.0,
            ..Tuning::default()
        });
        engine.start();

        let hazard = wait_for_hazard(&mut engine);
        assert_eq!(engine.click(hazard), ClickOutcome::Penalized);
        assert_eq!(engine.session().collected, 0);
        assert_eq!(
            engine.surface().feedback,
            Some((HAZARD_MESSAGE.to_string(), FeedbackKind::Bad))
        );
        assert!(engine.session().live(hazard).is_none());
    }

    #[test]
    fn test_hazard_takes_one_can() {
        let mut engine = engine_with(Tuning {
            start_cans_per_spawn: 3,
            hazard_chance: 0.5,
            duration_secs: 600,
            ..Tuning::default()
        });
        engine.start();
        collect_until(&mut engine, 3);

        let hazard = wait_for_hazard(&mut engine);
        engine.click(hazard);
        assert_eq!(engine.session().collected, 2);
        assert_eq!(engine.surface().score, Some(2));
    }

    #[test]
    fn test_kind_specific_handlers_reject_wrong_kind() {
        let mut engine = engine_with(Tuning {
            hazard_chance: 1.0,
            ..Tuning::default()
        });
        engine.start();

        let hazard = wait_for_hazard(&mut engine);
        assert_eq!(engine.on_collectible_clicked(hazard), ClickOutcome::Ignored);
        assert_eq!(engine.session().collected, 0);
        assert!(engine.session().live(hazard).is_some());
    }

    #[test]
    fn test_click_after_end_is_ignored() {
        let mut engine = engine();
        engine.start();
        let (target, _) = engine.session().visible()[0];

        engine.end_session(false);
        assert_eq!(engine.click(target), ClickOutcome::Ignored);
        assert_eq!(engine.on_collectible_clicked(target), ClickOutcome::Ignored);
        assert_eq!(engine.on_hazard_clicked(target), ClickOutcome::Ignored);
        assert_eq!(engine.session().collected, 0);
    }

    #[test]
    fn test_click_after_respawn_is_ignored() {
        let mut engine = engine();
        engine.start();
        let (target, _) = engine.session().visible()[0];

        engine.advance(900);
        assert!(engine.session().live(target).is_none());
        assert_eq!(engine.click(target), ClickOutcome::Ignored);
        assert_eq!(engine.session().collected, 0);
    }

    #[test]
    fn test_double_click_counts_once() {
        let mut engine = engine_with(Tuning {
            hazard_chance: 0.0,
            ..Tuning::default()
        });
        engine.start();
        let (target, _) = engine.session().visible()[0];

        assert_eq!(engine.click(target), ClickOutcome::Collected);
        assert_eq!(engine.click(target), ClickOutcome::Ignored);
        assert_eq!(engine.session().collected, 1);
    }

    #[test]
    fn test_end_session_is_idempotent() {
        let mut engine = engine();
        engine.start();
        engine.end_session(false);
        let calls = engine.surface().calls.clone();
        let outcome = engine.outcome();

        engine.end_session(false);
        engine.end_session(true);
        assert_eq!(engine.surface().calls, calls);
        assert_eq!(engine.outcome(), outcome);
    }

    #[test]
    fn test_difficulty_ramp_and_clamp() {
        let mut engine = engine();
        engine.start();

        engine.advance(10_000);
        assert_eq!(engine.session().cans_per_spawn, 2);
        assert_eq!(engine.session().spawn_interval_ms, 800);
        assert_eq!(engine.scheduler().period_ms(TimerKind::Spawn), Some(800));

        engine.advance(10_000);
        assert_eq!(engine.session().cans_per_spawn, 3);
        assert_eq!(engine.session().spawn_interval_ms, 800);

        // Past the ceiling the ticks are harmless
        engine.on_difficulty_tick();
        engine.on_difficulty_tick();
        assert_eq!(engine.session().cans_per_spawn, 3);
        assert_eq!(engine.session().spawn_interval_ms, 800);
    }

    #[test]
    fn test_difficulty_restarts_spawn_phase() {
        let mut engine = engine();
        engine.start();

        // Last spawn on the old period was at 9900ms
        engine.advance(10_000);
        assert_eq!(
            engine.scheduler().next_due(),
            Some((10_800, TimerKind::Spawn))
        );
    }

    #[test]
    fn test_spawn_uses_distinct_cells() {
        let mut engine = engine_with(Tuning {
            duration_secs: 600,
            ..Tuning::default()
        });
        engine.start();
        engine.advance(20_000);
        assert_eq!(engine.session().cans_per_spawn, 3);

        // A repeated pick would leave fewer than three cells filled
        for _ in 0..20 {
            engine.advance(800);
            assert_eq!(engine.session().occupied_cells().count(), 3);
            assert_eq!(engine.surface().drawn().len(), 3);
        }
    }

    #[test]
    fn test_milestones_fire_once() {
        let mut engine = engine_with(Tuning {
            start_cans_per_spawn: 3,
            hazard_chance: 0.5,
            duration_secs: 600,
            ..Tuning::default()
        });
        engine.start();
        collect_until(&mut engine, 5);

        // Drop back below the threshold and climb over it again
        let hazard = wait_for_hazard(&mut engine);
        engine.click(hazard);
        assert_eq!(engine.session().collected, 4);
        collect_until(&mut engine, 16);

        let log = engine.surface().feedback_log();
        let count = |m: &str| log.iter().filter(|l| **l == m).count();
        assert_eq!(count("Great start! 5 cans!"), 1);
        assert_eq!(count("Halfway there!"), 1);
    }

    #[test]
    fn test_restart_resets_session() {
        let mut engine = engine();
        engine.start();
        collect_until(&mut engine, 3);
        engine.advance(25_000);
        engine.advance(5_000);
        assert!(!engine.is_active());

        engine.start();
        let s = engine.session();
        assert!(s.active);
        assert_eq!(s.collected, 0);
        assert_eq!(s.time_left_secs, 30);
        assert_eq!(s.cans_per_spawn, 1);
        assert_eq!(s.spawn_interval_ms, 900);
        assert!(s.outcome.is_none());
        assert_eq!(engine.surface().feedback, None);
        assert_eq!(engine.scheduler().armed_count(), 3);
    }

    #[test]
    fn test_determinism() {
        // Same seed and inputs should produce identical surfaces
        let mut a = engine();
        let mut b = engine();

        for e in [&mut a, &mut b] {
            e.apply(PlayerInput::Start);
            collect_until(e, 4);
            e.advance(12_345);
        }

        assert_eq!(a.surface().calls, b.surface().calls);
        assert_eq!(a.session().visible(), b.session().visible());
    }

    #[test]
    fn test_default_spawn_distribution() {
        // Spawn ticks only, so density stays at one can per tick
        const TICKS: usize = 6000;
        let mut engine = engine();
        engine.start();

        let mut hazards = 0;
        let mut per_cell = [0usize; 9];
        for _ in 0..TICKS {
            engine.on_spawn_tick();
            let visible = engine.session().visible();
            assert_eq!(visible.len(), 1);
            let (target, kind) = visible[0];
            per_cell[target.cell] += 1;
            if kind == SpawnKind::Hazard {
                hazards += 1;
            }
        }

        let share = hazards as f64 / TICKS as f64;
        assert!((0.17..=0.23).contains(&share), "hazard share {}", share);

        let expected = TICKS / 9;
        for (cell, count) in per_cell.iter().enumerate() {
            assert!(
                count.abs_diff(expected) < 150,
                "cell {} picked {} times, expected ~{}",
                cell,
                count,
                expected
            );
        }
    }

    #[test]
    fn test_huge_advance_saturates() {
        let mut engine = engine();
        engine.start();
        engine.advance(10);

        engine.advance(u64::MAX);
        assert_eq!(engine.now_ms(), u64::MAX);
        assert_eq!(
            engine.outcome(),
            Some(SessionOutcome::TimedOut { collected: 0 })
        );
        assert_eq!(engine.scheduler().armed_count(), 0);

        engine.advance(u64::MAX);
        assert_eq!(engine.now_ms(), u64::MAX);
    }

    #[test]
    fn test_frame_starts_after_elapsed_time() {
        let mut engine = engine();
        engine.frame([PlayerInput::Start], 500);

        assert!(engine.is_active());
        assert_eq!(engine.now_ms(), 500);
        assert_eq!(
            engine.scheduler().next_due(),
            Some((1400, TimerKind::Spawn))
        );

        // The full countdown period belongs to the new session
        engine.advance(999);
        assert_eq!(engine.session().time_left_secs, 30);
        engine.advance(1);
        assert_eq!(engine.session().time_left_secs, 29);
    }

    #[test]
    fn test_frame_clicks_before_time_moves() {
        let mut engine = engine_with(Tuning {
            hazard_chance: 0.0,
            ..Tuning::default()
        });
        engine.start();
        let (target, _) = engine.session().visible()[0];

        // This frame also crosses the spawn tick that would clear the can
        engine.frame([PlayerInput::Click(target)], 900);
        assert_eq!(engine.session().collected, 1);
        assert!(engine.session().live(target).is_none());
    }

    #[test]
    fn test_initial_surface_shows_empty_grid() {
        let engine = engine();
        assert_eq!(
            engine.surface().calls,
            vec![
                SurfaceCall::RenderGrid(9),
                SurfaceCall::Score(0),
                SurfaceCall::Timer(30),
            ]
        );
    }

    #[test]
    fn test_with_tuning_rejects_invalid() {
        let err = GameEngine::with_tuning(
            RecordingSurface::new(),
            SEED,
            Tuning {
                goal: 0,
                ..Tuning::default()
            },
        )
        .err();
        assert_eq!(err, Some(TuningError::ZeroGoal));
    }
}
