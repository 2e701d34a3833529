use log::{trace, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use super::settings::Settings;
use crate::clock::{ScheduleHandle, TickFlow, TickScheduler, TimeSource};
use crate::destroyable::Destroyable;
use crate::events::{EventEmitter, EventObserver, Unsubscriber};
use crate::model::{GameEngineCommand, GameEngineEvent, GamePhase, RoundClock, RoundResult};

const COUNTDOWN_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// The round state machine: Idle -> Countdown -> Playing -> Finished,
/// with `reset` returning to Idle from anywhere. Driven by a command
/// channel and by ticks from the injected scheduler; publishes every
/// observable change on one event channel.
///
/// Invariant: at most one schedule (countdown or round timer) is live
/// at a time. Every transition that installs one removes the previous
/// one first, and `reset`/`destroy` remove it unconditionally.
pub struct GameEngine {
    phase: GamePhase,
    clock: RoundClock,
    click_count: u32,
    countdown_left: u32,
    round_started_at: Option<SystemTime>,
    schedule: Option<ScheduleHandle>,
    settings: Settings,
    time_source: Rc<dyn TimeSource>,
    scheduler: Rc<dyn TickScheduler>,
    event_emitter: EventEmitter<GameEngineEvent>,
    command_subscription: Option<Unsubscriber<GameEngineCommand>>,
    self_ref: Weak<RefCell<GameEngine>>,
}

impl Destroyable for GameEngine {
    fn destroy(&mut self) {
        self.cancel_schedule();
        if let Some(subscription) = self.command_subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl GameEngine {
    pub fn new(
        command_observer: EventObserver<GameEngineCommand>,
        event_emitter: EventEmitter<GameEngineEvent>,
        settings: Settings,
        time_source: Rc<dyn TimeSource>,
        scheduler: Rc<dyn TickScheduler>,
    ) -> Rc<RefCell<Self>> {
        let clock = RoundClock::new(
            settings.round_duration(),
            settings.warning_threshold(),
            settings.danger_threshold(),
        );
        let engine = Rc::new(RefCell::new(Self {
            phase: GamePhase::Idle,
            clock,
            click_count: 0,
            countdown_left: 0,
            round_started_at: None,
            schedule: None,
            settings,
            time_source,
            scheduler,
            event_emitter,
            command_subscription: None,
            self_ref: Weak::new(),
        }));
        engine.borrow_mut().self_ref = Rc::downgrade(&engine);
        GameEngine::wire_subscription(engine.clone(), command_observer);
        engine
    }

    fn wire_subscription(
        engine: Rc<RefCell<Self>>,
        command_observer: EventObserver<GameEngineCommand>,
    ) {
        let handler = engine.clone();
        let subscription = command_observer.subscribe(move |command| {
            handler.borrow_mut().handle_command(command.clone());
        });
        engine.borrow_mut().command_subscription = Some(subscription);
    }

    fn handle_command(&mut self, command: GameEngineCommand) {
        trace!(target: "game_engine", "Handling command: {:?}", command);
        match command {
            GameEngineCommand::StartCountdown => self.start_countdown(),
            GameEngineCommand::RegisterClick => self.register_click(),
            GameEngineCommand::EndRound => self.end_round(),
            GameEngineCommand::Reset => self.reset(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    pub fn time_left(&self) -> Duration {
        self.clock.time_left()
    }

    /// Live click rate against the wall clock; 0.0 before any round has
    /// started or when no time has elapsed yet.
    pub fn clicks_per_second(&self) -> f64 {
        let Some(started) = self.round_started_at else {
            return 0.0;
        };
        let elapsed = self
            .time_source
            .now()
            .duration_since(started)
            .unwrap_or_default();
        if elapsed.is_zero() {
            0.0
        } else {
            self.click_count as f64 / elapsed.as_secs_f64()
        }
    }

    /// Begins the pre-round countdown. Only honored from Idle; anywhere
    /// else the request is logged and dropped.
    pub fn start_countdown(&mut self) {
        if self.phase != GamePhase::Idle {
            warn!(target: "game_engine", "Ignoring countdown start while {:?}", self.phase);
            return;
        }
        self.cancel_schedule();
        self.set_phase(GamePhase::Countdown);
        self.countdown_left = self.settings.countdown_start;
        if self.countdown_left == 0 {
            self.begin_playing();
            return;
        }
        self.event_emitter
            .emit(&GameEngineEvent::CountdownTicked(self.countdown_left));
        self.install_schedule(COUNTDOWN_TICK_INTERVAL, Self::handle_countdown_tick);
    }

    fn handle_countdown_tick(&mut self) -> TickFlow {
        self.countdown_left = self.countdown_left.saturating_sub(1);
        if self.countdown_left == 0 {
            // zero is never published as a tick; it marks the handoff
            self.cancel_schedule();
            self.begin_playing();
            TickFlow::Stop
        } else {
            self.event_emitter
                .emit(&GameEngineEvent::CountdownTicked(self.countdown_left));
            TickFlow::Continue
        }
    }

    fn begin_playing(&mut self) {
        self.cancel_schedule();
        self.set_phase(GamePhase::Playing);
        self.click_count = 0;
        self.clock.reset();
        self.round_started_at = Some(self.time_source.now());
        self.event_emitter.emit(&GameEngineEvent::ClickCountUpdated(0));
        self.install_schedule(self.settings.tick_interval(), Self::handle_timer_tick);
    }

    fn handle_timer_tick(&mut self) -> TickFlow {
        self.clock.advance(self.settings.tick_interval());
        if self.clock.expired() {
            // the zero reading is published exactly once, by finish_round
            self.cancel_schedule();
            self.finish_round();
            TickFlow::Stop
        } else {
            self.event_emitter.emit(&GameEngineEvent::TimerUpdated {
                time_left: self.clock.time_left(),
                status: self.clock.status(),
            });
            TickFlow::Continue
        }
    }

    /// Accepted only while Playing; dropped (and traced) otherwise.
    pub fn register_click(&mut self) {
        if self.phase != GamePhase::Playing {
            trace!(target: "game_engine", "Dropping click while {:?}", self.phase);
            return;
        }
        self.click_count += 1;
        self.event_emitter
            .emit(&GameEngineEvent::ClickCountUpdated(self.click_count));
    }

    /// Ends the round early. Idempotent: outside Playing this is a
    /// no-op, so the round-ended event fires at most once per round.
    pub fn end_round(&mut self) {
        if self.phase != GamePhase::Playing {
            trace!(target: "game_engine", "Ignoring end_round while {:?}", self.phase);
            return;
        }
        self.cancel_schedule();
        self.clock.expire();
        self.finish_round();
    }

    fn finish_round(&mut self) {
        self.set_phase(GamePhase::Finished);
        self.event_emitter.emit(&GameEngineEvent::TimerUpdated {
            time_left: Duration::ZERO,
            status: self.clock.status(),
        });
        let now = self.time_source.now();
        let duration = self
            .round_started_at
            .and_then(|started| now.duration_since(started).ok())
            .unwrap_or_else(|| self.settings.round_duration());
        let result = RoundResult {
            round_id: Uuid::new_v4(),
            score: self.click_count,
            duration,
            timestamp: now,
        };
        self.event_emitter.emit(&GameEngineEvent::RoundEnded(result));
    }

    /// Valid from any phase: removes any live schedule and restores the
    /// defaults. After this, advancing time produces no further events.
    pub fn reset(&mut self) {
        self.cancel_schedule();
        self.click_count = 0;
        self.countdown_left = 0;
        self.round_started_at = None;
        self.clock.reset();
        self.set_phase(GamePhase::Idle);
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            self.phase = phase;
            self.event_emitter
                .emit(&GameEngineEvent::PhaseChanged(phase));
        }
    }

    fn install_schedule(&mut self, every: Duration, tick: fn(&mut Self) -> TickFlow) {
        let weak_engine = self.self_ref.clone();
        let handle = self.scheduler.timeout_add(
            every,
            Box::new(move || match weak_engine.upgrade() {
                Some(engine) => tick(&mut engine.borrow_mut()),
                None => TickFlow::Stop,
            }),
        );
        self.schedule = Some(handle);
    }

    fn cancel_schedule(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.remove();
        }
    }
}
