use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::rc::Rc;

use super::game_engine::GameEngine;
use super::settings::Settings;
use super::stats_store::StatsStore;
use crate::destroyable::Destroyable;
use crate::events::{EventEmitter, EventObserver, Unsubscriber};
use crate::ledger::WalletLedgerClient;
use crate::model::{GameEngineCommand, GameEngineEvent, GamePhase, RoundClock, RoundResult};
use crate::ui::{Presenter, StatsSource};

/// Wires the engine to the presenter and sequences everything that
/// crosses a collaborator boundary: connecting, starting rounds,
/// forwarding clicks, and submitting finished scores to the ledger or
/// the local fallback store.
pub struct GameSession {
    engine: Rc<RefCell<GameEngine>>,
    command_emitter: EventEmitter<GameEngineCommand>,
    wallet: Option<Rc<dyn WalletLedgerClient>>,
    stats_store: StatsStore,
    presenter: Rc<dyn Presenter>,
    settings: Settings,
    connected: bool,
    demo_mode: bool,
    round_in_flight: bool,
    round_over: bool,
    engine_subscription: Option<Unsubscriber<GameEngineEvent>>,
}

impl Destroyable for GameSession {
    fn destroy(&mut self) {
        if let Some(subscription) = self.engine_subscription.take() {
            subscription.unsubscribe();
        }
    }
}

impl GameSession {
    pub fn new(
        engine: Rc<RefCell<GameEngine>>,
        command_emitter: EventEmitter<GameEngineCommand>,
        engine_event_observer: EventObserver<GameEngineEvent>,
        wallet: Option<Rc<dyn WalletLedgerClient>>,
        stats_store: StatsStore,
        presenter: Rc<dyn Presenter>,
        settings: Settings,
    ) -> Rc<RefCell<Self>> {
        let session = Rc::new(RefCell::new(Self {
            engine,
            command_emitter,
            wallet,
            stats_store,
            presenter,
            settings,
            connected: false,
            demo_mode: false,
            round_in_flight: false,
            round_over: false,
            engine_subscription: None,
        }));
        GameSession::wire_engine_events(session.clone(), engine_event_observer);
        session
    }

    fn wire_engine_events(
        session: Rc<RefCell<Self>>,
        engine_event_observer: EventObserver<GameEngineEvent>,
    ) {
        let (presenter, full_clock) = {
            let session = session.borrow();
            let full_clock = RoundClock::new(
                session.settings.round_duration(),
                session.settings.warning_threshold(),
                session.settings.danger_threshold(),
            );
            (session.presenter.clone(), full_clock)
        };
        let weak_session = Rc::downgrade(&session);
        let subscription = engine_event_observer.subscribe(move |event| {
            match event {
                GameEngineEvent::PhaseChanged(phase) => {
                    presenter.phase_changed(*phase);
                    if *phase == GamePhase::Playing {
                        presenter.timer_updated(full_clock.time_left(), full_clock.status());
                    }
                }
                GameEngineEvent::CountdownTicked(value) => presenter.countdown_ticked(*value),
                GameEngineEvent::TimerUpdated { time_left, status } => {
                    presenter.timer_updated(*time_left, *status)
                }
                GameEngineEvent::ClickCountUpdated(count) => {
                    presenter.click_count_updated(*count)
                }
                // The only arm that touches the session itself. Safe:
                // no session-initiated command produces RoundEnded
                // synchronously, so this borrow cannot re-enter.
                GameEngineEvent::RoundEnded(result) => {
                    if let Some(session) = weak_session.upgrade() {
                        session.borrow_mut().handle_round_ended(result);
                    }
                }
            }
        });
        session.borrow_mut().engine_subscription = Some(subscription);
    }

    /// Connect action. With no usable wallet this drops into demo mode:
    /// the session counts as connected and stats come from the local
    /// store.
    pub fn connect(&mut self) {
        if self.connected {
            self.presenter.alert("Already connected");
            return;
        }
        match self.wallet.clone() {
            Some(wallet) if wallet.is_available() => match wallet.connect() {
                Ok(address) => {
                    self.connected = true;
                    self.demo_mode = false;
                    info!(target: "session", "Wallet connected: {}", address);
                    self.presenter.wallet_connected(&address);
                    self.reload_stats();
                }
                Err(error) => {
                    warn!(target: "session", "Wallet connection failed: {}", error);
                    self.presenter.alert(&error.to_string());
                }
            },
            _ => {
                self.connected = true;
                self.demo_mode = true;
                info!(target: "session", "No ledger reachable; entering demo mode");
                self.presenter
                    .alert("No wallet detected; scores will be saved locally");
                let stats = self.stats_store.load();
                self.presenter.stats_updated(&stats, StatsSource::Local);
            }
        }
    }

    /// Start action. Requires a connection and an idle engine.
    pub fn start(&mut self) {
        if !self.connected {
            self.presenter.alert("Connect before starting a round");
            return;
        }
        if self.round_in_flight || self.engine.borrow().phase() != GamePhase::Idle {
            debug!(target: "session", "Start ignored: round already underway");
            return;
        }
        self.round_in_flight = true;
        self.round_over = false;
        self.presenter.set_start_enabled(false);
        self.command_emitter.emit(&GameEngineCommand::StartCountdown);
    }

    /// Click action; forwarded only while the engine is playing.
    pub fn click(&self) {
        let playing = self.engine.borrow().phase().is_playing();
        if !playing {
            trace!(target: "session", "Click dropped outside play");
            return;
        }
        self.command_emitter.emit(&GameEngineCommand::RegisterClick);
    }

    /// Play-again action; only meaningful once a round has finished.
    pub fn play_again(&mut self) {
        if !self.round_over {
            debug!(target: "session", "Play-again ignored: no finished round");
            return;
        }
        self.round_over = false;
        self.command_emitter.emit(&GameEngineCommand::Reset);
        self.presenter.reset_display();
        self.presenter.set_start_enabled(true);
    }

    /// Full in-memory re-initialization, used when the wallet account
    /// or network changes under us. Replaces the original's page
    /// reload: same clean slate, no teardown.
    pub fn reinitialize(&mut self) {
        info!(target: "session", "Reinitializing session state");
        self.command_emitter.emit(&GameEngineCommand::Reset);
        self.connected = false;
        self.demo_mode = false;
        self.round_in_flight = false;
        self.round_over = false;
        self.presenter.reset_display();
        self.presenter.set_start_enabled(true);
    }

    fn handle_round_ended(&mut self, result: &RoundResult) {
        info!(
            target: "session",
            "Round {} ended: {} clicks in {:.1}s",
            result.round_id,
            result.score,
            result.duration.as_secs_f64()
        );
        self.round_over = true;
        self.presenter.round_ended(result);
        self.submit_round(result);
        // whatever happened above, the player can start another round
        self.round_in_flight = false;
        self.presenter.set_start_enabled(true);
    }

    fn submit_round(&mut self, result: &RoundResult) {
        let score = result.score;
        let wallet = match self.wallet.clone() {
            Some(wallet) if !self.demo_mode && wallet.is_available() => wallet,
            _ => {
                self.record_locally(score);
                return;
            }
        };
        if score == 0 {
            info!(target: "session", "Zero score: nothing to submit");
            self.presenter.alert("Nothing to submit: no clicks this round");
            return;
        }
        if score < self.settings.min_score || score > self.settings.max_score {
            warn!(
                target: "session",
                "Score {} outside [{}, {}]; not submitting",
                score, self.settings.min_score, self.settings.max_score
            );
            self.presenter.alert(&format!(
                "Score {} is outside the valid range {}..={}",
                score, self.settings.min_score, self.settings.max_score
            ));
            return;
        }
        match wallet.submit_score(score) {
            Ok(tx_id) => {
                info!(target: "session", "Score {} submitted ({})", score, tx_id);
                self.presenter
                    .alert(&format!("Score {} recorded on the ledger", score));
                self.reload_stats();
            }
            Err(error) => {
                warn!(target: "session", "Submission failed: {}", error);
                self.presenter.alert(&error.to_string());
            }
        }
    }

    fn record_locally(&mut self, score: u32) {
        let mut stats = self.stats_store.load();
        stats.record_score(score);
        match self.stats_store.save(&stats) {
            Ok(()) => {
                info!(target: "session", "Score {} saved to the local store", score);
                self.presenter.stats_updated(&stats, StatsSource::Local);
                self.presenter.alert("Score saved locally");
            }
            Err(error) => {
                warn!(target: "session", "Local save failed: {}", error);
                self.presenter
                    .alert(&format!("Could not save score locally: {}", error));
            }
        }
    }

    /// Full re-read from the ledger; the presented stats are never
    /// patched speculatively.
    fn reload_stats(&mut self) {
        let Some(wallet) = self.wallet.clone() else {
            return;
        };
        match wallet.player_stats(None) {
            Ok(stats) => self.presenter.stats_updated(&stats, StatsSource::Ledger),
            Err(error) => {
                warn!(target: "session", "Stats reload failed: {}", error);
                self.presenter.alert(&error.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;
    use crate::events::Channel;
    use crate::ledger::{LedgerError, MemoryWalletClient, NetworkId};
    use crate::model::{PlayerStats, TimerStatus};
    use std::cell::Cell;
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingPresenter {
        phases: RefCell<Vec<GamePhase>>,
        countdowns: RefCell<Vec<u32>>,
        timers: RefCell<Vec<(Duration, TimerStatus)>>,
        clicks: RefCell<Vec<u32>>,
        results: RefCell<Vec<RoundResult>>,
        stats: RefCell<Vec<(PlayerStats, StatsSource)>>,
        addresses: RefCell<Vec<String>>,
        alerts: RefCell<Vec<String>>,
        start_enabled: Cell<bool>,
        resets: Cell<u32>,
    }

    impl Presenter for RecordingPresenter {
        fn phase_changed(&self, phase: GamePhase) {
            self.phases.borrow_mut().push(phase);
        }
        fn countdown_ticked(&self, value: u32) {
            self.countdowns.borrow_mut().push(value);
        }
        fn timer_updated(&self, time_left: Duration, status: TimerStatus) {
            self.timers.borrow_mut().push((time_left, status));
        }
        fn click_count_updated(&self, count: u32) {
            self.clicks.borrow_mut().push(count);
        }
        fn round_ended(&self, result: &RoundResult) {
            self.results.borrow_mut().push(result.clone());
        }
        fn stats_updated(&self, stats: &PlayerStats, source: StatsSource) {
            self.stats.borrow_mut().push((stats.clone(), source));
        }
        fn wallet_connected(&self, address: &str) {
            self.addresses.borrow_mut().push(address.to_string());
        }
        fn alert(&self, message: &str) {
            self.alerts.borrow_mut().push(message.to_string());
        }
        fn set_start_enabled(&self, enabled: bool) {
            self.start_enabled.set(enabled);
        }
        fn reset_display(&self) {
            self.resets.set(self.resets.get() + 1);
        }
    }

    impl RecordingPresenter {
        fn alert_containing(&self, needle: &str) -> bool {
            self.alerts.borrow().iter().any(|a| a.contains(needle))
        }

        fn last_stats(&self) -> Option<(PlayerStats, StatsSource)> {
            self.stats.borrow().last().cloned()
        }
    }

    /// Wallet that connects fine but fails every submission.
    struct FlakyWallet {
        connected: Cell<bool>,
    }

    impl FlakyWallet {
        fn new() -> Self {
            Self {
                connected: Cell::new(false),
            }
        }
    }

    impl WalletLedgerClient for FlakyWallet {
        fn is_available(&self) -> bool {
            true
        }
        fn connect(&self) -> Result<String, LedgerError> {
            self.connected.set(true);
            Ok("0xflaky".to_string())
        }
        fn is_connected(&self) -> bool {
            self.connected.get()
        }
        fn submit_score(&self, _score: u32) -> Result<String, LedgerError> {
            Err(LedgerError::Transport("rpc timed out".to_string()))
        }
        fn player_stats(&self, _address: Option<&str>) -> Result<PlayerStats, LedgerError> {
            Ok(PlayerStats::default())
        }
    }

    /// Wallet whose connect attempt is refused by the user.
    struct RefusingWallet;

    impl WalletLedgerClient for RefusingWallet {
        fn is_available(&self) -> bool {
            true
        }
        fn connect(&self) -> Result<String, LedgerError> {
            Err(LedgerError::Rejected("request dismissed".to_string()))
        }
        fn is_connected(&self) -> bool {
            false
        }
        fn submit_score(&self, _score: u32) -> Result<String, LedgerError> {
            Err(LedgerError::NotConnected)
        }
        fn player_stats(&self, _address: Option<&str>) -> Result<PlayerStats, LedgerError> {
            Err(LedgerError::NotConnected)
        }
    }

    struct Harness {
        clock: Rc<SimClock>,
        engine: Rc<RefCell<GameEngine>>,
        session: Rc<RefCell<GameSession>>,
        presenter: Rc<RecordingPresenter>,
        store_dir: std::path::PathBuf,
    }

    impl Harness {
        fn build(wallet: Option<Rc<dyn WalletLedgerClient>>, settings: Settings) -> Self {
            let clock = Rc::new(SimClock::new());
            let (command_emitter, command_observer) = Channel::new();
            let (event_emitter, event_observer) = Channel::new();
            let engine = GameEngine::new(
                command_observer,
                event_emitter,
                settings.clone(),
                clock.clone(),
                clock.clone(),
            );
            let presenter = Rc::new(RecordingPresenter::default());
            let store_dir =
                std::env::temp_dir().join(format!("clickrush-session-{}", Uuid::new_v4()));
            let session = GameSession::new(
                engine.clone(),
                command_emitter,
                event_observer,
                wallet,
                StatsStore::new(store_dir.clone()),
                presenter.clone(),
                settings,
            );
            Self {
                clock,
                engine,
                session,
                presenter,
                store_dir,
            }
        }

        fn store(&self) -> StatsStore {
            StatsStore::new(self.store_dir.clone())
        }

        /// Connect, start and play one full round with `clicks` clicks.
        fn play_round(&self, clicks: u32) {
            self.session.borrow_mut().start();
            self.clock.advance(Duration::from_secs(3));
            assert_eq!(self.engine.borrow().phase(), GamePhase::Playing);
            for _ in 0..clicks {
                self.session.borrow().click();
            }
            self.clock.advance(Duration::from_secs(10));
            assert_eq!(self.engine.borrow().phase(), GamePhase::Finished);
        }
    }

    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.round_duration_ms = 10_000;
        settings.tick_interval_ms = 100;
        settings.countdown_start = 3;
        settings
    }

    fn ledger_harness() -> (Harness, Rc<RefCell<crate::ledger::ScoreLedger>>, String) {
        let clock_for_ledger = Rc::new(SimClock::new());
        let ledger = Rc::new(RefCell::new(crate::ledger::ScoreLedger::new(
            clock_for_ledger,
        )));
        let wallet = Rc::new(MemoryWalletClient::new(
            ledger.clone(),
            NetworkId {
                chain_id: 31_337,
                rpc_url: "http://127.0.0.1:8545".to_string(),
            },
        ));
        let address = wallet.address().to_string();
        let harness = Harness::build(Some(wallet), test_settings());
        (harness, ledger, address)
    }

    #[test]
    fn test_start_rejected_when_disconnected() {
        let (harness, _ledger, _address) = ledger_harness();
        harness.session.borrow_mut().start();

        assert!(harness.presenter.alert_containing("Connect before"));
        assert_eq!(harness.engine.borrow().phase(), GamePhase::Idle);
    }

    #[test]
    fn test_connect_reloads_ledger_stats() {
        let (harness, ledger, address) = ledger_harness();
        ledger.borrow_mut().submit_score(&address, 123).unwrap();

        harness.session.borrow_mut().connect();
        assert_eq!(harness.presenter.addresses.borrow().len(), 1);
        let (stats, source) = harness.presenter.last_stats().unwrap();
        assert_eq!(source, StatsSource::Ledger);
        assert_eq!(stats.best_score, 123);
    }

    #[test]
    fn test_connect_twice_is_advisory_only() {
        let (harness, _ledger, _address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.session.borrow_mut().connect();

        assert!(harness.presenter.alert_containing("Already connected"));
        assert_eq!(harness.presenter.addresses.borrow().len(), 1);
    }

    #[test]
    fn test_refused_connect_leaves_session_disconnected() {
        let harness = Harness::build(Some(Rc::new(RefusingWallet)), test_settings());
        harness.session.borrow_mut().connect();

        assert!(harness.presenter.alert_containing("request dismissed"));
        harness.session.borrow_mut().start();
        assert_eq!(harness.engine.borrow().phase(), GamePhase::Idle);
    }

    #[test]
    fn test_no_wallet_drops_into_demo_mode() {
        let harness = Harness::build(None, test_settings());
        harness.session.borrow_mut().connect();

        assert!(harness.presenter.alert_containing("saved locally"));
        let (_, source) = harness.presenter.last_stats().unwrap();
        assert_eq!(source, StatsSource::Local);

        // demo mode still lets rounds be played
        harness.session.borrow_mut().start();
        assert_eq!(harness.engine.borrow().phase(), GamePhase::Countdown);
    }

    #[test]
    fn test_full_round_submits_and_rereads_stats() {
        let (harness, ledger, address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.play_round(5);

        let ledger_stats = ledger.borrow().player_stats(&address);
        assert_eq!(ledger_stats.games_played, 1);
        assert_eq!(ledger_stats.best_score, 5);
        assert_eq!(ledger_stats.total_clicks, 5);

        let (stats, source) = harness.presenter.last_stats().unwrap();
        assert_eq!(source, StatsSource::Ledger);
        assert_eq!(stats, ledger_stats);
        assert!(harness.presenter.start_enabled.get());
        assert_eq!(harness.presenter.results.borrow().len(), 1);
        assert_eq!(harness.presenter.results.borrow()[0].score, 5);
    }

    #[test]
    fn test_zero_score_is_not_submitted() {
        let (harness, ledger, address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.play_round(0);

        assert_eq!(ledger.borrow().score_count(&address), 0);
        assert!(harness.presenter.alert_containing("Nothing to submit"));
        assert!(harness.presenter.start_enabled.get());
    }

    #[test]
    fn test_out_of_range_score_rejected_before_any_call() {
        let (harness, ledger, address) = ledger_harness();
        {
            let mut session = harness.session.borrow_mut();
            session.settings.max_score = 3;
        }
        harness.session.borrow_mut().connect();
        harness.play_round(4);

        assert_eq!(ledger.borrow().score_count(&address), 0);
        assert!(harness.presenter.alert_containing("valid range"));
        assert!(harness.presenter.start_enabled.get());
    }

    #[test]
    fn test_demo_mode_merges_into_local_store() {
        let harness = Harness::build(None, test_settings());
        let mut prior = PlayerStats::default();
        prior.record_score(700);
        harness.store().save(&prior).unwrap();

        harness.session.borrow_mut().connect();
        harness.play_round(500);

        let stats = harness.store().load();
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.best_score, 700);
        assert_eq!(stats.total_clicks, 1_200);
        assert!(harness.presenter.start_enabled.get());
    }

    #[test]
    fn test_demo_mode_records_zero_score_games() {
        let harness = Harness::build(None, test_settings());
        harness.session.borrow_mut().connect();
        harness.play_round(0);

        let stats = harness.store().load();
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.total_clicks, 0);
    }

    #[test]
    fn test_failed_submission_reports_and_reenables_start() {
        let harness = Harness::build(Some(Rc::new(FlakyWallet::new())), test_settings());
        harness.session.borrow_mut().connect();
        harness.play_round(5);

        assert!(harness.presenter.alert_containing("rpc timed out"));
        assert!(harness.presenter.start_enabled.get());
        // no ledger-sourced stats arrived after the failure
        let ledger_reads = harness
            .presenter
            .stats
            .borrow()
            .iter()
            .filter(|(_, source)| *source == StatsSource::Ledger)
            .count();
        assert_eq!(ledger_reads, 1); // the connect-time read only
    }

    #[test]
    fn test_clicks_before_start_are_dropped() {
        let (harness, _ledger, _address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.session.borrow().click();
        harness.session.borrow().click();

        assert_eq!(harness.engine.borrow().click_count(), 0);
        assert!(harness.presenter.clicks.borrow().is_empty());
    }

    #[test]
    fn test_start_is_not_reentrant() {
        let (harness, _ledger, _address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.session.borrow_mut().start();
        harness.session.borrow_mut().start();

        // one countdown announcement, not two
        assert_eq!(harness.presenter.countdowns.borrow().as_slice(), &[3]);
    }

    #[test]
    fn test_play_again_resets_for_a_second_round() {
        let (harness, ledger, address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.play_round(5);

        harness.session.borrow_mut().play_again();
        assert_eq!(harness.engine.borrow().phase(), GamePhase::Idle);
        assert_eq!(harness.presenter.resets.get(), 1);

        harness.play_round(9);
        let stats = ledger.borrow().player_stats(&address);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.best_score, 9);
    }

    #[test]
    fn test_play_again_ignored_before_any_round_finishes() {
        let (harness, _ledger, _address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.session.borrow_mut().play_again();

        assert_eq!(harness.presenter.resets.get(), 0);
    }

    #[test]
    fn test_playing_phase_presents_full_clock() {
        let (harness, _ledger, _address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.session.borrow_mut().start();
        harness.clock.advance(Duration::from_secs(3));

        let timers = harness.presenter.timers.borrow();
        assert_eq!(
            timers.first(),
            Some(&(Duration::from_secs(10), TimerStatus::Normal))
        );
    }

    #[test]
    fn test_reinitialize_requires_a_fresh_connect() {
        let (harness, _ledger, _address) = ledger_harness();
        harness.session.borrow_mut().connect();
        harness.play_round(2);

        harness.session.borrow_mut().reinitialize();
        assert_eq!(harness.engine.borrow().phase(), GamePhase::Idle);

        harness.session.borrow_mut().start();
        assert!(harness.presenter.alert_containing("Connect before"));
        assert_eq!(harness.engine.borrow().phase(), GamePhase::Idle);
    }
}
