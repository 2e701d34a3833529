use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use dotenvy::dotenv;
use itertools::Itertools;
use rand::Rng;

use clickrush::clock::{MainLoop, TickFlow, TickScheduler};
use clickrush::events::Channel;
use clickrush::game::{GameEngine, GameSession, Settings, StatsStore};
use clickrush::ledger::{MemoryWalletClient, NetworkId, ScoreLedger, ScoreSubmitted, WalletLedgerClient};
use clickrush::model::GamePhase;
use clickrush::ui::ConsolePresenter;

/// Headless demo: connects to an in-process ledger, plays two scripted
/// rounds with an auto-clicker, then dumps the ledger history.
fn main() {
    let _ = dotenv();
    env_logger::init();

    let settings = Settings::load();
    let stats_store = StatsStore::new(Settings::data_dir());

    let main_loop = Rc::new(MainLoop::new());
    let ledger = Rc::new(RefCell::new(ScoreLedger::new(main_loop.clone())));
    let wallet = Rc::new(MemoryWalletClient::new(
        ledger.clone(),
        NetworkId {
            chain_id: settings.chain_id,
            rpc_url: settings.rpc_url.clone(),
        },
    ));

    // watch the contract's event stream the way an indexer would
    let _ledger_events = ledger.borrow().events().subscribe(|event: &ScoreSubmitted| {
        log::info!(target: "ledger", "Event: {:?}", event);
    });

    let (command_emitter, command_observer) = Channel::new();
    let (event_emitter, event_observer) = Channel::new();
    let engine = GameEngine::new(
        command_observer,
        event_emitter,
        settings.clone(),
        main_loop.clone(),
        main_loop.clone(),
    );
    let presenter = Rc::new(ConsolePresenter::new());
    let session = GameSession::new(
        engine.clone(),
        command_emitter,
        event_observer,
        Some(wallet.clone() as Rc<dyn WalletLedgerClient>),
        stats_store,
        presenter,
        settings,
    );

    session.borrow_mut().connect();

    for round in 1..=2 {
        println!("--- round {} ---", round);
        session.borrow_mut().start();
        spawn_auto_clicker(&main_loop, &engine, &session);
        // returns once the round timer and the clicker have retired
        main_loop.run();
        session.borrow_mut().play_again();
    }

    print_ledger_history(&ledger, wallet.address());
}

/// Schedules a jittered click source on the shared loop. It stops
/// itself as soon as the round finishes.
fn spawn_auto_clicker(
    main_loop: &Rc<MainLoop>,
    engine: &Rc<RefCell<GameEngine>>,
    session: &Rc<RefCell<GameSession>>,
) {
    let engine = Rc::downgrade(engine);
    let session = Rc::downgrade(session);
    let cadence = Duration::from_millis(rand::rng().random_range(45..90));
    let _ = main_loop.timeout_add(
        cadence,
        Box::new(move || {
            let (Some(engine), Some(session)) = (engine.upgrade(), session.upgrade()) else {
                return TickFlow::Stop;
            };
            if engine.borrow().phase() == GamePhase::Finished {
                return TickFlow::Stop;
            }
            session.borrow().click();
            TickFlow::Continue
        }),
    );
}

fn print_ledger_history(ledger: &Rc<RefCell<ScoreLedger>>, address: &str) {
    let ledger = ledger.borrow();
    println!();
    println!("ledger history for {}", address);
    println!(
        "  scores: [{}]",
        ledger.player_scores(address).iter().join(", ")
    );
    for index in 0..ledger.score_count(address) {
        if let Ok(record) = ledger.score_at(address, index) {
            let when = Local
                .timestamp_opt(record.timestamp as i64, 0)
                .single()
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("  #{}: {} clicks at {}", index, record.score, when);
        }
    }
    let stats = ledger.player_stats(address);
    println!(
        "  games: {}  best: {}  total clicks: {}",
        stats.games_played, stats.best_score, stats.total_clicks
    );
}
