use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use common::{
    EngineCommand, EngineState, Error, MarketDataProvider, Notifier, Position, Result, Signal,
};
use paper::PositionLedger;

use crate::config::TradingConfig;
use crate::cycle::{Cycle, CycleReport};
use crate::signals::SignalBook;

#[derive(Debug, Default)]
struct EngineStats {
    cycles_started: AtomicU64,
    cycles_skipped: AtomicU64,
}

/// Scheduler counters, as exposed to the query surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub cycles_started: u64,
    /// Ticks dropped because the previous cycle was still running.
    pub cycles_skipped: u64,
}

/// Cloneable handle passed to other crates (Telegram, API).
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    state: Arc<RwLock<EngineState>>,
    signals: SignalBook,
    ledger: Arc<PositionLedger>,
    markets: Arc<RwLock<Vec<String>>>,
    stats: Arc<EngineStats>,
    started: Arc<Notify>,
}

impl EngineHandle {
    pub async fn send(&self, cmd: EngineCommand) {
        if self.command_tx.send(cmd).await.is_err() {
            warn!(command = ?cmd, "Engine is gone, command dropped");
        }
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }

    /// Wait until startup is over: `Scheduled` or later once market
    /// validation passed, `Stopped` if the engine failed to start.
    pub async fn wait_started(&self) -> EngineState {
        loop {
            let notified = self.started.notified();
            let state = *self.state.read().await;
            if state != EngineState::Idle {
                return state;
            }
            notified.await;
        }
    }

    pub async fn latest_signal(&self, market: &str) -> Option<Signal> {
        self.signals.get(market).await
    }

    /// Latest signal of every analyzed market, sorted by market.
    pub async fn latest_signals(&self) -> Vec<Signal> {
        self.signals.all().await
    }

    /// Open paper positions, sorted by market.
    pub async fn positions(&self) -> Vec<Position> {
        self.ledger.positions().await
    }

    /// Markets that survived startup validation. Empty before the engine starts.
    pub async fn markets(&self) -> Vec<String> {
        self.markets.read().await.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles_started: self.stats.cycles_started.load(Ordering::Relaxed),
            cycles_skipped: self.stats.cycles_skipped.load(Ordering::Relaxed),
        }
    }
}

/// The main engine: validates markets, then runs one analysis cycle per tick.
pub struct Engine {
    config: Arc<TradingConfig>,
    provider: Arc<dyn MarketDataProvider>,
    notifier: Arc<dyn Notifier>,
    state: Arc<RwLock<EngineState>>,
    signals: SignalBook,
    ledger: Arc<PositionLedger>,
    markets: Arc<RwLock<Vec<String>>>,
    stats: Arc<EngineStats>,
    started: Arc<Notify>,
    command_rx: mpsc::Receiver<EngineCommand>,
}

impl Engine {
    pub fn new(
        config: TradingConfig,
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let state = Arc::new(RwLock::new(EngineState::Idle));
        let signals = SignalBook::new();
        let ledger = Arc::new(PositionLedger::new());
        let markets = Arc::new(RwLock::new(Vec::new()));
        let stats = Arc::new(EngineStats::default());
        let started = Arc::new(Notify::new());

        let handle = EngineHandle {
            command_tx,
            state: state.clone(),
            signals: signals.clone(),
            ledger: ledger.clone(),
            markets: markets.clone(),
            stats: stats.clone(),
            started: started.clone(),
        };

        let engine = Engine {
            config: Arc::new(config),
            provider,
            notifier,
            state,
            signals,
            ledger,
            markets,
            stats,
            started,
            command_rx,
        };

        (engine, handle)
    }

    /// Qualified configured markets that the exchange actually lists.
    ///
    /// If the live list cannot be fetched or comes back empty, the configured
    /// markets are used unchanged.
    pub async fn validate_markets(&self) -> Vec<String> {
        let configured = self.config.qualified_markets();

        let listed = match self.provider.list_markets().await {
            Ok(listed) if !listed.is_empty() => listed,
            Ok(_) => {
                warn!("Exchange returned no markets, using configured markets unvalidated");
                return configured;
            }
            Err(e) => {
                warn!(error = %e, "Market list unavailable, using configured markets unvalidated");
                return configured;
            }
        };

        let by_id: HashMap<&str, _> = listed.iter().map(|m| (m.market.as_str(), m)).collect();
        let mut valid = Vec::with_capacity(configured.len());
        for market in &configured {
            match by_id.get(market.as_str()) {
                Some(info) => {
                    info!(
                        market = %market,
                        local_name = %info.local_name,
                        english_name = %info.english_name,
                        "Market validated"
                    );
                    valid.push(market.clone());
                }
                None => warn!(market = %market, "Market not listed on exchange, dropped"),
            }
        }
        info!(kept = valid.len(), total = configured.len(), "Market validation complete");
        valid
    }

    async fn prepare(&self) -> Result<Cycle> {
        let markets = self.validate_markets().await;
        if markets.is_empty() {
            return Err(Error::NoValidMarkets);
        }
        let strategy = strategy::build_strategy(&self.config.strategy)?;
        let candle_path = self.config.candle.api_path()?;
        *self.markets.write().await = markets.clone();

        Ok(Cycle {
            markets: Arc::new(markets),
            config: self.config.clone(),
            candle_path,
            strategy,
            provider: self.provider.clone(),
            notifier: self.notifier.clone(),
            ledger: self.ledger.clone(),
            signals: self.signals.clone(),
        })
    }

    /// Run the engine until `Stop` arrives or every handle is dropped.
    /// Call from `tokio::spawn`.
    ///
    /// Startup failures (no valid markets, unusable strategy) leave the engine
    /// `Stopped` and are returned.
    pub async fn run(mut self) -> Result<()> {
        let cycle = match self.prepare().await {
            Ok(cycle) => cycle,
            Err(e) => {
                error!(error = %e, "Engine failed to start");
                self.set_state(EngineState::Stopped).await;
                return Err(e);
            }
        };

        let interval = self.config.analysis_interval();
        info!(
            markets = ?cycle.markets,
            interval_secs = interval.as_secs(),
            "Engine scheduled"
        );
        self.set_state(EngineState::Scheduled).await;

        // The first tick completes immediately, so one cycle runs at startup.
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<Option<CycleReport>>> = None;

        loop {
            let trigger = tokio::select! {
                _ = ticker.tick() => Some("timer"),
                cmd = self.command_rx.recv() => match cmd {
                    Some(EngineCommand::RunNow) => Some("run_now"),
                    Some(EngineCommand::Stop) => {
                        info!("Engine stopping");
                        None
                    }
                    None => {
                        warn!("Engine command channel closed, shutting down");
                        None
                    }
                },
            };
            let Some(trigger) = trigger else { break };
            self.launch(&cycle, &mut in_flight, trigger).await;
        }

        if let Some(handle) = in_flight.take() {
            if !handle.is_finished() {
                info!("Waiting for in-flight cycle to finish");
            }
            let _ = handle.await;
        }
        self.set_state(EngineState::Stopped).await;
        info!("Engine stopped");
        Ok(())
    }

    async fn set_state(&self, next: EngineState) {
        *self.state.write().await = next;
        self.started.notify_waiters();
    }

    /// Spawn a cycle unless the previous one is still running.
    async fn launch(
        &self,
        cycle: &Cycle,
        in_flight: &mut Option<JoinHandle<Option<CycleReport>>>,
        trigger: &'static str,
    ) {
        if let Some(previous) = in_flight.take() {
            if !previous.is_finished() {
                self.stats.cycles_skipped.fetch_add(1, Ordering::Relaxed);
                warn!(trigger, "Previous cycle still running, skipping");
                *in_flight = Some(previous);
                return;
            }
            let _ = previous.await;
        }

        self.stats.cycles_started.fetch_add(1, Ordering::Relaxed);
        info!(trigger, "Launching cycle");

        let state = self.state.clone();
        let cycle = cycle.clone();
        *in_flight = Some(tokio::spawn(async move {
            *state.write().await = EngineState::CycleRunning;
            // Inner task so a panicking cycle surfaces as a JoinError here.
            let outcome = tokio::spawn(async move { cycle.run().await }).await;
            {
                let mut state = state.write().await;
                if *state == EngineState::CycleRunning {
                    *state = EngineState::Scheduled;
                }
            }
            match outcome {
                Ok(report) => Some(report),
                Err(e) => {
                    error!(error = %e, "Cycle task failed");
                    None
                }
            }
        }));
    }
}
