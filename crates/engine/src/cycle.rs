use std::sync::Arc;

use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use common::{Action, MarketDataProvider, Notifier, Position, Result, SignalType};
use paper::{LedgerOutcome, PositionLedger};
use strategy::Strategy;

use crate::config::TradingConfig;
use crate::signals::SignalBook;

/// Outcome of one analysis pass over all markets.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Actions in market order; this is what was published.
    pub actions: Vec<Action>,
    /// Markets skipped because their candles could not be fetched.
    pub failed: Vec<String>,
}

/// Everything one cycle needs. Cloned cheaply into each spawned cycle task.
#[derive(Clone)]
pub struct Cycle {
    pub(crate) markets: Arc<Vec<String>>,
    pub(crate) config: Arc<TradingConfig>,
    pub(crate) candle_path: String,
    pub(crate) strategy: Arc<dyn Strategy>,
    pub(crate) provider: Arc<dyn MarketDataProvider>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) ledger: Arc<PositionLedger>,
    pub(crate) signals: SignalBook,
}

impl Cycle {
    /// Analyze every market once and publish the resulting batch.
    pub async fn run(&self) -> CycleReport {
        let span = info_span!("cycle", id = %Uuid::new_v4());
        self.run_markets().instrument(span).await
    }

    async fn run_markets(&self) -> CycleReport {
        info!(markets = self.markets.len(), strategy = self.strategy.name(), "Cycle started");
        let mut report = CycleReport::default();

        for market in self.markets.iter() {
            match self.process_market(market).await {
                Ok(action) => report.actions.push(action),
                Err(e) => {
                    warn!(market = %market, error = %e, "Skipping market this cycle");
                    report.failed.push(market.clone());
                }
            }
        }

        if report.actions.is_empty() {
            warn!(failed = report.failed.len(), "No actions produced, nothing published");
        } else if let Err(e) = self.notifier.publish_batch(&report.actions).await {
            error!(error = %e, actions = report.actions.len(), "Failed to publish cycle report");
        }

        info!(
            processed = report.actions.len(),
            failed = report.failed.len(),
            "Cycle finished"
        );
        report
    }

    async fn process_market(&self, market: &str) -> Result<Action> {
        let candles = self
            .provider
            .candles(market, &self.candle_path, self.strategy.required_candle_count())
            .await?;

        let signal = self.strategy.analyze(market, &candles);
        info!(
            market,
            signal = %signal.kind,
            price = signal.current_price,
            description = %signal.description,
            "Signal"
        );
        self.signals.record(signal.clone()).await;

        let closed = match signal.kind {
            SignalType::Hold => None,
            SignalType::Buy | SignalType::Sell => {
                match self.ledger.apply(&signal, self.config.order_amount).await {
                    Ok(LedgerOutcome::Closed(snapshot)) => Some(snapshot),
                    Ok(_) => None,
                    Err(e) => {
                        warn!(market, error = %e, "Ledger rejected signal");
                        None
                    }
                }
            }
        };
        let position = match closed {
            Some(snapshot) => snapshot,
            None => self
                .ledger
                .get(market)
                .await
                .unwrap_or_else(|| Position::none(market)),
        };

        let cross_asset_price = match self.config.cross_asset_symbol(market) {
            Some(symbol) => match self.provider.cross_asset_price(&symbol).await {
                Ok(price) => Some(price),
                Err(e) => {
                    warn!(market, symbol = %symbol, error = %e, "Cross-asset price unavailable");
                    None
                }
            },
            None => None,
        };

        Ok(Action {
            market: market.to_string(),
            signal,
            position,
            cross_asset_price,
        })
    }
}
