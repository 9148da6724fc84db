use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use common::{Error, Position, PositionStatus, Result, Signal, SignalType};

/// What applying a signal did to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOutcome {
    /// A new position was opened.
    Opened(Position),
    /// BUY while a position is already open; the ledger was left unchanged.
    AlreadyOpen(Position),
    /// The open position was closed. The snapshot carries the realized profit.
    Closed(Position),
    /// SELL without an open position; nothing to close.
    NoPosition,
    /// HOLD signals never touch the ledger.
    Unchanged,
}

/// In-memory paper positions, at most one per market.
///
/// Every mutation takes the write lock for its whole read-modify-write, so
/// overlapping callers cannot double-open or double-close a market.
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: RwLock<HashMap<String, Position>>,
}

/// Truncate toward zero at four decimal places.
pub fn truncate4(value: f64) -> f64 {
    (value * 10_000.0).trunc() / 10_000.0
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a position worth `order_amount` quote currency at `price`.
    pub async fn apply_buy(&self, market: &str, price: f64, order_amount: f64) -> Result<LedgerOutcome> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::Ledger(format!("cannot buy {market} at price {price}")));
        }

        let mut positions = self.positions.write().await;
        if let Some(open) = positions.get(market) {
            warn!(
                market,
                quantity = open.quantity,
                entry_price = open.entry_price,
                "BUY ignored: position already open"
            );
            return Ok(LedgerOutcome::AlreadyOpen(open.clone()));
        }

        let quantity = truncate4(order_amount / price);
        if quantity <= 0.0 {
            return Err(Error::Ledger(format!(
                "order amount {order_amount} buys nothing of {market} at {price}"
            )));
        }

        let position = Position {
            status: PositionStatus::Open,
            market: market.to_string(),
            quantity,
            entry_price: price,
            profit: 0.0,
        };
        info!(market, order_amount, quantity, entry_price = price, "Paper position opened");
        positions.insert(market.to_string(), position.clone());
        Ok(LedgerOutcome::Opened(position))
    }

    /// Close the open position for `market` at `price`.
    pub async fn apply_sell(&self, market: &str, price: f64) -> LedgerOutcome {
        let mut positions = self.positions.write().await;
        let Some(mut closed) = positions.remove(market) else {
            info!(market, "SELL ignored: no open position");
            return LedgerOutcome::NoPosition;
        };

        closed.profit = (price - closed.entry_price) * closed.quantity;
        closed.status = PositionStatus::None;
        info!(
            market,
            quantity = closed.quantity,
            entry_price = closed.entry_price,
            exit_price = price,
            profit = closed.profit,
            "Paper position closed"
        );
        LedgerOutcome::Closed(closed)
    }

    /// Apply a strategy signal. HOLD never mutates.
    pub async fn apply(&self, signal: &Signal, order_amount: f64) -> Result<LedgerOutcome> {
        match signal.kind {
            SignalType::Buy => {
                self.apply_buy(&signal.market, signal.current_price, order_amount)
                    .await
            }
            SignalType::Sell => Ok(self.apply_sell(&signal.market, signal.current_price).await),
            SignalType::Hold => {
                debug!(market = %signal.market, "HOLD: ledger unchanged");
                Ok(LedgerOutcome::Unchanged)
            }
        }
    }

    /// Open position for `market`, if any.
    pub async fn get(&self, market: &str) -> Option<Position> {
        self.positions.read().await.get(market).cloned()
    }

    /// All open positions, sorted by market.
    pub async fn positions(&self) -> Vec<Position> {
        let mut all: Vec<Position> = self.positions.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.market.cmp(&b.market));
        all
    }
}
