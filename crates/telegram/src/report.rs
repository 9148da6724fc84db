//! HTML rendering of cycle reports and command replies.

use teloxide::utils::html;

use common::{Action, EngineState, Position, PositionStatus, Signal, SignalType, StageDir};

/// Telegram rejects messages longer than this many characters.
pub const MESSAGE_LIMIT: usize = 4096;

const SEPARATOR: &str = "\n-----------------------------------------------------\n\n";

/// `50200000.4` -> `"50,200,000"`. Prices below 100 keep up to four decimals
/// so low-priced coins stay readable.
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.abs() < 100.0 {
        let fixed = format!("{value:.4}");
        return fixed.trim_end_matches('0').trim_end_matches('.').to_string();
    }

    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn signal_header(kind: SignalType) -> (&'static str, &'static str) {
    match kind {
        SignalType::Buy => ("🟢", "BUY signal"),
        SignalType::Sell => ("🔴", "SELL signal"),
        SignalType::Hold => ("⚪", "HOLD signal"),
    }
}

fn direction_label(dir: StageDir) -> Option<&'static str> {
    match dir {
        StageDir::Normal => Some("➡️ normal progression"),
        StageDir::Reverse => Some("🔙 reversal"),
        StageDir::Maintain => Some("⏸️ stage maintained"),
        StageDir::None => None,
    }
}

fn position_line(position: &Position) -> String {
    match position.status {
        PositionStatus::Open => format!(
            "OPEN {:.4} @ {}",
            position.quantity,
            format_price(position.entry_price)
        ),
        // A NONE snapshot with a quantity is a position closed this cycle.
        PositionStatus::None if position.quantity > 0.0 => format!(
            "CLOSED {:.4} @ {}, profit {}",
            position.quantity,
            format_price(position.entry_price),
            format_price(position.profit)
        ),
        PositionStatus::None => "none".to_string(),
    }
}

/// One action as a Telegram HTML block, sized so that the block plus its
/// batch separator never exceeds [`MESSAGE_LIMIT`].
pub fn format_action(action: &Action) -> String {
    let limit = MESSAGE_LIMIT - SEPARATOR.chars().count();
    let signal = &action.signal;
    let (emoji, label) = signal_header(signal.kind);

    let mut head = format!(
        "{}\n\n",
        html::bold(&format!("{emoji} [{}] {label}", html::escape(&action.market)))
    );
    head.push_str(&format!(
        "💰 {} {}\n",
        html::bold("Price:"),
        format_price(signal.current_price)
    ));
    if let Some(cross) = &action.cross_asset_price {
        head.push_str(&format!("🌐 {} {}\n", html::bold("Binance:"), html::escape(cross)));
    }

    if let Some(stage) = &signal.stage {
        head.push_str(&format!(
            "📊 Cycle stage: {}\n",
            html::bold(&stage.number.to_string())
        ));
        let description = html::escape(&stage.description);
        let line = match direction_label(stage.dir) {
            Some(dir) => format!("{description}, {dir}"),
            None => description,
        };
        head.push_str(&format!("✔ {}\n\n", html::italic(&line)));
    }

    head.push_str(&format!(
        "💼 {} {}\n",
        html::bold("Position:"),
        position_line(&action.position)
    ));

    let mut tail = format!(
        "🎯 {} {}\n",
        html::bold("Strategy:"),
        html::escape(&signal.strategy_name)
    );
    tail.push_str(&format!(
        "🕐 {} {}",
        html::bold("Time:"),
        signal.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let mut msg = head;
    if !signal.description.is_empty() {
        let details_head = format!("📝 {}\n", html::bold("Details:"));
        let used = msg.chars().count() + tail.chars().count() + details_head.chars().count() + 2;
        let details = clip_escaped(&signal.description, limit.saturating_sub(used));
        if !details.is_empty() {
            msg.push_str(&details_head);
            msg.push_str(&details);
            msg.push_str("\n\n");
        }
    }
    msg.push_str(&tail);
    msg
}

/// HTML-escape `text`, stopping at a character boundary so the escaped
/// result is at most `budget` characters. Entities are never split; a clipped
/// text ends with an ellipsis.
fn clip_escaped(text: &str, budget: usize) -> String {
    let escaped = html::escape(text);
    if escaped.chars().count() <= budget {
        return escaped;
    }
    if budget == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let piece = html::escape(c.encode_utf8(&mut buf));
        let len = piece.chars().count();
        // keep one slot for the ellipsis
        if used + len + 1 > budget {
            break;
        }
        out.push_str(&piece);
        used += len;
    }
    out.push('…');
    out
}

/// Render a whole cycle, packed into as few messages as fit under
/// [`MESSAGE_LIMIT`]. Blocks are never split across messages.
pub fn format_batch(actions: &[Action]) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();

    for action in actions {
        let mut block = format_action(action);
        block.push_str(SEPARATOR);

        if !current.is_empty()
            && current.chars().count() + block.chars().count() > MESSAGE_LIMIT
        {
            messages.push(std::mem::take(&mut current));
        }
        current.push_str(&block);
    }
    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

// ─── Command replies ──────────────────────────────────────────────────────────

pub fn format_status(
    state: EngineState,
    markets: &[String],
    cycles_started: u64,
    cycles_skipped: u64,
    open_positions: usize,
) -> String {
    let markets = if markets.is_empty() {
        "(not validated yet)".to_string()
    } else {
        html::escape(&markets.join(", "))
    };
    format!(
        "{}\n\
         Engine: {state}\n\
         Markets: {markets}\n\
         Cycles: {cycles_started} started, {cycles_skipped} skipped\n\
         Open positions: {open_positions}",
        html::bold("CycleBot status")
    )
}

/// One line per market: type, price and stage if any.
pub fn format_signal_summary(signals: &[Signal]) -> String {
    if signals.is_empty() {
        return "No signals yet.".to_string();
    }
    signals
        .iter()
        .map(|s| {
            let (emoji, _) = signal_header(s.kind);
            let stage = s
                .stage
                .as_ref()
                .map(|st| format!(" · {}", st.number))
                .unwrap_or_default();
            format!(
                "{emoji} {} {} {}{stage}",
                html::bold(&html::escape(&s.market)),
                s.kind,
                format_price(s.current_price)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_positions(positions: &[Position]) -> String {
    if positions.is_empty() {
        return "No open positions.".to_string();
    }
    positions
        .iter()
        .map(|p| format!("💼 {} {}", html::bold(&html::escape(&p.market)), position_line(p)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use common::{Stage, StageNumber};

    use super::*;

    fn action(kind: SignalType, stage: Option<Stage>, position: Position) -> Action {
        let market = position.market.clone();
        Action {
            market: market.clone(),
            signal: Signal {
                kind,
                market,
                current_price: 50_200_000.0,
                timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
                description: "📈 BUY signal - stage 1 | MA5 <rising>".into(),
                strategy_name: "moving-average-cycle".into(),
                stage,
            },
            position,
            cross_asset_price: Some("42150.01".into()),
        }
    }

    fn open_position() -> Position {
        Position {
            status: PositionStatus::Open,
            market: "KRW-BTC".into(),
            quantity: 0.02,
            entry_price: 50_000_000.0,
            profit: 0.0,
        }
    }

    #[test]
    fn prices_are_grouped() {
        assert_eq!(format_price(50_200_000.4), "50,200,000");
        assert_eq!(format_price(1_000.0), "1,000");
        assert_eq!(format_price(999.6), "1,000");
        assert_eq!(format_price(-100_000.0), "-100,000");
        assert_eq!(format_price(0.5123), "0.5123");
        assert_eq!(format_price(12.0), "12");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(html::escape("a < b & c > d"), "a &lt; b &amp; c &gt; d");
    }

    #[test]
    fn action_block_carries_every_field() {
        let stage = Stage {
            number: StageNumber::Stage1,
            dir: StageDir::Normal,
            description: "stable uptrend".into(),
        };
        let text = format_action(&action(SignalType::Buy, Some(stage), open_position()));

        assert!(text.starts_with("<b>🟢 [KRW-BTC] BUY signal</b>"));
        assert!(text.contains("💰 <b>Price:</b> 50,200,000"));
        assert!(text.contains("🌐 <b>Binance:</b> 42150.01"));
        assert!(text.contains("<b>STAGE_1</b>"));
        assert!(text.contains("stable uptrend, ➡️ normal progression"));
        assert!(text.contains("OPEN 0.0200 @ 50,000,000"));
        assert!(text.contains("MA5 &lt;rising&gt;"));
        assert!(text.contains("🕐 <b>Time:</b> 2024-03-01 09:30:00 UTC"));
    }

    #[test]
    fn closed_and_empty_positions_render_differently() {
        let mut closed = open_position();
        closed.status = PositionStatus::None;
        closed.profit = 100_000.0;
        let text = format_action(&action(SignalType::Sell, None, closed));
        assert!(text.contains("🔴 [KRW-BTC] SELL signal"));
        assert!(text.contains("CLOSED 0.0200 @ 50,000,000, profit 100,000"));
        assert!(!text.contains("Cycle stage"));

        let text = format_action(&action(SignalType::Hold, None, Position::none("KRW-BTC")));
        assert!(text.contains("⚪"));
        assert!(text.contains("<b>Position:</b> none"));
    }

    #[test]
    fn batch_fits_in_one_message_with_separators() {
        let actions = vec![
            action(SignalType::Hold, None, Position::none("KRW-BTC")),
            action(SignalType::Hold, None, Position::none("KRW-ETH")),
        ];
        let messages = format_batch(&actions);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].matches("-----").count(), 2);
        assert!(messages[0].contains("KRW-ETH"));
    }

    #[test]
    fn large_batch_is_split_under_the_limit() {
        let actions: Vec<Action> = (0..60)
            .map(|i| action(SignalType::Hold, None, Position::none(format!("KRW-C{i}"))))
            .collect();
        let messages = format_batch(&actions);

        assert!(messages.len() > 1);
        for m in &messages {
            assert!(m.chars().count() <= MESSAGE_LIMIT);
        }
        let total: usize = messages.iter().map(|m| m.matches("[KRW-C").count()).sum();
        assert_eq!(total, 60);
    }

    #[test]
    fn oversized_description_is_clipped_without_breaking_markup() {
        let mut huge = action(SignalType::Hold, None, Position::none("KRW-BTC"));
        huge.signal.description = "<&> ".repeat(2_000);

        let messages = format_batch(&[huge]);
        assert_eq!(messages.len(), 1);
        let text = &messages[0];
        assert!(text.chars().count() <= MESSAGE_LIMIT);
        assert!(text.contains("…"));
        assert!(text.contains("🎯 <b>Strategy:</b> moving-average-cycle"));

        // every '&' opens a whole entity
        for (idx, _) in text.match_indices('&') {
            let rest = &text[idx..];
            assert!(
                ["&lt;", "&gt;", "&amp;", "&quot;"].iter().any(|e| rest.starts_with(e)),
                "dangling entity at {idx}"
            );
        }
        assert_eq!(text.matches("<b>").count(), text.matches("</b>").count());
    }

    #[test]
    fn short_description_is_escaped_in_full() {
        assert_eq!(clip_escaped("a<b", 10), "a&lt;b");
        assert_eq!(clip_escaped("a<b", 5), "a…");
        assert_eq!(clip_escaped("abc", 0), "");
    }

    #[test]
    fn empty_batch_renders_nothing() {
        assert!(format_batch(&[]).is_empty());
    }

    #[test]
    fn summaries() {
        assert_eq!(format_signal_summary(&[]), "No signals yet.");
        let signal = Signal::hold("KRW-XRP", 812.0, "flat", "moving-average-cross");
        assert_eq!(format_signal_summary(&[signal]), "⚪ <b>KRW-XRP</b> HOLD 812");
        assert!(format_positions(&[open_position()]).contains("KRW-BTC"));
        let status = format_status(EngineState::Scheduled, &["KRW-BTC".into()], 3, 1, 0);
        assert!(status.contains("Engine: scheduled"));
        assert!(status.contains("3 started, 1 skipped"));
    }
}
