//! Copy-trading engine: follows one source agent and mirrors its new trades.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, PageEntry, TradesPage};
use crate::models::Trade;
use crate::output::ErrorReport;

use super::events::{CopyEvent, EventSink};
use super::mirror::MirrorOrder;
use super::schedule::{Schedule, Tick};
use super::CopyConfig;

pub const MIRROR_ERROR: &str = "MIRROR_ERROR";

/// Entries strictly newer than `cursor`, newest first.
///
/// The page is newest-first, so these are the entries before the cursor's
/// position. A cursor missing from the page means the whole page is new.
pub fn unseen_trades<'a>(page: &'a [PageEntry], cursor: &str) -> &'a [PageEntry] {
    match page.iter().position(|e| e.id == cursor) {
        Some(idx) => &page[..idx],
        None => page,
    }
}

/// Copy engine state.
pub struct CopyEngine<S> {
    config: CopyConfig,
    reader: ApiClient,
    trader: ApiClient,
    sink: S,

    // Id of the newest source trade already handled
    last_seen_id: Option<String>,
}

impl<S: EventSink> CopyEngine<S> {
    /// Create an engine. `reader` fetches the source's public history and
    /// should be unauthenticated; `trader` submits orders as the operator.
    pub fn new(config: CopyConfig, reader: ApiClient, trader: ApiClient, sink: S) -> Self {
        if reader.is_authenticated() {
            warn!("Trade history reader carries a credential; it will be sent to a public endpoint");
        }

        Self {
            config,
            reader,
            trader,
            sink,
            last_seen_id: None,
        }
    }

    /// Start from a known cursor instead of synchronising on the first tick.
    pub fn with_cursor(mut self, last_seen_id: impl Into<String>) -> Self {
        self.last_seen_id = Some(last_seen_id.into());
        self
    }

    pub fn config(&self) -> &CopyConfig {
        &self.config
    }

    /// Run ticks per `schedule`.
    pub async fn run(&mut self, schedule: Schedule) -> Result<(), ApiError> {
        info!(
            agent = %self.config.source_agent,
            market = self.config.market.as_str(),
            max_usdc = ?self.config.max_usdc,
            schedule = ?schedule,
            "Starting copy engine"
        );
        schedule.drive(self).await
    }

    /// One poll, diff and submit cycle.
    ///
    /// An error means the trade history could not be read; nothing was
    /// mirrored and the cursor is unchanged. Submission failures never
    /// surface here, they are reported per trade.
    pub async fn tick(&mut self) -> Result<(), ApiError> {
        let page = self.fetch_trades().await?;

        let Some(cursor) = self.last_seen_id.clone() else {
            // Cold start: sync to the latest trade, mirror nothing.
            self.last_seen_id = page.first().map(|t| t.id.clone());
            info!(
                agent = %self.config.source_agent,
                last_seen_id = ?self.last_seen_id,
                "Synchronised to source trade history"
            );
            self.sink.emit(CopyEvent::Started {
                agent: self.config.source_agent.clone(),
                last_seen_id: self.last_seen_id.clone(),
            });
            return Ok(());
        };

        let fresh = unseen_trades(&page, &cursor);
        if fresh.is_empty() {
            debug!(cursor = %cursor, "No new trades");
            return Ok(());
        }

        if fresh.len() == page.len() && !page.is_empty() {
            debug!(cursor = %cursor, "Cursor not in page; treating whole page as new");
        }

        // Advance before submitting so nothing attempted is retried.
        self.last_seen_id = Some(fresh[0].id.clone());
        info!(
            agent = %self.config.source_agent,
            count = fresh.len(),
            cursor = ?self.last_seen_id,
            "New source trades"
        );

        for entry in fresh.iter().rev() {
            self.mirror(entry).await;
        }

        Ok(())
    }

    async fn fetch_trades(&self) -> Result<Vec<PageEntry>, ApiError> {
        let limit = self.config.page_size.map(|n| n.to_string());

        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(cursor) = self.last_seen_id.as_deref() {
            query.push(("cursor", cursor));
        }
        if let Some(limit) = limit.as_deref() {
            query.push(("limit", limit));
        }

        let data = self
            .reader
            .get(&["agent", self.config.source_agent.as_str(), "trades"], &query)
            .await?;

        let page: TradesPage = serde_json::from_value(data).map_err(|e| ApiError::Parse {
            status: 200,
            reason: format!("trade page: {}", e),
        })?;

        Ok(page.into_entries())
    }

    async fn mirror(&mut self, entry: &PageEntry) {
        let trade = match &entry.trade {
            Ok(trade) => trade,
            Err(reason) => {
                self.mirror_failed(&entry.id, &format!("malformed trade: {}", reason));
                return;
            }
        };

        match self.submit(trade).await {
            Ok(result) => {
                info!(
                    trade_id = %trade.id,
                    side = trade.side.as_str(),
                    contract = %trade.contract_address,
                    "Mirrored trade"
                );
                self.sink.emit(CopyEvent::Mirror {
                    source: trade.clone(),
                    result,
                });
            }
            Err(message) => self.mirror_failed(&trade.id, &message),
        }
    }

    fn mirror_failed(&mut self, trade_id: &str, message: &str) {
        warn!(trade_id = %trade_id, error = %message, "Mirror failed");
        self.sink.report(
            ErrorReport::new(
                format!("Mirror failed for trade {}: {}", trade_id, message),
                MIRROR_ERROR,
            )
            .with_trade_id(trade_id),
        );
    }

    async fn submit(&self, trade: &Trade) -> Result<Value, String> {
        let order = MirrorOrder::from_trade(trade, self.config.note(), self.config.max_usdc)
            .map_err(|e| e.to_string())?;

        debug!(
            trade_id = %trade.id,
            amount_usdc = ?order.amount_usdc,
            quantity = ?order.quantity,
            "Submitting mirror order"
        );

        self.trader
            .post(&self.config.market.trade_path(), &order)
            .await
            .map_err(|e| e.to_string())
    }
}

impl<S: EventSink> Tick for CopyEngine<S> {
    type Error = ApiError;

    async fn tick(&mut self) -> Result<(), ApiError> {
        CopyEngine::tick(self).await
    }

    fn tick_failed(&mut self, err: ApiError) {
        warn!(code = err.code(), error = %err, "Failed to read source trades");
        self.sink.report(ErrorReport::from(&err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Market;
    use httpmock::Method::{GET, POST};
    use httpmock::{Mock, MockServer};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<CopyEvent>,
        errors: Vec<ErrorReport>,
    }

    impl EventSink for Recorder {
        fn emit(&mut self, event: CopyEvent) {
            self.events.push(event);
        }

        fn report(&mut self, report: ErrorReport) {
            self.errors.push(report);
        }
    }

    impl Recorder {
        fn mirrored_ids(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    CopyEvent::Mirror { source, .. } => Some(source.id.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    const TRADES_PATH: &str = "/api/v1/agent/target-agent/trades";
    const PAPER_TRADE_PATH: &str = "/api/v1/agent/paper/dex/trade";

    fn engine(server: &MockServer, config: CopyConfig) -> CopyEngine<Recorder> {
        let reader = ApiClient::reader(&server.base_url()).unwrap();
        let trader = ApiClient::trader(&server.base_url(), "test-key-123").unwrap();
        CopyEngine::new(config, reader, trader, Recorder::default())
    }

    async fn trades_page<'a>(server: &'a MockServer, trades: Value) -> Mock<'a> {
        server
            .mock_async(|when, then| {
                when.method(GET).path(TRADES_PATH);
                then.status(200)
                    .json_body(json!({"success": true, "response": {"trades": trades}}));
            })
            .await
    }

    async fn order_ok<'a>(server: &'a MockServer) -> Mock<'a> {
        server
            .mock_async(|when, then| {
                when.method(POST).path(PAPER_TRADE_PATH);
                then.status(200)
                    .json_body(json!({"success": true, "response": {"tradeId": "my-t1"}}));
            })
            .await
    }

    #[tokio::test]
    async fn test_cold_start_never_mirrors() {
        let server = MockServer::start_async().await;
        let read = trades_page(
            &server,
            json!([
                {"id": "t5", "side": "buy", "contractAddress": "0xabc", "amountUsdc": "100"},
                {"id": "t4", "side": "sell", "contractAddress": "0xdef", "quantity": "50"}
            ]),
        )
        .await;
        let orders = order_ok(&server).await;

        let mut engine = engine(&server, CopyConfig::new("target-agent"));
        engine.tick().await.unwrap();

        read.assert_hits_async(1).await;
        orders.assert_hits_async(0).await;
        assert_eq!(engine.last_seen_id.as_deref(), Some("t5"));
        assert_eq!(
            engine.sink.events,
            vec![CopyEvent::Started {
                agent: "target-agent".to_string(),
                last_seen_id: Some("t5".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_cold_start_reports_null_cursor() {
        let server = MockServer::start_async().await;
        let read = trades_page(&server, json!([])).await;

        let mut engine = engine(&server, CopyConfig::new("target-agent"));
        engine.tick().await.unwrap();

        read.assert_hits_async(1).await;
        assert_eq!(engine.last_seen_id.as_deref(), None);
        let started = serde_json::to_value(&engine.sink.events[0]).unwrap();
        assert_eq!(started["event"], "started");
        assert!(started["lastSeenId"].is_null());
    }

    #[tokio::test]
    async fn test_no_new_trades_is_silent() {
        let server = MockServer::start_async().await;
        let read = trades_page(
            &server,
            json!([{"id": "t5", "side": "buy", "contractAddress": "0xabc", "amountUsdc": "100"}]),
        )
        .await;
        let orders = order_ok(&server).await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        engine.tick().await.unwrap();

        read.assert_hits_async(1).await;
        orders.assert_hits_async(0).await;
        assert!(engine.sink.events.is_empty());
        assert!(engine.sink.errors.is_empty());
        assert_eq!(engine.last_seen_id.as_deref(), Some("t5"));
    }

    #[tokio::test]
    async fn test_detects_and_mirrors_new_trade() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t6", "side": "buy", "contractAddress": "0xnew", "amountUsdc": "200"},
                {"id": "t5", "side": "buy", "contractAddress": "0xabc", "amountUsdc": "100"}
            ]),
        )
        .await;
        let order = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PAPER_TRADE_PATH)
                    .header("Authorization", "Bearer test-key-123")
                    .json_body(json!({
                        "contractAddress": "0xnew",
                        "side": "buy",
                        "note": "copy:target-agent",
                        "amountUsdc": "200"
                    }));
                then.status(200).json_body(
                    json!({"success": true, "response": {"tradeId": "my-t1", "side": "buy"}}),
                );
            })
            .await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        engine.tick().await.unwrap();

        order.assert_hits_async(1).await;
        assert_eq!(engine.sink.mirrored_ids(), vec!["t6"]);
        match &engine.sink.events[0] {
            CopyEvent::Mirror { result, .. } => assert_eq!(result["tradeId"], "my-t1"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(engine.last_seen_id.as_deref(), Some("t6"));
    }

    #[tokio::test]
    async fn test_reader_is_anonymous_and_forwards_cursor() {
        let server = MockServer::start_async().await;
        let with_auth = server
            .mock_async(|when, then| {
                when.method(GET).path(TRADES_PATH).header_exists("Authorization");
                then.status(401).json_body(json!({"success": false, "response": "unexpected credential"}));
            })
            .await;
        let read = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(TRADES_PATH)
                    .query_param("cursor", "t4")
                    .query_param("limit", "100");
                then.status(200).json_body(json!({
                    "success": true,
                    "response": {"trades": [{"id": "t4", "side": "buy", "contractAddress": "0xabc", "amountUsdc": "1"}]}
                }));
            })
            .await;

        let mut config = CopyConfig::new("target-agent");
        config.page_size = Some(100);
        let mut engine = engine(&server, config).with_cursor("t4");
        engine.tick().await.unwrap();

        with_auth.assert_hits_async(0).await;
        read.assert_async().await;
    }

    #[tokio::test]
    async fn test_mirrors_oldest_first() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t8", "side": "buy", "contractAddress": "0xnewest", "amountUsdc": "300"},
                {"id": "t7", "side": "buy", "contractAddress": "0xmiddle", "amountUsdc": "200"},
                {"id": "t6", "side": "buy", "contractAddress": "0xoldest_new", "amountUsdc": "100"},
                {"id": "t5", "side": "buy", "contractAddress": "0xseen", "amountUsdc": "50"}
            ]),
        )
        .await;
        let orders = order_ok(&server).await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        engine.tick().await.unwrap();

        orders.assert_hits_async(3).await;
        assert_eq!(engine.sink.mirrored_ids(), vec!["t6", "t7", "t8"]);
        assert_eq!(engine.last_seen_id.as_deref(), Some("t8"));
    }

    #[tokio::test]
    async fn test_buy_amount_precedence() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t7", "side": "buy", "contractAddress": "0xamount", "amount": "75"},
                {"id": "t6", "side": "buy", "contractAddress": "0xtotal", "totalUsdc": "150"},
                {"id": "t5", "side": "buy", "contractAddress": "0xold", "totalUsdc": "10"}
            ]),
        )
        .await;
        let total = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PAPER_TRADE_PATH)
                    .json_body_partial(r#"{"contractAddress": "0xtotal", "amountUsdc": "150"}"#);
                then.status(200).json_body(json!({"success": true, "response": {}}));
            })
            .await;
        let amount = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PAPER_TRADE_PATH)
                    .json_body_partial(r#"{"contractAddress": "0xamount", "amountUsdc": "75"}"#);
                then.status(200).json_body(json!({"success": true, "response": {}}));
            })
            .await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        engine.tick().await.unwrap();

        total.assert_async().await;
        amount.assert_async().await;
        assert!(engine.sink.errors.is_empty());
    }

    #[tokio::test]
    async fn test_cap_applies_only_when_exceeded() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t7", "side": "buy", "contractAddress": "0xbig", "amountUsdc": "500"},
                {"id": "t6", "side": "buy", "contractAddress": "0xsmall", "amountUsdc": "30"},
                {"id": "t5", "side": "buy", "contractAddress": "0xold", "amountUsdc": "10"}
            ]),
        )
        .await;
        let capped = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PAPER_TRADE_PATH)
                    .json_body_partial(r#"{"contractAddress": "0xbig", "amountUsdc": "50"}"#);
                then.status(200).json_body(json!({"success": true, "response": {}}));
            })
            .await;
        let untouched = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(PAPER_TRADE_PATH)
                    .json_body_partial(r#"{"contractAddress": "0xsmall", "amountUsdc": "30"}"#);
                then.status(200).json_body(json!({"success": true, "response": {}}));
            })
            .await;

        let mut config = CopyConfig::new("target-agent");
        config.max_usdc = Some(dec!(50));
        let mut engine = engine(&server, config).with_cursor("t5");
        engine.tick().await.unwrap();

        capped.assert_async().await;
        untouched.assert_async().await;
    }

    #[tokio::test]
    async fn test_sell_mirrors_quantity() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t6", "side": "sell", "contractAddress": "0xabc", "quantity": "1000"},
                {"id": "t5", "side": "buy", "contractAddress": "0xold", "amountUsdc": "100"}
            ]),
        )
        .await;
        let sell = server
            .mock_async(|when, then| {
                when.method(POST).path(PAPER_TRADE_PATH).json_body(json!({
                    "contractAddress": "0xabc",
                    "side": "sell",
                    "note": "copy:target-agent",
                    "quantity": "1000"
                }));
                then.status(200).json_body(json!({"success": true, "response": {"tradeId": "my-t1"}}));
            })
            .await;

        let mut config = CopyConfig::new("target-agent");
        config.max_usdc = Some(dec!(5));
        let mut engine = engine(&server, config).with_cursor("t5");
        engine.tick().await.unwrap();

        sell.assert_async().await;
        assert_eq!(engine.sink.mirrored_ids(), vec!["t6"]);
    }

    #[tokio::test]
    async fn test_submission_failure_is_isolated() {
        let server = MockServer::start_async().await;
        let read = trades_page(
            &server,
            json!([
                {"id": "t8", "side": "buy", "contractAddress": "0xok2", "amountUsdc": "20"},
                {"id": "t7", "side": "buy", "contractAddress": "0xok1", "amountUsdc": "50"},
                {"id": "t6", "side": "buy", "contractAddress": "0xfail", "amountUsdc": "100"},
                {"id": "t5", "side": "buy", "contractAddress": "0xold", "amountUsdc": "10"}
            ]),
        )
        .await;
        let failing = server
            .mock_async(|when, then| {
                when.method(POST).path(PAPER_TRADE_PATH).body_contains("0xfail");
                then.status(400)
                    .json_body(json!({"success": false, "response": "Insufficient balance"}));
            })
            .await;
        let ok1 = server
            .mock_async(|when, then| {
                when.method(POST).path(PAPER_TRADE_PATH).body_contains("0xok1");
                then.status(200).json_body(json!({"success": true, "response": {"tradeId": "my-t1"}}));
            })
            .await;
        let ok2 = server
            .mock_async(|when, then| {
                when.method(POST).path(PAPER_TRADE_PATH).body_contains("0xok2");
                then.status(200).json_body(json!({"success": true, "response": {"tradeId": "my-t2"}}));
            })
            .await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        engine.tick().await.unwrap();

        // 1 read + 3 attempts
        read.assert_hits_async(1).await;
        failing.assert_hits_async(1).await;
        ok1.assert_hits_async(1).await;
        ok2.assert_hits_async(1).await;

        let errors = &engine.sink.errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, MIRROR_ERROR);
        assert_eq!(errors[0].trade_id.as_deref(), Some("t6"));
        assert!(errors[0].error.contains("Insufficient balance"));

        assert_eq!(engine.sink.mirrored_ids(), vec!["t7", "t8"]);
        assert_eq!(engine.last_seen_id.as_deref(), Some("t8"));
    }

    #[tokio::test]
    async fn test_cursor_advances_even_when_every_submission_fails() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t7", "side": "swap", "contractAddress": "0xodd"},
                {"id": "t6", "side": "buy", "contractAddress": "0xabc", "amountUsdc": "10"},
                {"id": "t5", "side": "buy", "contractAddress": "0xold", "amountUsdc": "10"}
            ]),
        )
        .await;
        let orders = server
            .mock_async(|when, then| {
                when.method(POST).path(PAPER_TRADE_PATH);
                then.status(503).body("upstream unavailable");
            })
            .await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        engine.tick().await.unwrap();

        // The unsupported side is rejected before any request.
        orders.assert_hits_async(1).await;
        let ids: Vec<_> = engine
            .sink
            .errors
            .iter()
            .map(|e| e.trade_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["t6", "t7"]);
        assert_eq!(engine.last_seen_id.as_deref(), Some("t7"));
    }

    #[tokio::test]
    async fn test_second_tick_on_same_page_is_idempotent() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t6", "side": "buy", "contractAddress": "0xnew", "amountUsdc": "200"},
                {"id": "t5", "side": "buy", "contractAddress": "0xabc", "amountUsdc": "100"}
            ]),
        )
        .await;
        let orders = order_ok(&server).await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        engine.tick().await.unwrap();
        engine.tick().await.unwrap();

        orders.assert_hits_async(1).await;
        assert_eq!(engine.sink.mirrored_ids(), vec!["t6"]);
    }

    #[tokio::test]
    async fn test_cursor_missing_from_page_mirrors_whole_page() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t9", "side": "buy", "contractAddress": "0x9", "amountUsdc": "1"},
                {"id": "t8", "side": "buy", "contractAddress": "0x8", "amountUsdc": "1"}
            ]),
        )
        .await;
        let orders = order_ok(&server).await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t2");
        engine.tick().await.unwrap();

        orders.assert_hits_async(2).await;
        assert_eq!(engine.sink.mirrored_ids(), vec!["t8", "t9"]);
    }

    #[tokio::test]
    async fn test_read_failure_aborts_tick() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(TRADES_PATH);
                then.status(404)
                    .json_body(json!({"success": false, "response": "Agent not found"}));
            })
            .await;
        let orders = order_ok(&server).await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        let err = engine.tick().await.unwrap_err();

        assert_eq!(err.code(), "HTTP_404");
        orders.assert_hits_async(0).await;
        assert!(engine.sink.events.is_empty());
        assert_eq!(engine.last_seen_id.as_deref(), Some("t5"));

        // Later ticks report the failure instead of stopping.
        Tick::tick_failed(&mut engine, err);
        assert_eq!(engine.sink.errors[0].code, "HTTP_404");
    }

    #[tokio::test]
    async fn test_live_market_uses_live_endpoint() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t6", "side": "buy", "contractAddress": "0xabc", "amountUsdc": "100"},
                {"id": "t5", "side": "buy", "contractAddress": "0xold", "amountUsdc": "50"}
            ]),
        )
        .await;
        let live = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/v1/agent/live/dex/trade");
                then.status(200).json_body(json!({"success": true, "response": {"tradeId": "my-t1"}}));
            })
            .await;

        let mut config = CopyConfig::new("target-agent");
        config.market = Market::Live;
        let mut engine = engine(&server, config).with_cursor("t5");
        engine.run(Schedule::Once).await.unwrap();

        live.assert_async().await;
    }

    #[test]
    fn test_unseen_trades_slices_before_cursor() {
        let page: TradesPage = serde_json::from_value(json!({"trades": [
            {"id": "t7", "side": "buy", "contractAddress": "0x", "amount": "1"},
            {"id": "t6", "side": "buy", "contractAddress": "0x", "amount": "1"},
            {"id": "t5", "side": "buy", "contractAddress": "0x", "amount": "1"}
        ]}))
        .unwrap();
        let page = page.into_entries();

        let ids = |s: &[PageEntry]| s.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(unseen_trades(&page, "t5")), vec!["t7", "t6"]);
        assert_eq!(ids(unseen_trades(&page, "t7")), Vec::<String>::new());
        assert_eq!(ids(unseen_trades(&page, "t1")).len(), 3);
        assert!(unseen_trades(&[], "t1").is_empty());
    }

    #[tokio::test]
    async fn test_malformed_trade_does_not_block_the_page() {
        let server = MockServer::start_async().await;
        let read = trades_page(
            &server,
            json!([
                {"id": "t7", "side": "buy", "contractAddress": "0xok", "amountUsdc": "20"},
                {"id": "t6", "side": "buy", "amountUsdc": "10"},
                {"id": "t5", "side": "buy", "contractAddress": "0xold", "amountUsdc": "10"}
            ]),
        )
        .await;
        let orders = order_ok(&server).await;

        let mut engine = engine(&server, CopyConfig::new("target-agent")).with_cursor("t5");
        for _ in 0..3 {
            engine.tick().await.unwrap();
        }

        read.assert_hits_async(3).await;
        orders.assert_hits_async(1).await;
        assert_eq!(engine.sink.mirrored_ids(), vec!["t7"]);
        assert_eq!(engine.last_seen_id.as_deref(), Some("t7"));

        let errors = &engine.sink.errors;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, MIRROR_ERROR);
        assert_eq!(errors[0].trade_id.as_deref(), Some("t6"));
        assert!(errors[0].error.starts_with("Mirror failed for trade t6: malformed trade"));
    }

    #[tokio::test]
    async fn test_uncappable_amount_is_reported_without_request() {
        let server = MockServer::start_async().await;
        trades_page(
            &server,
            json!([
                {"id": "t6", "side": "buy", "contractAddress": "0xabc", "amountUsdc": "plenty"},
                {"id": "t5", "side": "buy", "contractAddress": "0xold", "amountUsdc": "10"}
            ]),
        )
        .await;
        let orders = order_ok(&server).await;

        let mut config = CopyConfig::new("target-agent");
        config.max_usdc = Some(dec!(50));
        let mut engine = engine(&server, config).with_cursor("t5");
        engine.tick().await.unwrap();

        orders.assert_hits_async(0).await;
        assert_eq!(engine.sink.errors[0].trade_id.as_deref(), Some("t6"));
        assert_eq!(engine.last_seen_id.as_deref(), Some("t6"));
    }
}
