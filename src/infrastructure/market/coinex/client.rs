use anyhow::Context;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::time::{MissedTickBehavior, interval, sleep};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::application::services::coins::CoinsService;
use crate::bootstrap::config::CoinexConfig;
use crate::infrastructure::market::coinex::protocol::{
    self, FeedError, FeedMessage, sign_request, subscribe_request,
};
use crate::infrastructure::market::coinex::schedule::CoinListSchedule;

#[derive(Debug)]
enum FrameAction {
    Continue,
    Reply(Message),
    Closed,
}

fn delay_millis(delay: std::time::Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Long-running CoinEx BBO subscriber. Reconnects forever.
pub struct CoinexFeed {
    cfg: CoinexConfig,
    service: CoinsService,
    schedule: CoinListSchedule,
    coins: Vec<String>,
}

impl CoinexFeed {
    pub fn new(cfg: CoinexConfig, service: CoinsService) -> anyhow::Result<Self> {
        let period = chrono::Duration::from_std(cfg.coin_list_refresh)
            .context("coin list refresh period out of range")?;
        Ok(Self {
            schedule: CoinListSchedule::new(Utc::now(), period),
            cfg,
            service,
            coins: Vec::new(),
        })
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            match self.run_session().await {
                Ok(()) => tracing::info!(url = %self.cfg.ws_url, "coinex_ws_closed"),
                Err(e) => tracing::error!(error = ?e, url = %self.cfg.ws_url, "coinex_ws_failed"),
            }
            tracing::info!(
                delay_ms = delay_millis(self.cfg.reconnect_delay),
                "coinex_ws_reconnecting"
            );
            sleep(self.cfg.reconnect_delay).await;
        }
    }

    async fn run_session(&mut self) -> anyhow::Result<()> {
        let (ws, _) = connect_async(self.cfg.ws_url.as_str())
            .await
            .context("coinex_ws_connect")?;
        tracing::info!(url = %self.cfg.ws_url, "coinex_ws_connected");
        let (mut write, mut read) = ws.split();

        if let Some(creds) = &self.cfg.credentials {
            let auth = sign_request(&creds.access_id, &creds.signed_str, Utc::now().timestamp_millis());
            write
                .send(Message::text(auth))
                .await
                .context("coinex_ws_send_auth")?;
            tracing::info!(access_id = %creds.access_id, "coinex_auth_sent");
        }

        self.refresh_coins().await;
        write
            .send(Message::text(subscribe_request(&self.coins)))
            .await
            .context("coinex_ws_send_subscribe")?;
        tracing::info!(coins = ?self.coins, "coinex_bbo_subscribed");

        let mut check = interval(self.cfg.refresh_check_interval);
        check.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        check.tick().await;

        loop {
            tokio::select! {
                frame = read.next() => {
                    let msg = match frame {
                        None => return Ok(()),
                        Some(msg) => msg.context("coinex_ws_read")?,
                    };
                    match self.handle_frame(msg).await {
                        FrameAction::Continue => {}
                        FrameAction::Reply(reply) => {
                            write.send(reply).await.context("coinex_ws_send_reply")?;
                        }
                        FrameAction::Closed => return Ok(()),
                    }
                }
                _ = check.tick() => {
                    if self.refresh_coins().await {
                        write
                            .send(Message::text(subscribe_request(&self.coins)))
                            .await
                            .context("coinex_ws_send_subscribe")?;
                        tracing::info!(coins = ?self.coins, "coinex_bbo_resubscribed");
                    }
                }
            }
        }
    }

    /// Reloads the coin list when the schedule says so. Returns true when
    /// the list changed. A failed reload keeps the current list and is
    /// retried on the next check.
    async fn refresh_coins(&mut self) -> bool {
        let now = Utc::now();
        if !self.schedule.is_due(now) {
            return false;
        }
        match self.service.coin_names().await {
            Ok(names) => {
                self.schedule.mark_refreshed(now);
                let changed = names != self.coins;
                self.coins = names;
                tracing::info!(
                    count = self.coins.len(),
                    next_due = %self.schedule.next_due(),
                    "coin_list_updated"
                );
                changed
            }
            Err(e) => {
                tracing::warn!(error = ?e, "coin_list_refresh_failed");
                false
            }
        }
    }

    async fn handle_frame(&self, msg: Message) -> FrameAction {
        let decoded = match msg {
            Message::Binary(bytes) => protocol::decompress(&bytes)
                .and_then(|raw| protocol::parse_message(&raw)),
            Message::Text(text) => protocol::parse_message(text.as_bytes()),
            Message::Ping(payload) => return FrameAction::Reply(Message::Pong(payload)),
            Message::Close(frame) => {
                tracing::info!(?frame, "coinex_ws_close_frame");
                return FrameAction::Closed;
            }
            _ => return FrameAction::Continue,
        };
        self.handle_message(decoded).await;
        FrameAction::Continue
    }

    async fn handle_message(&self, decoded: Result<FeedMessage, FeedError>) {
        match decoded {
            Ok(FeedMessage::Quote(tick)) => {
                if let Err(e) = self.service.record_quote(&tick).await {
                    tracing::error!(error = ?e, symbol = %tick.symbol, "coinex_quote_store_failed");
                }
            }
            Ok(FeedMessage::Ack { code, message }) => match code {
                Some(code) if code != 0 => {
                    tracing::warn!(code, message = ?message, "coinex_request_rejected")
                }
                _ => tracing::debug!(message = ?message, "coinex_ack"),
            },
            Err(e) => tracing::warn!(error = ?e, "coinex_frame_decode_failed"),
        }
    }
}
