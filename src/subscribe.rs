//! WebSocket subscriptions
//!
//! [`WsSubscriber`] opens one `eth_subscribe` stream per call and hands every
//! message to a callback. A stream that stays silent longer than the
//! configured timeout, or whose transport fails, ends the subscription;
//! the `*_forever` helpers reconnect and subscribe again.
//!
//! # Example
//! ```no_run
//! use evm_query_kit::{subscribe::WsSubscriber, ChainId, ClientConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let subscriber = WsSubscriber::new(ChainId::Eth, &ClientConfig::default())?;
//! subscriber
//!     .subscribe_pending_transactions(|hash| println!("pending: {hash}"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use alloy::{
    network::{AnyNetwork, Network},
    primitives::B256,
    providers::{Provider, ProviderBuilder, WsConnect},
    pubsub::Subscription,
    rpc::types::{Filter, Log},
};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{
    chain::ChainId,
    config::ClientConfig,
    errors::InitError,
    provider::{resolve_endpoint, Transport},
};

/// Pause before resubscribing after a failed connection
pub const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

/// Block header type delivered by `newHeads`
pub type Header = <AnyNetwork as Network>::HeaderResponse;

/// What to subscribe to
#[derive(Debug, Clone)]
pub enum SubscriptionKind {
    NewPendingTransactions,
    NewHeads,
    Logs(Filter),
}

impl SubscriptionKind {
    /// `eth_subscribe` topic name
    pub fn name(&self) -> &'static str {
        match self {
            SubscriptionKind::NewPendingTransactions => "newPendingTransactions",
            SubscriptionKind::NewHeads => "newHeads",
            SubscriptionKind::Logs(_) => "logs",
        }
    }
}

/// One message received on a subscription
#[derive(Debug, Clone)]
pub enum StreamMessage {
    PendingTransaction(B256),
    NewHead(Box<Header>),
    Log(Box<Log>),
}

/// WebSocket subscriber for one chain
#[derive(Debug, Clone)]
pub struct WsSubscriber {
    chain: ChainId,
    endpoint: String,
    timeout: Duration,
}

impl WsSubscriber {
    /// Resolve the WebSocket endpoint of `config.provider` for `chain`
    ///
    /// No connection is made until a subscription starts.
    pub fn new(chain: ChainId, config: &ClientConfig) -> Result<Self, InitError> {
        let endpoint = resolve_endpoint(
            chain,
            config.provider,
            Transport::Ws,
            config.endpoint.as_deref(),
            &config.api_key,
        )?;
        Ok(Self {
            chain,
            endpoint,
            timeout: config.ws_timeout(),
        })
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Maximum wait for the next message
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Subscribe once and feed every message to `callback`
    ///
    /// # Returns
    /// * `Ok(())` - The stream ended on timeout or transport error (logged)
    /// * `Err(InitError::WsConnection)` - Connecting or subscribing failed
    pub async fn subscribe<F>(&self, kind: &SubscriptionKind, mut callback: F) -> Result<(), InitError>
    where
        F: FnMut(StreamMessage),
    {
        let provider = ProviderBuilder::new()
            .network::<AnyNetwork>()
            .connect_ws(WsConnect::new(self.endpoint.clone()))
            .await
            .map_err(|e| InitError::WsConnection(format!("{}: {e}", self.endpoint)))?;
        let subscribe_failed = |e: String| {
            InitError::WsConnection(format!("{} on {}: {e}", kind.name(), self.endpoint))
        };
        info!("connected to {}, subscribing to {}", self.chain, kind.name());

        match kind {
            SubscriptionKind::NewPendingTransactions => {
                let sub = provider
                    .subscribe_pending_transactions()
                    .await
                    .map_err(|e| subscribe_failed(e.to_string()))?;
                self.pump(kind, sub, |hash| {
                    callback(StreamMessage::PendingTransaction(hash))
                })
                .await;
            }
            SubscriptionKind::NewHeads => {
                let sub = provider
                    .subscribe_blocks()
                    .await
                    .map_err(|e| subscribe_failed(e.to_string()))?;
                self.pump(kind, sub, |header| {
                    callback(StreamMessage::NewHead(Box::new(header)))
                })
                .await;
            }
            SubscriptionKind::Logs(filter) => {
                let sub = provider
                    .subscribe_logs(filter)
                    .await
                    .map_err(|e| subscribe_failed(e.to_string()))?;
                self.pump(kind, sub, |log| callback(StreamMessage::Log(Box::new(log))))
                    .await;
            }
        }
        Ok(())
    }

    async fn pump<T, F>(&self, kind: &SubscriptionKind, mut sub: Subscription<T>, mut deliver: F)
    where
        T: DeserializeOwned,
        F: FnMut(T),
    {
        loop {
            match tokio::time::timeout(self.timeout, sub.recv()).await {
                Ok(Ok(item)) => deliver(item),
                Ok(Err(e)) => {
                    error!("{} subscription on {} failed: {e}", kind.name(), self.chain);
                    return;
                }
                Err(_) => {
                    error!(
                        "{} subscription on {} timed out after {:?}",
                        kind.name(),
                        self.chain,
                        self.timeout
                    );
                    return;
                }
            }
        }
    }

    /// Keep a subscription alive, resubscribing whenever it ends
    pub async fn subscribe_forever<F>(&self, kind: &SubscriptionKind, mut callback: F)
    where
        F: FnMut(StreamMessage),
    {
        loop {
            match self.subscribe(kind, &mut callback).await {
                Ok(()) => warn!("{} subscription on {} ended, resubscribing", kind.name(), self.chain),
                Err(e) => {
                    error!("{e}");
                    tokio::time::sleep(RESUBSCRIBE_DELAY).await;
                }
            }
        }
    }

    pub async fn subscribe_pending_transactions<F>(&self, mut callback: F) -> Result<(), InitError>
    where
        F: FnMut(B256),
    {
        self.subscribe(&SubscriptionKind::NewPendingTransactions, |message| {
            if let StreamMessage::PendingTransaction(hash) = message {
                callback(hash);
            }
        })
        .await
    }

    pub async fn subscribe_new_heads<F>(&self, mut callback: F) -> Result<(), InitError>
    where
        F: FnMut(Header),
    {
        self.subscribe(&SubscriptionKind::NewHeads, |message| {
            if let StreamMessage::NewHead(header) = message {
                callback(*header);
            }
        })
        .await
    }

    pub async fn subscribe_logs<F>(&self, filter: Filter, mut callback: F) -> Result<(), InitError>
    where
        F: FnMut(Log),
    {
        self.subscribe(&SubscriptionKind::Logs(filter), |message| {
            if let StreamMessage::Log(log) = message {
                callback(*log);
            }
        })
        .await
    }

    pub async fn pending_transactions_forever<F>(&self, mut callback: F)
    where
        F: FnMut(B256),
    {
        self.subscribe_forever(&SubscriptionKind::NewPendingTransactions, |message| {
            if let StreamMessage::PendingTransaction(hash) = message {
                callback(hash);
            }
        })
        .await
    }

    pub async fn new_heads_forever<F>(&self, mut callback: F)
    where
        F: FnMut(Header),
    {
        self.subscribe_forever(&SubscriptionKind::NewHeads, |message| {
            if let StreamMessage::NewHead(header) = message {
                callback(*header);
            }
        })
        .await
    }

    pub async fn logs_forever<F>(&self, filter: Filter, mut callback: F)
    where
        F: FnMut(Log),
    {
        self.subscribe_forever(&SubscriptionKind::Logs(filter), |message| {
            if let StreamMessage::Log(log) = message {
                callback(*log);
            }
        })
        .await
    }
}
