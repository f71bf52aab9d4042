use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::ConsistencyConfig;
use crate::core::UserId;
use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::DocumentStore;

/// One half of a friendship edge, written on the owner's document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeOperation {
    LinkFriend { owner: UserId, friend: UserId },
    UnlinkFriend { owner: UserId, friend: UserId },
}

impl EdgeOperation {
    /// The operation that undoes this one
    pub fn compensation(&self) -> EdgeOperation {
        match self {
            EdgeOperation::LinkFriend { owner, friend } => EdgeOperation::UnlinkFriend {
                owner: owner.clone(),
                friend: friend.clone(),
            },
            EdgeOperation::UnlinkFriend { owner, friend } => EdgeOperation::LinkFriend {
                owner: owner.clone(),
                friend: friend.clone(),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            EdgeOperation::LinkFriend { owner, friend } => format!("link {} -> {}", owner, friend),
            EdgeOperation::UnlinkFriend { owner, friend } => format!("unlink {} -> {}", owner, friend),
        }
    }

    async fn apply(&self, store: &dyn DocumentStore) -> AppResult<()> {
        match self {
            EdgeOperation::LinkFriend { owner, friend } => store.add_friend_ref(owner, friend).await,
            EdgeOperation::UnlinkFriend { owner, friend } => {
                store.remove_friend_ref(owner, friend).await
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyStats {
    pub symmetric_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
    pub compensations_attempted: u64,
    pub compensations_successful: u64,
    pub partial_failures: u64,
}

/// Writes both halves of a friendship edge and undoes the first half when the
/// second one fails, so a failed call leaves no one-directional edge behind.
pub struct SymmetricEdgeWriter {
    store: Arc<dyn DocumentStore>,
    config: ConsistencyConfig,
    stats: Arc<RwLock<ConsistencyStats>>,
}

impl SymmetricEdgeWriter {
    pub fn new(store: Arc<dyn DocumentStore>, config: ConsistencyConfig) -> Self {
        Self {
            store,
            config,
            stats: Arc::new(RwLock::new(ConsistencyStats::default())),
        }
    }

    /// Friendship caller <-> peer, caller side first. When the caller side is
    /// already linked only the peer side is written, and nothing is compensated.
    pub async fn link(&self, caller: &UserId, peer: &UserId, caller_side_done: bool) -> AppResult<()> {
        info!("Creating friendship: {} <-> {}", caller, peer);
        let first = EdgeOperation::LinkFriend { owner: caller.clone(), friend: peer.clone() };
        self.execute_pair(
            "link_friends",
            (!caller_side_done).then_some(first),
            EdgeOperation::LinkFriend { owner: peer.clone(), friend: caller.clone() },
        )
        .await
    }

    /// Remove friendship caller <-> peer, caller side first. Same skip rule as `link`.
    pub async fn unlink(&self, caller: &UserId, peer: &UserId, caller_side_done: bool) -> AppResult<()> {
        info!("Removing friendship: {} <-> {}", caller, peer);
        let first = EdgeOperation::UnlinkFriend { owner: caller.clone(), friend: peer.clone() };
        self.execute_pair(
            "unlink_friends",
            (!caller_side_done).then_some(first),
            EdgeOperation::UnlinkFriend { owner: peer.clone(), friend: caller.clone() },
        )
        .await
    }

    async fn execute_pair(
        &self,
        operation_name: &str,
        first: Option<EdgeOperation>,
        second: EdgeOperation,
    ) -> AppResult<()> {
        self.stats.write().await.symmetric_operations += 1;

        let first = match first {
            Some(first) => first,
            None => {
                debug!("{} only needs {}", operation_name, second.describe());
                let result = second.apply(self.store.as_ref()).await;
                let mut stats = self.stats.write().await;
                match &result {
                    Ok(()) => stats.successful_operations += 1,
                    Err(_) => stats.failed_operations += 1,
                }
                return result;
            }
        };

        // Nothing written yet, a failure here is clean
        if let Err(e) = first.apply(self.store.as_ref()).await {
            warn!("{} failed on first write ({}): {}", operation_name, first.describe(), e);
            self.stats.write().await.failed_operations += 1;
            return Err(e);
        }

        let second_error = match second.apply(self.store.as_ref()).await {
            Ok(()) => {
                debug!("{} completed both writes", operation_name);
                self.stats.write().await.successful_operations += 1;
                return Ok(());
            }
            Err(e) => e,
        };

        warn!(
            "{} failed on second write ({}): {} - compensating first write",
            operation_name,
            second.describe(),
            second_error
        );
        self.stats.write().await.failed_operations += 1;

        let compensation = first.compensation();
        match self.compensate(&compensation).await {
            Ok(()) => {
                info!("Compensated {} after failed {}", first.describe(), operation_name);
                Err(second_error)
            }
            Err(compensation_error) => {
                error!(
                    "{} left a one-directional edge: {} succeeded, {} failed ({}), compensation failed ({})",
                    operation_name,
                    first.describe(),
                    second.describe(),
                    second_error,
                    compensation_error
                );
                self.stats.write().await.partial_failures += 1;
                Err(AppError::PartialWriteFailure {
                    completed: first.describe(),
                    failed: format!("{}: {}", second.describe(), second_error),
                })
            }
        }
    }

    async fn compensate(&self, compensation: &EdgeOperation) -> AppResult<()> {
        let attempts = self.config.max_compensation_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            self.stats.write().await.compensations_attempted += 1;
            match compensation.apply(self.store.as_ref()).await {
                Ok(()) => {
                    self.stats.write().await.compensations_successful += 1;
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Compensation {} attempt {}/{} failed: {}",
                        compensation.describe(),
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        let delay = self.config.compensation_retry_delay_ms * attempt as u64;
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::Internal("compensation never ran".to_string())))
    }

    pub async fn get_stats(&self) -> ConsistencyStats {
        self.stats.read().await.clone()
    }
}
