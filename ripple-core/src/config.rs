//! Source configuration.
//!
//! Every event source is built from a [`SourceOptions`] value. The options are
//! plain data and implement `serde`'s traits so a host application can keep
//! them next to the rest of its configuration.

use serde::{Deserialize, Serialize};

/// What a dispatcher does when `dispatch` is called while it is already
/// dispatching (a callback emitting on its own source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentrancyPolicy {
    /// Silently drop the nested value. Subscribers never see it.
    #[default]
    Drop,

    /// Queue the nested value and deliver it once the outer dispatch has
    /// finished, preserving emission order.
    Queue,
}

/// How a source produced from an upstream keeps itself alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Alive only while someone outside holds the source.
    Normal,

    /// Additionally keeps itself alive while it has at least one subscriber.
    #[default]
    Managed,
}

/// Options shared by all event sources.
///
/// # Example
///
/// ```rust
/// use ripple_core::config::{ReentrancyPolicy, SourceOptions};
///
/// let options = SourceOptions::new()
///     .replay_length(2)
///     .reentrancy(ReentrancyPolicy::Queue);
/// assert_eq!(options.replay_length, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    /// Number of most recent values replayed to each new subscriber.
    pub replay_length: usize,

    /// Behavior on re-entrant dispatch.
    pub reentrancy: ReentrancyPolicy,

    /// Self-retain behavior for producer-built sources.
    pub lifecycle: Lifecycle,
}

impl SourceOptions {
    /// Options with no replay, dropping re-entrant dispatches, managed lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replay_length(mut self, replay_length: usize) -> Self {
        self.replay_length = replay_length;
        self
    }

    pub fn reentrancy(mut self, reentrancy: ReentrancyPolicy) -> Self {
        self.reentrancy = reentrancy;
        self
    }

    pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}
