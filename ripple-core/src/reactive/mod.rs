//! Event Dispatch Core
//!
//! This module implements the publish/subscribe layer that observable
//! collections emit their changesets through.
//!
//! # Layers
//!
//! ## Dispatcher
//!
//! A [`Dispatcher`] maps subscription ids to callbacks and delivers values to
//! them. A dispatch issued while another is running is dropped (or queued,
//! see [`ReentrancyPolicy`](crate::config::ReentrancyPolicy)).
//!
//! ## Event sources
//!
//! An [`EventSource`] puts a [`ReplayBuffer`] in front of a dispatcher: new
//! subscribers first receive the last `replay_length` values, then live ones.
//!
//! ## Managed sources
//!
//! A [`ManagedSource`] is fed by a producer through a weak [`Sink`] and keeps
//! itself alive exactly while it has subscribers, tearing down its upstream
//! when it goes away. Derived sources (see
//! [`ObservableExt`](crate::collection::ObservableExt)) are built this way.
//!
//! ## Subscriptions
//!
//! Every registration returns a [`Subscription`]. Disposing it, or dropping
//! it, removes the callback; doing so from inside a callback is safe.

mod buffer;
mod dispatcher;
mod managed;
mod observable;
mod property;
mod source;
mod subscription;

pub use buffer::ReplayBuffer;
pub use dispatcher::Dispatcher;
pub use managed::{ManagedSource, Sink, WeakManagedSource};
pub use observable::Observable;
pub use property::Property;
pub use source::EventSource;
pub use subscription::{DisposeBag, Subscription, SubscriptionId};
