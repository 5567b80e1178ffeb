//! Notification events and routing.
//!
//! The notification side only emits typed [`NotificationEvent`]s into a
//! channel. The [`Dispatcher`] drains that channel and decides what the
//! application should show; it never touches a UI or navigation API.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use super::scheduler::{Notification, NotificationId};
use crate::alarm::AlarmId;
use crate::challenge::{ChallengePolicy, DismissSession};
use crate::error::{CoreError, Result};
use crate::signal::SignalOutput;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// The notification reached the device.
    Delivered { notification: Notification },
    /// The user tapped it.
    Tapped { notification: Notification },
}

impl NotificationEvent {
    pub fn notification(&self) -> &Notification {
        match self {
            NotificationEvent::Delivered { notification }
            | NotificationEvent::Tapped { notification } => notification,
        }
    }
}

/// Where the application should go in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Home,
    Challenge { alarm_id: AlarmId },
}

/// A routing decision together with the notification that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub route: Route,
    pub notification: Notification,
}

/// Sending half held by the notification collaborator.
#[derive(Debug, Clone)]
pub struct NotificationSender(UnboundedSender<NotificationEvent>);

impl NotificationSender {
    pub fn send(&self, event: NotificationEvent) -> Result<()> {
        self.0
            .send(event)
            .map_err(|_| CoreError::Scheduler("notification dispatcher is gone".into()))
    }
}

/// Create a connected sender/dispatcher pair.
pub fn notification_channel(policy: ChallengePolicy) -> (NotificationSender, Dispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NotificationSender(tx), Dispatcher::new(rx, policy))
}

/// How many recent challenge notifications are remembered for dedup.
pub const HANDLED_WINDOW: usize = 64;

pub struct Dispatcher {
    rx: UnboundedReceiver<NotificationEvent>,
    policy: ChallengePolicy,
    /// Recent notifications that already opened a challenge. Delivery is
    /// at-least-once and a tap usually follows a delivery.
    handled: HashSet<NotificationId>,
    /// Insertion order of `handled`, oldest first.
    handled_order: VecDeque<NotificationId>,
}

impl Dispatcher {
    fn new(rx: UnboundedReceiver<NotificationEvent>, policy: ChallengePolicy) -> Self {
        Self {
            rx,
            policy,
            handled: HashSet::new(),
            handled_order: VecDeque::new(),
        }
    }

    fn remember(&mut self, id: NotificationId) -> bool {
        if !self.handled.insert(id) {
            return false;
        }
        self.handled_order.push_back(id);
        while self.handled_order.len() > HANDLED_WINDOW {
            if let Some(oldest) = self.handled_order.pop_front() {
                self.handled.remove(&oldest);
            }
        }
        true
    }

    pub fn policy(&self) -> &ChallengePolicy {
        &self.policy
    }

    /// Decide the route for one event. Returns `None` for a duplicate of a
    /// notification that already opened a challenge.
    pub fn route(&mut self, event: NotificationEvent) -> Option<Dispatch> {
        let notification = match event {
            NotificationEvent::Delivered { notification }
            | NotificationEvent::Tapped { notification } => notification,
        };

        if !notification.content.open_challenge {
            return Some(Dispatch {
                route: Route::Home,
                notification,
            });
        }
        if !self.remember(notification.id) {
            tracing::debug!(notification_id = %notification.id, "duplicate notification ignored");
            return None;
        }
        tracing::info!(alarm_id = %notification.alarm_id, "alarm notification received");
        Some(Dispatch {
            route: Route::Challenge {
                alarm_id: notification.alarm_id,
            },
            notification,
        })
    }

    /// Next routing decision from the channel, if any is ready.
    pub fn poll(&mut self) -> Option<Dispatch> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(dispatch) = self.route(event) {
                        return Some(dispatch);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Drain every ready decision.
    pub fn poll_all(&mut self) -> Vec<Dispatch> {
        std::iter::from_fn(|| self.poll()).collect()
    }

    /// Fresh, not yet activated session for a challenge route.
    pub fn session_for<S: SignalOutput>(&self, dispatch: &Dispatch, output: S) -> Option<DismissSession<S>> {
        match dispatch.route {
            Route::Challenge { alarm_id } => {
                Some(DismissSession::new(alarm_id, self.policy.clone(), output))
            }
            Route::Home => None,
        }
    }
}
