//! Notification presentation settings.
//!
//! Handed to the scheduler when it is constructed instead of being registered
//! as process-wide state.

use serde::{Deserialize, Serialize};

use super::scheduler::Notification;

/// Ordered from least to most intrusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Min,
    Low,
    Default,
    High,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockscreenVisibility {
    Public,
    Private,
    Secret,
}

/// The platform channel alarm notifications are posted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmChannel {
    #[serde(default = "default_channel_id")]
    pub id: String,
    #[serde(default = "default_channel_name")]
    pub name: String,
    #[serde(default = "default_importance")]
    pub importance: Importance,
    #[serde(default = "default_sound")]
    pub sound: String,
    #[serde(default = "default_vibration_pattern")]
    pub vibration_pattern_ms: Vec<u64>,
    #[serde(default = "default_visibility")]
    pub lockscreen_visibility: LockscreenVisibility,
}

/// How a delivered notification is surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationHandlerConfig {
    #[serde(default = "default_true")]
    pub show_alert: bool,
    #[serde(default = "default_true")]
    pub play_sound: bool,
    #[serde(default)]
    pub set_badge: bool,
    #[serde(default = "default_true")]
    pub show_banner: bool,
    #[serde(default = "default_true")]
    pub show_list: bool,
    #[serde(default)]
    pub channel: AlarmChannel,
}

fn default_true() -> bool {
    true
}
fn default_channel_id() -> String {
    "alarms".into()
}
fn default_channel_name() -> String {
    "Alarms".into()
}
fn default_importance() -> Importance {
    Importance::Max
}
fn default_sound() -> String {
    "default".into()
}
fn default_vibration_pattern() -> Vec<u64> {
    vec![250, 250, 500]
}
fn default_visibility() -> LockscreenVisibility {
    LockscreenVisibility::Public
}

impl Default for AlarmChannel {
    fn default() -> Self {
        Self {
            id: default_channel_id(),
            name: default_channel_name(),
            importance: default_importance(),
            sound: default_sound(),
            vibration_pattern_ms: default_vibration_pattern(),
            lockscreen_visibility: default_visibility(),
        }
    }
}

impl Default for NotificationHandlerConfig {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: false,
            show_banner: true,
            show_list: true,
            channel: AlarmChannel::default(),
        }
    }
}

/// Text an alert may show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertText {
    pub title: String,
    /// Hidden unless the channel is publicly visible.
    pub body: Option<String>,
}

/// How one delivered notification should be surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    /// `None` when alerts are switched off.
    pub alert: Option<AlertText>,
    /// Heads-up banner; needs alerts on and a channel of at least `High`
    /// importance.
    pub banner: bool,
    /// Keep an entry in the notification list.
    pub list: bool,
    pub badge: Option<usize>,
    pub sound: Option<String>,
    pub vibration_pattern_ms: Vec<u64>,
}

impl NotificationHandlerConfig {
    /// Resolve how `notification` is shown. `outstanding` is the number of
    /// delivered notifications not yet dealt with, used for the badge.
    pub fn present(&self, notification: &Notification, outstanding: usize) -> Presentation {
        let channel = &self.channel;
        let alert = self.show_alert.then(|| AlertText {
            title: match channel.lockscreen_visibility {
                LockscreenVisibility::Secret => channel.name.clone(),
                _ => notification.content.title.clone(),
            },
            body: (channel.lockscreen_visibility == LockscreenVisibility::Public)
                .then(|| notification.content.body.clone()),
        });
        let audible = self.play_sound && channel.importance >= Importance::Default;
        Presentation {
            banner: alert.is_some() && self.show_banner && channel.importance >= Importance::High,
            alert,
            list: self.show_list,
            badge: self.set_badge.then_some(outstanding),
            sound: if audible {
                notification.content.sound.as_ref().map(|_| channel.sound.clone())
            } else {
                None
            },
            vibration_pattern_ms: channel.vibration_pattern_ms.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmSpec;
    use chrono::Utc;

    fn ringing() -> Notification {
        let alarm = AlarmSpec::new(7, 0).unwrap().with_label("Gym");
        Notification::for_alarm(&alarm, Utc::now())
    }

    #[test]
    fn defaults_show_everything_but_the_badge() {
        let p = NotificationHandlerConfig::default().present(&ringing(), 2);
        let alert = p.alert.unwrap();
        assert_eq!(alert.title, "WAKE UP! Gym");
        assert_eq!(alert.body.as_deref(), Some("Solve the math to stop the alarm"));
        assert!(p.banner);
        assert!(p.list);
        assert_eq!(p.badge, None);
        assert_eq!(p.sound.as_deref(), Some("default"));
        assert_eq!(p.vibration_pattern_ms, vec![250, 250, 500]);
    }

    #[test]
    fn alerts_off_suppresses_banner() {
        let config = NotificationHandlerConfig {
            show_alert: false,
            set_badge: true,
            ..NotificationHandlerConfig::default()
        };
        let p = config.present(&ringing(), 3);
        assert!(p.alert.is_none());
        assert!(!p.banner);
        assert_eq!(p.badge, Some(3));
    }

    #[test]
    fn low_importance_channel_is_quiet() {
        let mut config = NotificationHandlerConfig::default();
        config.channel.importance = Importance::Low;
        let p = config.present(&ringing(), 1);
        assert!(p.alert.is_some());
        assert!(!p.banner);
        assert!(p.sound.is_none());
    }

    #[test]
    fn lockscreen_visibility_redacts_text() {
        let mut config = NotificationHandlerConfig::default();
        config.channel.lockscreen_visibility = LockscreenVisibility::Private;
        let alert = config.present(&ringing(), 1).alert.unwrap();
        assert_eq!(alert.title, "WAKE UP! Gym");
        assert!(alert.body.is_none());

        config.channel.lockscreen_visibility = LockscreenVisibility::Secret;
        let alert = config.present(&ringing(), 1).alert.unwrap();
        assert_eq!(alert.title, "Alarms");
    }

    #[test]
    fn play_sound_off_is_silent() {
        let config = NotificationHandlerConfig {
            play_sound: false,
            ..NotificationHandlerConfig::default()
        };
        assert!(config.present(&ringing(), 1).sound.is_none());
    }
}
