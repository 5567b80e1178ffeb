mod config;
mod dispatch;
mod scheduler;

pub use config::{
    AlarmChannel, AlertText, Importance, LockscreenVisibility, NotificationHandlerConfig,
    Presentation,
};
pub use dispatch::{
    notification_channel, Dispatch, Dispatcher, NotificationEvent, NotificationSender, Route,
};
pub use scheduler::{
    MemoryScheduler, Notification, NotificationContent, NotificationId, NotificationScheduler,
};
