//! Push message handling: turns inbound payloads into local notifications.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::prefs::{PreferenceStore, PrefsError};

pub const CHANNEL_ID: &str = "medassist_notifications";
pub const CHANNEL_NAME: &str = "MedAssist Notifications";
pub const CHANNEL_DESCRIPTION: &str = "Notifications for MedAssist app including appointment reminders";
pub const NOTIFICATION_ID: u32 = 1001;

const DEFAULT_DATA_TITLE: &str = "MedAssist Notification";
const DEFAULT_NOTIFICATION_TITLE: &str = "MedAssist";
const DEFAULT_BODY: &str = "You have a new notification";
const DEFAULT_TYPE: &str = "general";
const NOTIFICATION_TYPE: &str = "notification";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NotificationPayload {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PushMessage {
    pub from: Option<String>,
    #[serde(default)]
    pub data: HashMap<String, String>,
    pub notification: Option<NotificationPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Importance {
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub importance: Importance,
}

/// Where tapping the notification leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepLink {
    pub target: &'static str,
    pub notification_type: String,
    pub clear_task: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalNotification {
    pub id: u32,
    pub channel: Channel,
    pub title: String,
    pub body: String,
    pub link: DeepLink,
    pub auto_cancel: bool,
    pub priority: Importance,
}

impl LocalNotification {
    fn new(title: String, body: String, notification_type: String) -> Self {
        LocalNotification {
            id: NOTIFICATION_ID,
            channel: Channel {
                id: CHANNEL_ID,
                name: CHANNEL_NAME,
                description: CHANNEL_DESCRIPTION,
                importance: Importance::High,
            },
            title,
            body,
            link: DeepLink { target: "main", notification_type, clear_task: true },
            auto_cancel: true,
            priority: Importance::High,
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn present(&self, notification: &LocalNotification);
}

/// Sink that writes notifications to the log.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn present(&self, notification: &LocalNotification) {
        info!(
            "[{}] {}: {} (type={})",
            notification.channel.id, notification.title, notification.body, notification.link.notification_type
        );
    }
}

pub struct NotificationReceiver {
    prefs: Arc<PreferenceStore>,
    sink: Box<dyn NotificationSink>,
}

/// Maps a push message to the notifications it should raise. A message may
/// carry both a data block and a notification block; each raises one.
pub fn on_message_received(message: &PushMessage) -> Vec<LocalNotification> {
    let mut out = Vec::new();

    if !message.data.is_empty() {
        debug!("Message data payload: {:?}", message.data);
        let field = |key: &str, default: &str| message.data.get(key).cloned().unwrap_or_else(|| default.to_string());
        out.push(LocalNotification::new(
            field("title", DEFAULT_DATA_TITLE),
            field("body", DEFAULT_BODY),
            field("type", DEFAULT_TYPE),
        ));
    }

    if let Some(payload) = &message.notification {
        out.push(LocalNotification::new(
            payload.title.clone().unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
            payload.body.clone().unwrap_or_else(|| DEFAULT_BODY.to_string()),
            NOTIFICATION_TYPE.to_string(),
        ));
    }

    out
}

impl NotificationReceiver {
    pub fn new(prefs: Arc<PreferenceStore>, sink: Box<dyn NotificationSink>) -> Self {
        NotificationReceiver { prefs, sink }
    }

    /// Presents the notifications for `message` unless the user opted out.
    /// Returns how many were presented.
    pub fn deliver(&self, message: &PushMessage) -> usize {
        debug!("Push message from: {:?}", message.from);
        let notifications = on_message_received(message);
        if !self.prefs.are_notifications_enabled() {
            info!("Notifications disabled, dropping {} notification(s)", notifications.len());
            return 0;
        }
        for notification in &notifications {
            self.sink.present(notification);
        }
        notifications.len()
    }

    /// Keeps the rotated token until server registration exists.
    pub fn on_new_token(&self, token: &str) -> Result<(), PrefsError> {
        info!("Refreshed push token: {}", token);
        self.prefs.set_push_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<LocalNotification>>>);

    impl NotificationSink for Recorder {
        fn present(&self, notification: &LocalNotification) {
            self.0.lock().push(notification.clone());
        }
    }

    fn message(json: &str) -> PushMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn data_payload_uses_defaults() {
        let out = on_message_received(&message(r#"{"data": {"type": "reminder"}}"#));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "MedAssist Notification");
        assert_eq!(out[0].body, "You have a new notification");
        assert_eq!(out[0].link.notification_type, "reminder");
        assert_eq!(out[0].channel.id, CHANNEL_ID);
        assert_eq!(out[0].channel.importance, Importance::High);
        assert_eq!(out[0].priority, Importance::High);
        assert!(out[0].link.clear_task);
    }

    #[test]
    fn both_blocks_raise_two_notifications() {
        let out = on_message_received(&message(
            r#"{"from": "server", "data": {"title": "T", "body": "B"}, "notification": {"body": "N"}}"#,
        ));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].link.notification_type, "general");
        assert_eq!(out[1].title, "MedAssist");
        assert_eq!(out[1].body, "N");
        assert_eq!(out[1].link.notification_type, "notification");
    }

    #[test]
    fn empty_message_raises_nothing() {
        assert!(on_message_received(&message("{}")).is_empty());
    }

    #[test]
    fn opted_out_user_sees_nothing() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        let recorder = Recorder::default();
        let receiver = NotificationReceiver::new(prefs.clone(), Box::new(recorder.clone()));
        let msg = message(r#"{"notification": {"title": "Hi"}}"#);

        assert_eq!(receiver.deliver(&msg), 1);
        prefs.set_notifications_enabled(false).unwrap();
        assert_eq!(receiver.deliver(&msg), 0);
        assert_eq!(recorder.0.lock().len(), 1);
    }

    #[test]
    fn rotated_token_is_kept() {
        let prefs = Arc::new(PreferenceStore::in_memory());
        let receiver = NotificationReceiver::new(prefs.clone(), Box::new(LogSink));
        receiver.on_new_token("tok-1").unwrap();
        assert_eq!(prefs.push_token().as_deref(), Some("tok-1"));
    }
}
