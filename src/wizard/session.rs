use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::events::EntryField;
use super::validation::MessageKey;
use crate::services::BusyIndicator;

/// Step indexes tracked by the controller. `current` is 0 before the
/// wizard has loaded its first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WizardSession {
    pub current: u8,
    pub next: u8,
    pub previous: Option<u8>,
}

impl WizardSession {
    pub fn is_started(&self) -> bool {
        self.current > 0
    }

    pub(crate) fn commit(&mut self, from: Option<u8>, to: u8) {
        if from.is_some() {
            self.previous = from;
        }
        self.current = to;
        self.next = to.saturating_add(1);
    }
}

/// Progress-tab state for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorState {
    #[default]
    Normal,
    Active,
    Visited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient toast shown to the policy holder.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub text: String,
    pub raised_at: DateTime<Utc>,
}

/// Panels toggled by the selections on the data-entry steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Panels {
    pub partial_amounts: bool,
    pub enter_new_account: bool,
    pub saved_account: bool,
}

/// Everything a renderer needs to draw the wizard.
///
/// Notifications stay queued until the renderer drains them with
/// [`ViewState::take_notifications`] or removes one with [`ViewState::dismiss`].
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub page_title: String,
    pub banner_text: Option<String>,
    pub indicators: BTreeMap<u8, IndicatorState>,
    pub chrome_visible: bool,
    chrome_locked: bool,
    pub panels: Panels,
    pub confirmed_draft_amount: String,
    pub terms_checked: bool,
    pub validation_messages: Vec<MessageKey>,
    pub field_messages: BTreeMap<EntryField, MessageKey>,
    pub notifications: Vec<Notification>,
    pub delete_modal_open: bool,
    pub loading: BusyIndicator,
    pub exit_url: Option<String>,
}

impl ViewState {
    /// Queues a notification. A notification with the same level and text
    /// that is still pending is not queued twice; its id is returned instead.
    /// Renderers drain the queue with [`ViewState::take_notifications`].
    pub fn notify(&mut self, level: NotificationLevel, text: impl Into<String>) -> Uuid {
        let text = text.into();
        if let Some(pending) = self
            .notifications
            .iter()
            .find(|notification| notification.level == level && notification.text == text)
        {
            return pending.id;
        }
        let id = Uuid::new_v4();
        self.notifications.push(Notification {
            id,
            level,
            text,
            raised_at: Utc::now(),
        });
        id
    }

    pub fn dismiss(&mut self, id: Uuid) {
        self.notifications.retain(|notification| notification.id != id);
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn indicator(&self, index: u8) -> IndicatorState {
        self.indicators.get(&index).copied().unwrap_or_default()
    }

    pub fn set_indicator(&mut self, index: u8, state: IndicatorState) {
        self.indicators.insert(index, state);
    }

    /// Hides header, progress bar and labels for good.
    pub fn lock_chrome_hidden(&mut self) {
        self.chrome_locked = true;
        self.chrome_visible = false;
    }

    pub fn show_chrome(&mut self) {
        self.chrome_visible = !self.chrome_locked;
    }

    pub fn chrome_locked(&self) -> bool {
        self.chrome_locked
    }

    pub fn has_message(&self, key: MessageKey) -> bool {
        self.validation_messages.contains(&key)
    }
}
