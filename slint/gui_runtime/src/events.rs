use serde::{Deserialize, Serialize};

use crate::handle::Handle;
use crate::model::{Bars, Configuration, Pointer, TouchAction, VolumeKey};

/// Asynchronous occurrence reported to the client. Carries handles only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    Create {
        aid: Handle,
    },
    Start {
        aid: Handle,
    },
    Resume {
        aid: Handle,
    },
    Pause {
        aid: Handle,
        finishing: bool,
    },
    Stop {
        aid: Handle,
        finishing: bool,
    },
    Destroy {
        aid: Handle,
        finishing: bool,
    },
    Config {
        aid: Handle,
        configuration: Configuration,
    },
    Airplane {
        active: bool,
    },
    Locale {
        locale: String,
    },
    ScreenOn {},
    ScreenOff {},
    Timezone {
        tz: String,
    },
    Back {
        aid: Handle,
    },
    Volume {
        aid: Handle,
        key: VolumeKey,
        released: bool,
    },
    Inset {
        aid: Handle,
        visible: Bars,
    },
    Pip {
        aid: Handle,
        pip: bool,
    },
    UserLeaveHint {
        aid: Handle,
    },
    RemoteClick {
        rid: Handle,
        id: Handle,
    },
    Notification {
        id: Handle,
    },
    NotificationDismissed {
        id: Handle,
    },
    NotificationAction {
        id: Handle,
        action: i32,
    },
    Click {
        aid: Handle,
        id: Handle,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        set: Option<bool>,
    },
    LongClick {
        aid: Handle,
        id: Handle,
    },
    FocusChange {
        aid: Handle,
        id: Handle,
        focus: bool,
    },
    Text {
        aid: Handle,
        id: Handle,
        text: String,
    },
    Touch {
        aid: Handle,
        id: Handle,
        action: TouchAction,
        pointers: Vec<Pointer>,
        time: u64,
    },
    OverlayScale {
        aid: Handle,
        span: f32,
    },
    Refresh {
        aid: Handle,
        id: Handle,
    },
    Selected {
        aid: Handle,
        id: Handle,
        selected: i32,
    },
}

impl Event {
    /// The activity or overlay the event is about, if any.
    pub fn aid(&self) -> Option<Handle> {
        match self {
            Self::Create { aid }
            | Self::Start { aid }
            | Self::Resume { aid }
            | Self::Pause { aid, .. }
            | Self::Stop { aid, .. }
            | Self::Destroy { aid, .. }
            | Self::Config { aid, .. }
            | Self::Back { aid }
            | Self::Volume { aid, .. }
            | Self::Inset { aid, .. }
            | Self::Pip { aid, .. }
            | Self::UserLeaveHint { aid }
            | Self::Click { aid, .. }
            | Self::LongClick { aid, .. }
            | Self::FocusChange { aid, .. }
            | Self::Text { aid, .. }
            | Self::Touch { aid, .. }
            | Self::OverlayScale { aid, .. }
            | Self::Refresh { aid, .. }
            | Self::Selected { aid, .. } => Some(*aid),
            Self::Airplane { .. }
            | Self::Locale { .. }
            | Self::ScreenOn {}
            | Self::ScreenOff {}
            | Self::Timezone { .. }
            | Self::RemoteClick { .. }
            | Self::Notification { .. }
            | Self::NotificationDismissed { .. }
            | Self::NotificationAction { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_use_camel_case_tags_and_fields() {
        let value = serde_json::to_value(Event::UserLeaveHint { aid: 2 }).expect("encode event");
        assert_eq!(value, json!({"userLeaveHint": {"aid": 2}}));

        let value = serde_json::to_value(Event::ScreenOff {}).expect("encode event");
        assert_eq!(value, json!({"screenOff": {}}));
    }

    #[test]
    fn click_omits_unset_state() {
        let plain = serde_json::to_value(Event::Click {
            aid: 0,
            id: 3,
            set: None,
        })
        .expect("encode click");
        assert_eq!(plain, json!({"click": {"aid": 0, "id": 3}}));

        let checked = serde_json::to_value(Event::Click {
            aid: 0,
            id: 3,
            set: Some(true),
        })
        .expect("encode click");
        assert_eq!(checked, json!({"click": {"aid": 0, "id": 3, "set": true}}));
    }

    #[test]
    fn volume_event_names_key() {
        let value = serde_json::to_value(Event::Volume {
            aid: 1,
            key: VolumeKey::VolumeDown,
            released: true,
        })
        .expect("encode volume");
        assert_eq!(
            value,
            json!({"volume": {"aid": 1, "key": "volumeDown", "released": true}})
        );
    }

    #[test]
    fn aid_is_reported_for_activity_events_only() {
        assert_eq!(
            Event::Pause {
                aid: 4,
                finishing: false
            }
            .aid(),
            Some(4)
        );
        assert_eq!(Event::Notification { id: 4 }.aid(), None);
    }
}
