//! Event emission and the listener that turns platform callbacks into
//! client events.

use std::sync::Arc;
use std::sync::mpsc::Sender;

use crate::events::Event;
use crate::handle::{Handle, NO_HANDLE};
use crate::logger::Logger;
use crate::model::{Bars, Configuration, LifecyclePhase, TouchSample, View, VolumeKey};
use crate::platform::{LifecycleListener, TouchRoute};
use crate::protocol::Outbound;
use crate::registry::Registries;

/// Producer side of the event stream. Never blocks; events are written in
/// the order they were emitted.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: Sender<Outbound>,
}

impl EventEmitter {
    pub fn new(tx: Sender<Outbound>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: Event) {
        if self.tx.send(Outbound::Event(event)).is_err() {
            tracing::debug!("event writer stopped, dropping event");
        }
    }

    /// Asks the writer to stop once everything queued so far is written.
    pub(crate) fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

/// Reconciles the registries with platform-initiated changes and reports
/// them. Callbacks naming resources of another session are ignored.
pub struct SessionListener {
    registries: Arc<Registries>,
    emitter: EventEmitter,
    logger: Arc<Logger>,
}

impl SessionListener {
    pub fn new(registries: Arc<Registries>, emitter: EventEmitter, logger: Arc<Logger>) -> Self {
        Self {
            registries,
            emitter,
            logger,
        }
    }

    fn set_phase(&self, aid: Handle, phase: LifecyclePhase, finishing: Option<bool>) -> bool {
        self.registries
            .activities
            .with_mut(aid, |activity| {
                activity.phase = phase;
                if let Some(finishing) = finishing {
                    activity.finishing = finishing;
                }
            })
            .is_ok()
    }

    fn emit_for_activity(&self, aid: Handle, event: Event) {
        if self.registries.activities.contains(aid) {
            self.emitter.emit(event);
        }
    }

    /// Runs `f` on a view owned by `aid`; `None` if the view is not ours.
    fn with_view<R>(&self, aid: Handle, id: Handle, f: impl FnOnce(&mut View) -> R) -> Option<R> {
        match self.registries.views.owner_of(id) {
            Ok(Some(owner)) if owner == aid => self.registries.views.with_mut(id, f).ok(),
            _ => None,
        }
    }

    fn forget_activity(&self, aid: Handle) {
        let Ok(activity) = self.registries.activities.remove(aid) else {
            return;
        };

        let views = self.registries.remove_views_of(aid);
        self.registries.release(aid);

        let task_empty = self
            .registries
            .tasks
            .with_mut(activity.task, |task| {
                task.activities.retain(|member| *member != aid);
                task.activities.is_empty()
            })
            .unwrap_or(false);
        if task_empty && self.registries.tasks.remove(activity.task).is_ok() {
            self.registries.release(activity.task);
        }

        self.logger.log(
            2,
            "activity",
            format!("activity {aid} destroyed, dropped {} views", views.len()),
        );
    }
}

impl LifecycleListener for SessionListener {
    fn activity_created(&self, aid: Handle) {
        if self.set_phase(aid, LifecyclePhase::Created, None) {
            self.emitter.emit(Event::Create { aid });
        }
    }

    fn activity_started(&self, aid: Handle) {
        if self.set_phase(aid, LifecyclePhase::Started, None) {
            self.emitter.emit(Event::Start { aid });
        }
    }

    fn activity_resumed(&self, aid: Handle) {
        if self.set_phase(aid, LifecyclePhase::Resumed, None) {
            self.emitter.emit(Event::Resume { aid });
        }
    }

    fn activity_paused(&self, aid: Handle, finishing: bool) {
        if self.set_phase(aid, LifecyclePhase::Paused, Some(finishing)) {
            self.emitter.emit(Event::Pause { aid, finishing });
        }
    }

    fn activity_stopped(&self, aid: Handle, finishing: bool) {
        if self.set_phase(aid, LifecyclePhase::Stopped, Some(finishing)) {
            self.emitter.emit(Event::Stop { aid, finishing });
        }
    }

    fn activity_destroyed(&self, aid: Handle, finishing: bool) {
        if !self.registries.activities.contains(aid) {
            return;
        }
        self.forget_activity(aid);
        self.emitter.emit(Event::Destroy { aid, finishing });
    }

    fn configuration_changed(&self, aid: Handle, configuration: &Configuration) {
        self.emit_for_activity(
            aid,
            Event::Config {
                aid,
                configuration: configuration.clone(),
            },
        );
    }

    fn back_pressed(&self, aid: Handle) -> bool {
        let intercept = self
            .registries
            .activities
            .with(aid, |activity| activity.intercept_back)
            .unwrap_or(false);
        if intercept {
            self.emitter.emit(Event::Back { aid });
        }
        intercept
    }

    fn volume_key(&self, aid: Handle, key: VolumeKey, down: bool) -> bool {
        let intercept = self
            .registries
            .activities
            .with(aid, |activity| activity.intercepts_volume(key))
            .unwrap_or(false);
        if intercept {
            self.emitter.emit(Event::Volume {
                aid,
                key,
                released: !down,
            });
        }
        intercept
    }

    fn insets_changed(&self, aid: Handle, visible: Bars) {
        self.emit_for_activity(aid, Event::Inset { aid, visible });
    }

    fn pip_changed(&self, aid: Handle, pip: bool) {
        let known = self
            .registries
            .activities
            .with_mut(aid, |activity| activity.pip = pip)
            .is_ok();
        if known {
            self.emitter.emit(Event::Pip { aid, pip });
        }
    }

    fn user_leave_hint(&self, aid: Handle) {
        self.emit_for_activity(aid, Event::UserLeaveHint { aid });
    }

    fn airplane_mode_changed(&self, active: bool) {
        self.emitter.emit(Event::Airplane { active });
    }

    fn locale_changed(&self, locale: &str) {
        self.emitter.emit(Event::Locale {
            locale: locale.to_string(),
        });
    }

    fn screen_changed(&self, on: bool) {
        self.emitter.emit(if on {
            Event::ScreenOn {}
        } else {
            Event::ScreenOff {}
        });
    }

    fn timezone_changed(&self, tz: &str) {
        self.emitter.emit(Event::Timezone { tz: tz.to_string() });
    }

    fn remote_clicked(&self, rid: Handle, id: Handle) {
        if self.registries.remote_layouts.contains(rid) {
            self.emitter.emit(Event::RemoteClick { rid, id });
        }
    }

    fn notification_clicked(&self, id: Handle) {
        if self.registries.notifications.contains(id) {
            self.emitter.emit(Event::Notification { id });
        }
    }

    fn notification_dismissed(&self, id: Handle) {
        if self.registries.notifications.remove(id).is_ok() {
            self.registries.release(id);
            self.emitter.emit(Event::NotificationDismissed { id });
        }
    }

    fn notification_action(&self, id: Handle, action: i32) {
        if self.registries.notifications.contains(id) {
            self.emitter.emit(Event::NotificationAction { id, action });
        }
    }

    fn view_clicked(&self, aid: Handle, id: Handle, checked: Option<bool>) {
        let send = self.with_view(aid, id, |view| {
            if let Some(checked) = checked {
                view.checked = checked;
            }
            view.events.click
        });
        if send == Some(true) {
            self.emitter.emit(Event::Click {
                aid,
                id,
                set: checked,
            });
        }
    }

    fn view_long_clicked(&self, aid: Handle, id: Handle) {
        if self.with_view(aid, id, |view| view.events.long_click) == Some(true) {
            self.emitter.emit(Event::LongClick { aid, id });
        }
    }

    fn view_focus_changed(&self, aid: Handle, id: Handle, focus: bool) {
        if self.with_view(aid, id, |view| view.events.focus_change) == Some(true) {
            self.emitter.emit(Event::FocusChange { aid, id, focus });
        }
    }

    fn view_text_changed(&self, aid: Handle, id: Handle, text: &str) {
        let send = self.with_view(aid, id, |view| {
            view.text = text.to_string();
            view.events.text
        });
        if send == Some(true) {
            self.emitter.emit(Event::Text {
                aid,
                id,
                text: text.to_string(),
            });
        }
    }

    fn view_touched(&self, aid: Handle, id: Handle, touch: &TouchSample) {
        if self.with_view(aid, id, |view| view.events.touch) == Some(true) {
            self.emitter.emit(Event::Touch {
                aid,
                id,
                action: touch.action,
                pointers: touch.pointers.clone(),
                time: touch.time,
            });
        }
    }

    fn view_refreshed(&self, aid: Handle, id: Handle) {
        if self.with_view(aid, id, |_| ()).is_some() {
            self.emitter.emit(Event::Refresh { aid, id });
        }
    }

    fn view_selected(&self, aid: Handle, id: Handle, selected: i32) {
        if self
            .with_view(aid, id, |view| view.selected = Some(selected))
            .is_some()
        {
            self.emitter.emit(Event::Selected { aid, id, selected });
        }
    }

    fn overlay_touch(&self, aid: Handle, touch: &TouchSample) -> TouchRoute {
        let Ok(overlay) = self.registries.overlays.get(aid) else {
            return TouchRoute::PassThrough;
        };

        let inside = touch
            .pointers
            .first()
            .is_some_and(|pointer| overlay.bounds.contains(pointer.x, pointer.y));
        if !inside {
            return TouchRoute::PassThrough;
        }

        if overlay.send_touch {
            self.emitter.emit(Event::Touch {
                aid,
                id: NO_HANDLE,
                action: touch.action,
                pointers: touch.pointers.clone(),
                time: touch.time,
            });
        }
        TouchRoute::Intercept
    }

    fn overlay_scale(&self, aid: Handle, span: f32) {
        let send = self
            .registries
            .overlays
            .with(aid, |overlay| overlay.send_touch)
            .unwrap_or(false);
        if send {
            self.emitter.emit(Event::OverlayScale { aid, span });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Activity, Bounds, Overlay, Pointer, Task, TouchAction, ViewKind};
    use std::sync::mpsc::{self, Receiver};

    fn listener() -> (SessionListener, Arc<Registries>, Receiver<Outbound>) {
        let registries = Arc::new(Registries::default());
        let (tx, rx) = mpsc::channel();
        let listener = SessionListener::new(
            registries.clone(),
            EventEmitter::new(tx),
            Arc::new(Logger::new(0)),
        );
        (listener, registries, rx)
    }

    fn events(rx: &Receiver<Outbound>) -> Vec<Event> {
        rx.try_iter()
            .filter_map(|outbound| match outbound {
                Outbound::Event(event) => Some(event),
                Outbound::Close => None,
            })
            .collect()
    }

    fn activity(registries: &Registries) -> (Handle, Handle) {
        let aid = registries.allocate().expect("aid");
        let tid = registries.allocate().expect("tid");
        registries.activities.insert(aid, Activity::new(tid));
        registries.tasks.insert(
            tid,
            Task {
                activities: vec![aid],
            },
        );
        (aid, tid)
    }

    fn touch_at(x: i32, y: i32) -> TouchSample {
        TouchSample {
            action: TouchAction::Down,
            pointers: vec![Pointer { id: 0, x, y }],
            time: 5,
        }
    }

    #[test]
    fn lifecycle_callbacks_for_unknown_activities_are_ignored() {
        let (listener, _registries, rx) = listener();
        listener.activity_created(3);
        listener.activity_destroyed(3, true);
        assert!(events(&rx).is_empty());
    }

    #[test]
    fn destroy_removes_activity_views_and_empty_task() {
        let (listener, registries, rx) = listener();
        let (aid, tid) = activity(&registries);
        let view = registries.allocate().expect("view");
        registries
            .views
            .insert_owned(view, aid, View::new(ViewKind::TextView, None));

        listener.activity_paused(aid, true);
        listener.activity_destroyed(aid, true);

        assert!(!registries.activities.contains(aid));
        assert!(!registries.tasks.contains(tid));
        assert!(!registries.views.contains(view));
        assert_eq!(registries.allocator.live_count(), 0);
        assert_eq!(
            events(&rx),
            vec![
                Event::Pause {
                    aid,
                    finishing: true
                },
                Event::Destroy {
                    aid,
                    finishing: true
                },
            ]
        );
    }

    #[test]
    fn back_is_reported_only_when_intercepted() {
        let (listener, registries, rx) = listener();
        let (aid, _) = activity(&registries);

        assert!(!listener.back_pressed(aid));
        registries
            .activities
            .with_mut(aid, |activity| activity.intercept_back = true)
            .expect("activity");
        assert!(listener.back_pressed(aid));
        assert_eq!(events(&rx), vec![Event::Back { aid }]);
    }

    #[test]
    fn text_changes_update_model_but_emit_only_when_subscribed() {
        let (listener, registries, rx) = listener();
        let (aid, _) = activity(&registries);
        let id = registries.allocate().expect("view");
        registries
            .views
            .insert_owned(id, aid, View::new(ViewKind::EditText, None));

        listener.view_text_changed(aid, id, "abc");
        assert!(events(&rx).is_empty());
        assert_eq!(
            registries.views.with(id, |view| view.text.clone()),
            Ok("abc".to_string())
        );

        registries
            .views
            .with_mut(id, |view| view.events.text = true)
            .expect("view");
        listener.view_text_changed(aid, id, "abcd");
        assert_eq!(
            events(&rx),
            vec![Event::Text {
                aid,
                id,
                text: "abcd".to_string()
            }]
        );
    }

    #[test]
    fn view_events_require_matching_owner() {
        let (listener, registries, rx) = listener();
        let (aid, _) = activity(&registries);
        let id = registries.allocate().expect("view");
        registries
            .views
            .insert_owned(id, aid, View::new(ViewKind::Button, None));

        listener.view_clicked(aid + 100, id, None);
        listener.view_clicked(aid, id, None);
        assert_eq!(
            events(&rx),
            vec![Event::Click {
                aid,
                id,
                set: None
            }]
        );
    }

    #[test]
    fn overlay_touch_routes_by_bounds() {
        let (listener, registries, rx) = listener();
        let aid = registries.allocate().expect("overlay");
        registries.overlays.insert(
            aid,
            Overlay {
                send_touch: true,
                bounds: Bounds {
                    x: 0,
                    y: 0,
                    width: 100,
                    height: 50,
                },
            },
        );

        assert_eq!(
            listener.overlay_touch(aid, &touch_at(10, 10)),
            TouchRoute::Intercept
        );
        assert_eq!(
            listener.overlay_touch(aid, &touch_at(10, 60)),
            TouchRoute::PassThrough
        );

        match events(&rx).as_slice() {
            [Event::Touch { aid: touched, id, .. }] => {
                assert_eq!(*touched, aid);
                assert_eq!(*id, NO_HANDLE);
            }
            other => panic!("expected one touch event, got {other:?}"),
        }
    }

    #[test]
    fn overlay_touch_without_subscription_is_silent() {
        let (listener, registries, rx) = listener();
        let aid = registries.allocate().expect("overlay");
        registries.overlays.insert(
            aid,
            Overlay {
                send_touch: false,
                bounds: Bounds {
                    x: 0,
                    y: 0,
                    width: 10,
                    height: 10,
                },
            },
        );

        assert_eq!(
            listener.overlay_touch(aid, &touch_at(1, 1)),
            TouchRoute::Intercept
        );
        listener.overlay_scale(aid, 2.0);
        assert!(events(&rx).is_empty());
    }

    #[test]
    fn dismissed_notification_is_forgotten() {
        let (listener, registries, rx) = listener();
        let id = registries.allocate().expect("notification");
        registries.notifications.insert(
            id,
            crate::model::Notification {
                channel: "c".to_string(),
                importance: Default::default(),
                ongoing: false,
                title: String::new(),
                content: String::new(),
                large_text: String::new(),
                large_image: Vec::new(),
                large_image_as_thumbnail: false,
                icon: Vec::new(),
                alert_once: false,
                show_timestamp: false,
                timestamp: 0,
                actions: Vec::new(),
                layout: None,
                expanded_layout: None,
                hud_layout: None,
            },
        );

        listener.notification_dismissed(id);
        listener.notification_clicked(id);
        assert!(!registries.notifications.contains(id));
        assert_eq!(events(&rx), vec![Event::NotificationDismissed { id }]);
    }
}
