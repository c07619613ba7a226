//! An in-memory [`Platform`] that keeps widget state in tables and simulates
//! lifecycle transitions synchronously. Used by `gui_host` and the tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::PlatformError;
use crate::handle::Handle;
use crate::model::{
    Bounds, Configuration, HardwareBufferSpec, Notification, NotificationChannel, RemoteLayout,
    ViewKind, ViewSize,
};
use crate::platform::{
    ActivityCommand, ActivityOptions, LifecycleListener, ListenerToken, NotificationLayouts,
    Platform, RawHardwareBuffer, ViewMutation, WidgetSpec,
};
use crate::registry::lock;

pub const HEADLESS_VERSION_CODE: i32 = 1;

/// Where new overlays are placed.
pub const OVERLAY_BOUNDS: Bounds = Bounds {
    x: 0,
    y: 0,
    width: 400,
    height: 300,
};

#[derive(Debug, Clone)]
pub struct HeadlessActivity {
    pub tid: Handle,
    pub options: ActivityOptions,
    pub commands: Vec<ActivityCommand>,
}

#[derive(Debug, Clone)]
pub struct HeadlessView {
    pub kind: ViewKind,
    pub parent: Option<Handle>,
    pub text: String,
    pub size: (i32, i32),
    pub scroll: (i32, i32),
    pub surface_buffer: Option<u64>,
    pub mutations: Vec<&'static str>,
}

/// Platform calls a test can interpose on with
/// [`HeadlessPlatform::intercept_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessCall {
    AddListener,
    PostNotification,
}

type Hook = Box<dyn FnOnce(&HeadlessPlatform) + Send>;

#[derive(Debug, Default)]
struct State {
    activities: BTreeMap<Handle, HeadlessActivity>,
    overlays: BTreeMap<Handle, Bounds>,
    views: BTreeMap<(Handle, Handle), HeadlessView>,
    hardware_buffers: HashSet<u64>,
    widgets: BTreeMap<String, RemoteLayout>,
    channels: BTreeMap<String, NotificationChannel>,
    notifications: BTreeMap<Handle, Notification>,
    toasts: Vec<String>,
    finished_activities: Vec<Handle>,
    destroyed_overlays: Vec<Handle>,
    cancelled_notifications: Vec<Handle>,
    released_hardware_buffers: usize,
    listener_removals: usize,
    overlay_permission_requests: usize,
    screen_on_requests: usize,
}

type Listeners = Vec<(ListenerToken, Arc<dyn LifecycleListener>)>;

pub struct HeadlessPlatform {
    listeners: Mutex<Listeners>,
    next_token: AtomicU64,
    next_hardware_buffer: AtomicU64,
    overlay_permission: AtomicBool,
    locked: AtomicBool,
    hooks: Mutex<Vec<(HeadlessCall, Hook)>>,
    state: Mutex<State>,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
            next_hardware_buffer: AtomicU64::new(1),
            overlay_permission: AtomicBool::new(true),
            locked: AtomicBool::new(false),
            hooks: Mutex::new(Vec::new()),
            state: Mutex::new(State::default()),
        }
    }

    pub fn set_overlay_permission(&self, granted: bool) {
        self.overlay_permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    /// Runs `hook` once, inside the next `call`, after the platform did its
    /// work and before the call returns. No platform lock is held.
    pub fn intercept_next(
        &self,
        call: HeadlessCall,
        hook: impl FnOnce(&HeadlessPlatform) + Send + 'static,
    ) {
        lock(&self.hooks).push((call, Box::new(hook)));
    }

    fn run_hook(&self, call: HeadlessCall) {
        let hook = {
            let mut hooks = lock(&self.hooks);
            hooks
                .iter()
                .position(|(pending, _)| *pending == call)
                .map(|index| hooks.remove(index).1)
        };
        if let Some(hook) = hook {
            hook(self);
        }
    }

    /// Invokes `f` on every installed listener. The listener list is
    /// snapshotted first so listeners may call back into the platform.
    pub fn broadcast(&self, mut f: impl FnMut(&dyn LifecycleListener)) {
        let listeners: Vec<Arc<dyn LifecycleListener>> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            f(listener.as_ref());
        }
    }

    /// Like [`HeadlessPlatform::broadcast`] for callbacks that report
    /// interception; true if any listener intercepted.
    pub fn broadcast_any(&self, mut f: impl FnMut(&dyn LifecycleListener) -> bool) -> bool {
        let mut intercepted = false;
        self.broadcast(|listener| intercepted |= f(listener));
        intercepted
    }

    /// Simulates the system destroying an activity the client did not finish.
    pub fn kill_activity(&self, aid: Handle) {
        if self.forget_activity(aid) {
            self.broadcast(|listener| {
                listener.activity_paused(aid, false);
                listener.activity_stopped(aid, false);
                listener.activity_destroyed(aid, false);
            });
        }
    }

    fn forget_activity(&self, aid: Handle) -> bool {
        let mut state = lock(&self.state);
        state.views.retain(|(owner, _), _| *owner != aid);
        state.activities.remove(&aid).is_some()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn listener_removals(&self) -> usize {
        lock(&self.state).listener_removals
    }

    pub fn live_activities(&self) -> Vec<Handle> {
        lock(&self.state).activities.keys().copied().collect()
    }

    pub fn activity(&self, aid: Handle) -> Option<HeadlessActivity> {
        lock(&self.state).activities.get(&aid).cloned()
    }

    pub fn finished_activities(&self) -> Vec<Handle> {
        lock(&self.state).finished_activities.clone()
    }

    pub fn live_overlays(&self) -> Vec<Handle> {
        lock(&self.state).overlays.keys().copied().collect()
    }

    pub fn destroyed_overlays(&self) -> Vec<Handle> {
        lock(&self.state).destroyed_overlays.clone()
    }

    pub fn overlay_permission_requests(&self) -> usize {
        lock(&self.state).overlay_permission_requests
    }

    pub fn view(&self, owner: Handle, id: Handle) -> Option<HeadlessView> {
        lock(&self.state).views.get(&(owner, id)).cloned()
    }

    pub fn view_count(&self) -> usize {
        lock(&self.state).views.len()
    }

    pub fn live_hardware_buffers(&self) -> usize {
        lock(&self.state).hardware_buffers.len()
    }

    pub fn released_hardware_buffers(&self) -> usize {
        lock(&self.state).released_hardware_buffers
    }

    pub fn widget(&self, name: &str) -> Option<RemoteLayout> {
        lock(&self.state).widgets.get(name).cloned()
    }

    pub fn channel(&self, id: &str) -> Option<NotificationChannel> {
        lock(&self.state).channels.get(id).cloned()
    }

    pub fn posted_notification(&self, id: Handle) -> Option<Notification> {
        lock(&self.state).notifications.get(&id).cloned()
    }

    pub fn cancelled_notifications(&self) -> Vec<Handle> {
        lock(&self.state).cancelled_notifications.clone()
    }

    pub fn toasts(&self) -> Vec<String> {
        lock(&self.state).toasts.clone()
    }

    pub fn screen_on_requests(&self) -> usize {
        lock(&self.state).screen_on_requests
    }

    fn gone(what: &str, handle: Handle) -> PlatformError {
        PlatformError::Gone(format!("{what} {handle}"))
    }

    fn with_view<R>(
        &self,
        owner: Handle,
        id: Handle,
        f: impl FnOnce(&mut HeadlessView) -> R,
    ) -> Result<R, PlatformError> {
        lock(&self.state)
            .views
            .get_mut(&(owner, id))
            .map(f)
            .ok_or_else(|| Self::gone("view", id))
    }
}

fn exact(size: &ViewSize) -> i32 {
    match size {
        ViewSize::Exact { value, .. } => *value as i32,
        ViewSize::MatchParent | ViewSize::WrapContent => 0,
    }
}

impl Platform for HeadlessPlatform {
    fn add_listener(&self, listener: Arc<dyn LifecycleListener>) -> ListenerToken {
        let token = ListenerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((token, listener));
        self.run_hook(HeadlessCall::AddListener);
        token
    }

    fn remove_listener(&self, token: ListenerToken) {
        let removed = {
            let mut listeners = lock(&self.listeners);
            let before = listeners.len();
            listeners.retain(|(installed, _)| *installed != token);
            before != listeners.len()
        };
        if removed {
            lock(&self.state).listener_removals += 1;
        }
    }

    fn version_code(&self) -> i32 {
        HEADLESS_VERSION_CODE
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    fn turn_screen_on(&self) {
        lock(&self.state).screen_on_requests += 1;
    }

    fn toast(&self, text: &str, _long: bool) {
        lock(&self.state).toasts.push(text.to_string());
    }

    fn launch_activity(
        &self,
        aid: Handle,
        tid: Handle,
        options: &ActivityOptions,
    ) -> Result<(), PlatformError> {
        tracing::debug!(aid, tid, dialog = options.dialog, "headless launch");

        lock(&self.state).activities.insert(
            aid,
            HeadlessActivity {
                tid,
                options: *options,
                commands: Vec::new(),
            },
        );

        self.broadcast(|listener| {
            listener.activity_created(aid);
            listener.activity_started(aid);
            listener.activity_resumed(aid);
        });
        Ok(())
    }

    fn finish_activity(&self, aid: Handle) -> Result<(), PlatformError> {
        if !self.forget_activity(aid) {
            return Err(Self::gone("activity", aid));
        }
        lock(&self.state).finished_activities.push(aid);

        self.broadcast(|listener| {
            listener.activity_paused(aid, true);
            listener.activity_stopped(aid, true);
            listener.activity_destroyed(aid, true);
        });
        Ok(())
    }

    fn activity_command(
        &self,
        aid: Handle,
        command: &ActivityCommand,
    ) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        if let Some(activity) = state.activities.get_mut(&aid) {
            activity.commands.push(command.clone());
            return Ok(());
        }

        match (state.overlays.get_mut(&aid), command) {
            (Some(bounds), ActivityCommand::SetPosition { x, y }) => {
                bounds.x = *x;
                bounds.y = *y;
                Ok(())
            }
            (Some(_), _) => Ok(()),
            (None, _) => Err(Self::gone("activity", aid)),
        }
    }

    fn configuration(&self, aid: Handle) -> Result<Configuration, PlatformError> {
        if lock(&self.state).activities.contains_key(&aid) {
            Ok(Configuration::default())
        } else {
            Err(Self::gone("activity", aid))
        }
    }

    fn finish_task(&self, tid: Handle) -> Result<(), PlatformError> {
        let members: Vec<Handle> = lock(&self.state)
            .activities
            .iter()
            .filter(|(_, activity)| activity.tid == tid)
            .map(|(aid, _)| *aid)
            .collect();

        for aid in members {
            self.finish_activity(aid)?;
        }
        Ok(())
    }

    fn bring_task_to_front(&self, tid: Handle) -> Result<(), PlatformError> {
        let exists = lock(&self.state)
            .activities
            .values()
            .any(|activity| activity.tid == tid);
        if exists {
            Ok(())
        } else {
            Err(Self::gone("task", tid))
        }
    }

    fn can_draw_overlays(&self) -> bool {
        self.overlay_permission.load(Ordering::SeqCst)
    }

    fn request_overlay_permission(&self) {
        lock(&self.state).overlay_permission_requests += 1;
    }

    fn create_overlay(&self, aid: Handle) -> Result<Bounds, PlatformError> {
        if !self.can_draw_overlays() {
            return Err(PlatformError::PermissionDenied("draw overlays".to_string()));
        }
        lock(&self.state).overlays.insert(aid, OVERLAY_BOUNDS);
        Ok(OVERLAY_BOUNDS)
    }

    fn destroy_overlay(&self, aid: Handle) {
        let mut state = lock(&self.state);
        if state.overlays.remove(&aid).is_some() {
            state.views.retain(|(owner, _), _| *owner != aid);
            state.destroyed_overlays.push(aid);
        }
    }

    fn create_view(
        &self,
        owner: Handle,
        id: Handle,
        parent: Option<Handle>,
        spec: &WidgetSpec,
    ) -> Result<(), PlatformError> {
        let mut state = lock(&self.state);
        if !state.activities.contains_key(&owner) && !state.overlays.contains_key(&owner) {
            return Err(Self::gone("activity", owner));
        }
        state.views.insert(
            (owner, id),
            HeadlessView {
                kind: spec.kind(),
                parent,
                text: spec.initial_text().to_string(),
                size: (0, 0),
                scroll: (0, 0),
                surface_buffer: None,
                mutations: Vec::new(),
            },
        );
        Ok(())
    }

    fn update_view(
        &self,
        owner: Handle,
        id: Handle,
        mutation: &ViewMutation,
    ) -> Result<(), PlatformError> {
        self.with_view(owner, id, |view| {
            match mutation {
                ViewMutation::Text(text) => view.text = text.clone(),
                ViewMutation::Width(size) => view.size.0 = exact(size),
                ViewMutation::Height(size) => view.size.1 = exact(size),
                ViewMutation::Scroll { x, y, .. } => view.scroll = (*x, *y),
                ViewMutation::SurfaceBuffer(buffer) => view.surface_buffer = *buffer,
                _ => {}
            }
            view.mutations.push(mutation.name());
        })
    }

    fn destroy_view(&self, owner: Handle, id: Handle) {
        lock(&self.state).views.remove(&(owner, id));
    }

    fn view_dimensions(&self, owner: Handle, id: Handle) -> Result<(i32, i32), PlatformError> {
        self.with_view(owner, id, |view| view.size)
    }

    fn scroll_position(&self, owner: Handle, id: Handle) -> Result<(i32, i32), PlatformError> {
        self.with_view(owner, id, |view| view.scroll)
    }

    fn create_hardware_buffer(
        &self,
        spec: &HardwareBufferSpec,
    ) -> Result<RawHardwareBuffer, PlatformError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(PlatformError::Failed("empty hardware buffer".to_string()));
        }
        let id = self.next_hardware_buffer.fetch_add(1, Ordering::Relaxed);
        lock(&self.state).hardware_buffers.insert(id);
        Ok(RawHardwareBuffer::new(id))
    }

    fn release_hardware_buffer(&self, buffer: RawHardwareBuffer) {
        let mut state = lock(&self.state);
        if state.hardware_buffers.remove(&buffer.id()) {
            state.released_hardware_buffers += 1;
        }
    }

    fn update_widget(&self, widget: &str, layout: &RemoteLayout) -> Result<(), PlatformError> {
        lock(&self.state)
            .widgets
            .insert(widget.to_string(), layout.clone());
        Ok(())
    }

    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), PlatformError> {
        lock(&self.state)
            .channels
            .insert(channel.id.clone(), channel.clone());
        Ok(())
    }

    fn post_notification(
        &self,
        id: Handle,
        notification: &Notification,
        _layouts: &NotificationLayouts,
    ) -> Result<(), PlatformError> {
        {
            let mut state = lock(&self.state);
            if !state.channels.contains_key(&notification.channel) {
                return Err(PlatformError::Failed(format!(
                    "no channel {}",
                    notification.channel
                )));
            }
            state.notifications.insert(id, notification.clone());
        }
        self.run_hook(HeadlessCall::PostNotification);
        Ok(())
    }

    fn cancel_notification(&self, id: Handle) {
        let mut state = lock(&self.state);
        state.notifications.remove(&id);
        state.cancelled_notifications.push(id);
    }
}
