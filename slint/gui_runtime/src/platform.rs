//! The seams between the session engine and the host toolkit.
//!
//! [`Platform`] instantiates and mutates the concrete windows, widgets and
//! buffers. [`LifecycleListener`] is the callback surface the platform drives
//! when something happens on its side.

use std::sync::Arc;

use slint::{Color, Rgba8Pixel, SharedPixelBuffer};

use crate::error::PlatformError;
use crate::handle::Handle;
use crate::model::{
    Bars, Bounds, Configuration, Direction, Gravity, HardwareBufferSpec,
    InputMode, InsetBehaviour, Notification, NotificationChannel, Orientation, RemoteLayout,
    SurfaceMode, TouchSample, Unit, ViewKind, ViewSize, Visibility, VolumeKey,
};

/// Identifies one installed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

/// Platform-owned hardware buffer. Not `Clone`: the only way to give it back
/// is [`Platform::release_hardware_buffer`], which consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct RawHardwareBuffer {
    id: u64,
}

impl RawHardwareBuffer {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityOptions {
    pub dialog: bool,
    pub pip: bool,
    pub lockscreen: bool,
    pub cancel_outside: bool,
}

/// Window-level operations on an activity or overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityCommand {
    MoveTaskToBack,
    SetTheme {
        status_bar_color: Color,
        primary_color: Color,
        accent_color: Color,
        window_background: Color,
        text_color: Color,
    },
    SetTaskDescription {
        label: String,
        icon: Vec<u8>,
        primary_color: Color,
    },
    SetPiPParams {
        numerator: u32,
        denominator: u32,
    },
    SetInputMode(InputMode),
    SetPiPMode(bool),
    SetPiPModeAuto(bool),
    KeepScreenOn(bool),
    SetOrientation(Orientation),
    SetPosition {
        x: i32,
        y: i32,
    },
    RequestUnlock,
    HideSoftKeyboard,
    SetSecure(bool),
    ConfigureInsets {
        shown: Bars,
        behaviour: InsetBehaviour,
    },
}

/// The widget to instantiate, with its creation-time options.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetSpec {
    LinearLayout { horizontal: bool },
    FrameLayout,
    SwipeRefreshLayout,
    TextView {
        text: String,
        selectable: bool,
        clickable_links: bool,
    },
    EditText {
        text: String,
        single_line: bool,
        no_line: bool,
        block_input: bool,
    },
    Button { text: String, all_caps: bool },
    ImageView { keyboard: bool },
    Space,
    NestedScrollView {
        no_bar: bool,
        snapping: bool,
        fill_viewport: bool,
    },
    HorizontalScrollView {
        no_bar: bool,
        snapping: bool,
        fill_viewport: bool,
    },
    RadioGroup,
    RadioButton { text: String, checked: bool },
    Checkbox { text: String, checked: bool },
    ToggleButton { checked: bool },
    Switch { text: String, checked: bool },
    Spinner,
    ProgressBar,
    TabLayout,
    WebView,
    GridLayout { rows: u32, columns: u32 },
    SurfaceView { keyboard: bool, secure: bool },
}

impl WidgetSpec {
    pub fn kind(&self) -> ViewKind {
        match self {
            Self::LinearLayout { .. } => ViewKind::LinearLayout,
            Self::FrameLayout => ViewKind::FrameLayout,
            Self::SwipeRefreshLayout => ViewKind::SwipeRefreshLayout,
            Self::TextView { .. } => ViewKind::TextView,
            Self::EditText { .. } => ViewKind::EditText,
            Self::Button { .. } => ViewKind::Button,
            Self::ImageView { .. } => ViewKind::ImageView,
            Self::Space => ViewKind::Space,
            Self::NestedScrollView { .. } => ViewKind::NestedScrollView,
            Self::HorizontalScrollView { .. } => ViewKind::HorizontalScrollView,
            Self::RadioGroup => ViewKind::RadioGroup,
            Self::RadioButton { .. } => ViewKind::RadioButton,
            Self::Checkbox { .. } => ViewKind::Checkbox,
            Self::ToggleButton { .. } => ViewKind::ToggleButton,
            Self::Switch { .. } => ViewKind::Switch,
            Self::Spinner => ViewKind::Spinner,
            Self::ProgressBar => ViewKind::ProgressBar,
            Self::TabLayout => ViewKind::TabLayout,
            Self::WebView => ViewKind::WebView,
            Self::GridLayout { .. } => ViewKind::GridLayout,
            Self::SurfaceView { .. } => ViewKind::SurfaceView,
        }
    }

    pub fn initial_text(&self) -> &str {
        match self {
            Self::TextView { text, .. }
            | Self::EditText { text, .. }
            | Self::Button { text, .. }
            | Self::RadioButton { text, .. }
            | Self::Checkbox { text, .. }
            | Self::Switch { text, .. } => text,
            _ => "",
        }
    }

    pub fn initially_checked(&self) -> bool {
        match self {
            Self::RadioButton { checked, .. }
            | Self::Checkbox { checked, .. }
            | Self::ToggleButton { checked }
            | Self::Switch { checked, .. } => *checked,
            _ => false,
        }
    }
}

/// A property change on a live widget.
#[derive(Clone)]
pub enum ViewMutation {
    ShowCursor(bool),
    LinearLayoutParams {
        weight: f32,
        position: Option<i32>,
    },
    GridLayoutParams {
        row: i32,
        column: i32,
        row_span: i32,
        column_span: i32,
        row_align: Gravity,
        column_align: Gravity,
    },
    Location {
        x: f32,
        y: f32,
        unit: Unit,
        top: bool,
    },
    Relative(Vec<(String, Option<Handle>)>),
    Visibility(Visibility),
    Width(ViewSize),
    Height(ViewSize),
    Margin {
        value: f32,
        unit: Unit,
        direction: Direction,
    },
    Padding {
        value: f32,
        unit: Unit,
        direction: Direction,
    },
    BackgroundColor(Color),
    TextColor(Color),
    Progress(i32),
    Refreshing(bool),
    Text(String),
    Gravity {
        horizontal: Gravity,
        vertical: Gravity,
    },
    TextSize(f32),
    Focus {
        force_soft: bool,
    },
    Scroll {
        x: i32,
        y: i32,
        smooth: bool,
    },
    List(Vec<String>),
    Image(Vec<u8>),
    Buffer(SharedPixelBuffer<Rgba8Pixel>),
    SelectTab(i32),
    SelectItem(i32),
    Clickable(bool),
    Checked(bool),
    /// Platform id of the hardware buffer to show; `None` detaches it.
    SurfaceBuffer(Option<u64>),
    SurfaceConfig {
        background: Color,
        x_mode: SurfaceMode,
        y_mode: SurfaceMode,
        frame_rate: f32,
    },
    AllowJavascript(bool),
    AllowContent(bool),
    AllowNavigation(bool),
    Data {
        data: String,
        mime: String,
        base64: bool,
    },
    LoadUri(String),
    GoBack,
    GoForward,
    EvaluateJavascript(String),
}

impl std::fmt::Debug for ViewMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffer(pixels) => f
                .debug_tuple("Buffer")
                .field(&(pixels.width(), pixels.height()))
                .finish(),
            Self::Image(bytes) => f.debug_tuple("Image").field(&bytes.len()).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            other => f.write_str(other.name()),
        }
    }
}

impl ViewMutation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShowCursor(_) => "ShowCursor",
            Self::LinearLayoutParams { .. } => "LinearLayoutParams",
            Self::GridLayoutParams { .. } => "GridLayoutParams",
            Self::Location { .. } => "Location",
            Self::Relative(_) => "Relative",
            Self::Visibility(_) => "Visibility",
            Self::Width(_) => "Width",
            Self::Height(_) => "Height",
            Self::Margin { .. } => "Margin",
            Self::Padding { .. } => "Padding",
            Self::BackgroundColor(_) => "BackgroundColor",
            Self::TextColor(_) => "TextColor",
            Self::Progress(_) => "Progress",
            Self::Refreshing(_) => "Refreshing",
            Self::Text(_) => "Text",
            Self::Gravity { .. } => "Gravity",
            Self::TextSize(_) => "TextSize",
            Self::Focus { .. } => "Focus",
            Self::Scroll { .. } => "Scroll",
            Self::List(_) => "List",
            Self::Image(_) => "Image",
            Self::Buffer(_) => "Buffer",
            Self::SelectTab(_) => "SelectTab",
            Self::SelectItem(_) => "SelectItem",
            Self::Clickable(_) => "Clickable",
            Self::Checked(_) => "Checked",
            Self::SurfaceBuffer(_) => "SurfaceBuffer",
            Self::SurfaceConfig { .. } => "SurfaceConfig",
            Self::AllowJavascript(_) => "AllowJavascript",
            Self::AllowContent(_) => "AllowContent",
            Self::AllowNavigation(_) => "AllowNavigation",
            Self::Data { .. } => "Data",
            Self::LoadUri(_) => "LoadUri",
            Self::GoBack => "GoBack",
            Self::GoForward => "GoForward",
            Self::EvaluateJavascript(_) => "EvaluateJavascript",
        }
    }
}

/// Where a touch on an overlay goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchRoute {
    /// Inside the overlay: consumed by it.
    Intercept,
    /// Outside the overlay: delivered to whatever window is underneath.
    PassThrough,
}

/// Resource factory and lifecycle source of the host toolkit.
///
/// Implementations may invoke installed listeners from any thread, including
/// synchronously from inside one of these methods.
pub trait Platform: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn LifecycleListener>) -> ListenerToken;
    fn remove_listener(&self, token: ListenerToken);

    fn version_code(&self) -> i32;
    fn is_locked(&self) -> bool;
    fn turn_screen_on(&self);
    fn toast(&self, text: &str, long: bool);

    fn launch_activity(
        &self,
        aid: Handle,
        tid: Handle,
        options: &ActivityOptions,
    ) -> Result<(), PlatformError>;
    fn finish_activity(&self, aid: Handle) -> Result<(), PlatformError>;
    fn activity_command(&self, aid: Handle, command: &ActivityCommand)
    -> Result<(), PlatformError>;
    fn configuration(&self, aid: Handle) -> Result<Configuration, PlatformError>;

    fn finish_task(&self, tid: Handle) -> Result<(), PlatformError>;
    fn bring_task_to_front(&self, tid: Handle) -> Result<(), PlatformError>;

    fn can_draw_overlays(&self) -> bool;
    /// Shows the permission prompt. Never blocks on the user.
    fn request_overlay_permission(&self);
    fn create_overlay(&self, aid: Handle) -> Result<Bounds, PlatformError>;
    fn destroy_overlay(&self, aid: Handle);

    fn create_view(
        &self,
        owner: Handle,
        id: Handle,
        parent: Option<Handle>,
        spec: &WidgetSpec,
    ) -> Result<(), PlatformError>;
    fn update_view(
        &self,
        owner: Handle,
        id: Handle,
        mutation: &ViewMutation,
    ) -> Result<(), PlatformError>;
    fn destroy_view(&self, owner: Handle, id: Handle);
    fn view_dimensions(&self, owner: Handle, id: Handle) -> Result<(i32, i32), PlatformError>;
    fn scroll_position(&self, owner: Handle, id: Handle) -> Result<(i32, i32), PlatformError>;

    fn create_hardware_buffer(
        &self,
        spec: &HardwareBufferSpec,
    ) -> Result<RawHardwareBuffer, PlatformError>;
    fn release_hardware_buffer(&self, buffer: RawHardwareBuffer);

    fn update_widget(&self, widget: &str, layout: &RemoteLayout) -> Result<(), PlatformError>;

    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), PlatformError>;
    fn post_notification(
        &self,
        id: Handle,
        notification: &Notification,
        layouts: &NotificationLayouts,
    ) -> Result<(), PlatformError>;
    fn cancel_notification(&self, id: Handle);
}

/// Remote layouts referenced by a notification, resolved at post time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationLayouts {
    pub normal: Option<RemoteLayout>,
    pub expanded: Option<RemoteLayout>,
    pub heads_up: Option<RemoteLayout>,
}

/// Callbacks driven by the platform. Handles refer to session resources;
/// implementations ignore handles they do not own.
pub trait LifecycleListener: Send + Sync {
    fn activity_created(&self, aid: Handle);
    fn activity_started(&self, aid: Handle);
    fn activity_resumed(&self, aid: Handle);
    fn activity_paused(&self, aid: Handle, finishing: bool);
    fn activity_stopped(&self, aid: Handle, finishing: bool);
    fn activity_destroyed(&self, aid: Handle, finishing: bool);
    fn configuration_changed(&self, aid: Handle, configuration: &Configuration);

    /// Returns `true` when the press was intercepted for the client.
    fn back_pressed(&self, aid: Handle) -> bool;
    /// Returns `true` when the key was intercepted for the client.
    fn volume_key(&self, aid: Handle, key: VolumeKey, down: bool) -> bool;
    fn insets_changed(&self, aid: Handle, visible: Bars);
    fn pip_changed(&self, aid: Handle, pip: bool);
    fn user_leave_hint(&self, aid: Handle);

    fn airplane_mode_changed(&self, active: bool);
    fn locale_changed(&self, locale: &str);
    fn screen_changed(&self, on: bool);
    fn timezone_changed(&self, tz: &str);

    fn remote_clicked(&self, rid: Handle, id: Handle);
    fn notification_clicked(&self, id: Handle);
    fn notification_dismissed(&self, id: Handle);
    fn notification_action(&self, id: Handle, action: i32);

    fn view_clicked(&self, aid: Handle, id: Handle, checked: Option<bool>);
    fn view_long_clicked(&self, aid: Handle, id: Handle);
    fn view_focus_changed(&self, aid: Handle, id: Handle, focus: bool);
    fn view_text_changed(&self, aid: Handle, id: Handle, text: &str);
    fn view_touched(&self, aid: Handle, id: Handle, touch: &TouchSample);
    fn view_refreshed(&self, aid: Handle, id: Handle);
    fn view_selected(&self, aid: Handle, id: Handle, selected: i32);

    fn overlay_touch(&self, aid: Handle, touch: &TouchSample) -> TouchRoute;
    fn overlay_scale(&self, aid: Handle, span: f32);
}
