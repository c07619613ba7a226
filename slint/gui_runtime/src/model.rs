//! Session-side resource models and the small value types they share with
//! the wire messages.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use slint::{Color, Rgba8Pixel, SharedPixelBuffer};

use crate::handle::Handle;
use crate::platform::RawHardwareBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecyclePhase {
    Created,
    Started,
    Resumed,
    Paused,
    Stopped,
    Destroyed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    #[default]
    Unspecified,
    Behind,
    FullSensor,
    FullUser,
    Landscape,
    Locked,
    NoSensor,
    Portrait,
    ReverseLandscape,
    ReversePortrait,
    Sensor,
    SensorLandscape,
    SensorPortrait,
    User,
    UserLandscape,
    UserPortrait,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputMode {
    #[default]
    Pan,
    Resize,
}

/// Which system bars are visible or requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bars {
    #[default]
    BothBars,
    NavigationBar,
    StatusBar,
    NoBar,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsetBehaviour {
    #[default]
    Unspecified,
    Default,
    TransientBars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VolumeKey {
    VolumeUp,
    VolumeDown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Gone,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Unit {
    #[default]
    Dp,
    Sp,
    Px,
    Mm,
    In,
    Pt,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewSize {
    MatchParent,
    WrapContent,
    Exact { value: f32, unit: Unit },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    #[default]
    All,
    Left,
    Top,
    Right,
    Bottom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gravity {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchAction {
    Down,
    Up,
    PointerDown,
    PointerUp,
    Cancel,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    pub id: i32,
    pub x: i32,
    pub y: i32,
}

/// One touch occurrence as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchSample {
    pub action: TouchAction,
    pub pointers: Vec<Pointer>,
    pub time: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Importance {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BufferFormat {
    #[default]
    Argb8888,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HardwareBufferFormat {
    #[default]
    Rgba8888,
    Rgbx8888,
    Rgb888,
    Rgb565,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CpuUsage {
    #[default]
    Never,
    Rarely,
    Often,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceMode {
    #[default]
    Fixed,
    Scale,
}

/// Device configuration as reported for an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub dark_mode: bool,
    pub country: String,
    pub language: String,
    pub orientation: Orientation,
    pub keyboard_hidden: bool,
    pub screen_width: i32,
    pub screen_height: i32,
    pub font_scale: f32,
    pub density: f32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            dark_mode: false,
            country: "US".to_string(),
            language: "en".to_string(),
            orientation: Orientation::Portrait,
            keyboard_hidden: true,
            screen_width: 411,
            screen_height: 891,
            font_scale: 1.0,
            density: 2.625,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub task: Handle,
    pub phase: LifecyclePhase,
    pub finishing: bool,
    pub dialog: bool,
    pub intercept_back: bool,
    pub intercept_volume_up: bool,
    pub intercept_volume_down: bool,
    pub secure: bool,
    pub keep_screen_on: bool,
    pub pip: bool,
    pub orientation: Orientation,
    pub input_mode: InputMode,
}

impl Activity {
    pub fn new(task: Handle) -> Self {
        Self {
            task,
            phase: LifecyclePhase::Created,
            finishing: false,
            dialog: false,
            intercept_back: false,
            intercept_volume_up: false,
            intercept_volume_down: false,
            secure: false,
            keep_screen_on: false,
            pip: false,
            orientation: Orientation::Unspecified,
            input_mode: InputMode::Pan,
        }
    }

    pub fn intercepts_volume(&self, key: VolumeKey) -> bool {
        match key {
            VolumeKey::VolumeUp => self.intercept_volume_up,
            VolumeKey::VolumeDown => self.intercept_volume_down,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    pub activities: Vec<Handle>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    pub send_touch: bool,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    LinearLayout,
    FrameLayout,
    SwipeRefreshLayout,
    TextView,
    EditText,
    Button,
    ImageView,
    Space,
    NestedScrollView,
    HorizontalScrollView,
    RadioGroup,
    RadioButton,
    Checkbox,
    ToggleButton,
    Switch,
    Spinner,
    ProgressBar,
    TabLayout,
    WebView,
    GridLayout,
    SurfaceView,
}

impl ViewKind {
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::LinearLayout
                | Self::FrameLayout
                | Self::SwipeRefreshLayout
                | Self::NestedScrollView
                | Self::HorizontalScrollView
                | Self::RadioGroup
                | Self::GridLayout
        )
    }

    pub fn has_text(self) -> bool {
        matches!(
            self,
            Self::TextView
                | Self::EditText
                | Self::Button
                | Self::RadioButton
                | Self::Checkbox
                | Self::ToggleButton
                | Self::Switch
        )
    }

    pub fn is_checkable(self) -> bool {
        matches!(
            self,
            Self::RadioButton | Self::Checkbox | Self::ToggleButton | Self::Switch
        )
    }

    pub fn is_scroll(self) -> bool {
        matches!(self, Self::NestedScrollView | Self::HorizontalScrollView)
    }

    fn clicks_by_default(self) -> bool {
        self == Self::Button || self.is_checkable()
    }
}

/// Interaction events the client asked to receive for one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSubscriptions {
    pub click: bool,
    pub long_click: bool,
    pub focus_change: bool,
    pub touch: bool,
    pub text: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub kind: ViewKind,
    pub parent: Option<Handle>,
    pub text: String,
    pub checked: bool,
    pub clickable: bool,
    pub visibility: Visibility,
    pub progress: i32,
    pub items: Vec<String>,
    pub selected: Option<i32>,
    pub buffer: Option<Handle>,
    pub surface_buffer: Option<Handle>,
    pub events: EventSubscriptions,
}

impl View {
    pub fn new(kind: ViewKind, parent: Option<Handle>) -> Self {
        Self {
            kind,
            parent,
            text: String::new(),
            checked: false,
            clickable: true,
            visibility: Visibility::Visible,
            progress: 0,
            items: Vec::new(),
            selected: None,
            buffer: None,
            surface_buffer: None,
            events: EventSubscriptions {
                click: kind.clicks_by_default(),
                ..EventSubscriptions::default()
            },
        }
    }
}

/// Client-writable RGBA pixel storage.
#[derive(Clone)]
pub struct PixelBuffer {
    pub pixels: SharedPixelBuffer<Rgba8Pixel>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: SharedPixelBuffer::new(width, height),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.width() as usize * self.pixels.height() as usize * 4
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.pixels.width())
            .field("height", &self.pixels.height())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareBufferSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub format: HardwareBufferFormat,
    #[serde(default)]
    pub cpu_read: CpuUsage,
    #[serde(default)]
    pub cpu_write: CpuUsage,
}

#[derive(Debug)]
pub struct HardwareBuffer {
    pub spec: HardwareBufferSpec,
    pub raw: RawHardwareBuffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteViewKind {
    FrameLayout,
    LinearLayout { horizontal: bool },
    TextView,
    Button,
    ImageView,
    ProgressBar,
}

impl RemoteViewKind {
    pub fn is_container(self) -> bool {
        matches!(self, Self::FrameLayout | Self::LinearLayout { .. })
    }

    pub fn has_text(self) -> bool {
        matches!(self, Self::TextView | Self::Button)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteView {
    pub kind: RemoteViewKind,
    pub parent: Option<Handle>,
    pub text: String,
    pub text_size: Option<f32>,
    pub text_color: Option<Color>,
    pub background: Option<Color>,
    pub visibility: Visibility,
    pub padding: [i32; 4],
    pub progress: i32,
    pub progress_max: i32,
    pub image: Vec<u8>,
}

impl RemoteView {
    pub fn new(kind: RemoteViewKind, parent: Option<Handle>) -> Self {
        Self {
            kind,
            parent,
            text: String::new(),
            text_size: None,
            text_color: None,
            background: None,
            visibility: Visibility::Visible,
            padding: [0; 4],
            progress: 0,
            progress_max: 100,
            image: Vec::new(),
        }
    }
}

/// A view hierarchy that lives without an in-process activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteLayout {
    pub root: Option<Handle>,
    pub views: BTreeMap<Handle, RemoteView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: String,
    pub importance: Importance,
    pub ongoing: bool,
    pub title: String,
    pub content: String,
    pub large_text: String,
    pub large_image: Vec<u8>,
    pub large_image_as_thumbnail: bool,
    pub icon: Vec<u8>,
    pub alert_once: bool,
    pub show_timestamp: bool,
    pub timestamp: i64,
    pub actions: Vec<String>,
    pub layout: Option<Handle>,
    pub expanded_layout: Option<Handle>,
    pub hud_layout: Option<Handle>,
}

/// Decodes a wire ARGB color.
pub fn argb(color: u32) -> Color {
    Color::from_argb_encoded(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_contains_is_half_open() {
        let bounds = Bounds {
            x: 10,
            y: 10,
            width: 5,
            height: 5,
        };
        assert!(bounds.contains(10, 10));
        assert!(bounds.contains(14, 14));
        assert!(!bounds.contains(15, 10));
        assert!(!bounds.contains(9, 12));
    }

    #[test]
    fn buttons_report_clicks_by_default() {
        assert!(View::new(ViewKind::Button, None).events.click);
        assert!(View::new(ViewKind::Switch, None).events.click);
        assert!(!View::new(ViewKind::TextView, None).events.click);
    }

    #[test]
    fn pixel_buffer_is_rgba() {
        let buffer = PixelBuffer::new(3, 2);
        assert_eq!(buffer.byte_len(), 24);
        assert_eq!(buffer.pixels.as_bytes().len(), 24);
    }

    #[test]
    fn argb_color_decodes_channels() {
        let color = argb(0x80FF_0010);
        assert_eq!(color.alpha(), 0x80);
        assert_eq!(color.red(), 0xFF);
        assert_eq!(color.green(), 0x00);
        assert_eq!(color.blue(), 0x10);
    }
}
