//! Client requests.
//!
//! [`methods!`] is the single list of operations: it generates the wire enum
//! [`Method`], the payload-free [`MethodTag`] and the handler group of every
//! tag. [`crate::dispatch::Dispatcher`] routes each variant with an exhaustive
//! `match`, so adding an operation here without a handler does not compile.

use serde::{Deserialize, Serialize};

use crate::handle::{Handle, NO_HANDLE};
use crate::model::{
    Bars, BufferFormat, Direction, Gravity, HardwareBufferSpec, Importance, InputMode,
    InsetBehaviour, Orientation, SurfaceMode, Unit, ViewSize, Visibility,
};

fn no_handle() -> Handle {
    NO_HANDLE
}

/// The handler set an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerGroup {
    Activity,
    Global,
    Create,
    View,
    Buffer,
    Remote,
    Notification,
}

macro_rules! methods {
    ($( $group:ident => [ $( $variant:ident ( $payload:ty ) = $name:literal ),* $(,)? ] )*) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum Method {
            $($(
                #[serde(rename = $name)]
                $variant($payload),
            )*)*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MethodTag {
            $($( $variant, )*)*
        }

        impl MethodTag {
            pub const ALL: &'static [MethodTag] = &[$($( MethodTag::$variant, )*)*];

            /// Wire name of the operation.
            pub fn name(self) -> &'static str {
                match self {
                    $($( MethodTag::$variant => $name, )*)*
                }
            }

            pub fn group(self) -> HandlerGroup {
                match self {
                    $($( MethodTag::$variant => HandlerGroup::$group, )*)*
                }
            }
        }

        impl Method {
            pub fn tag(&self) -> MethodTag {
                match self {
                    $($( Method::$variant(_) => MethodTag::$variant, )*)*
                }
            }
        }
    };
}

methods! {
    Activity => [
        NewActivity(NewActivity) = "newActivity",
        FinishActivity(ActivityRef) = "finishActivity",
        MoveTaskToBack(ActivityRef) = "moveTaskToBack",
        SetTheme(SetTheme) = "setTheme",
        SetTaskDescription(SetTaskDescription) = "setTaskDescription",
        SetPiPParams(SetPiPParams) = "setPiPParams",
        SetInputMode(SetInputMode) = "setInputMode",
        SetPiPMode(ActivityToggle) = "setPiPMode",
        SetPiPModeAuto(ActivityToggle) = "setPiPModeAuto",
        KeepScreenOn(ActivityToggle) = "keepScreenOn",
        SetOrientation(SetOrientation) = "setOrientation",
        SetPosition(SetPosition) = "setPosition",
        GetConfiguration(ActivityRef) = "getConfiguration",
        RequestUnlock(ActivityRef) = "requestUnlock",
        HideSoftKeyboard(ActivityRef) = "hideSoftKeyboard",
        InterceptBackButton(ActivityToggle) = "interceptBackButton",
        SetSecure(ActivityToggle) = "setSecure",
        InterceptVolume(InterceptVolume) = "interceptVolume",
        ConfigInsets(ConfigInsets) = "configInsets",
        SendOverlayTouch(ActivityToggle) = "sendOverlayTouch",
    ]
    Global => [
        FinishTask(TaskRef) = "finishTask",
        BringTaskToFront(TaskRef) = "bringTaskToFront",
        Toast(Toast) = "toast",
        TurnScreenOn(Empty) = "turnScreenOn",
        IsLocked(Empty) = "isLocked",
        Version(Empty) = "version",
        SetLogLevel(SetLogLevel) = "setLogLevel",
        GetLog(GetLog) = "getLog",
    ]
    Create => [
        CreateLinearLayout(CreateLinearLayout) = "createLinearLayout",
        CreateFrameLayout(CreateView) = "createFrameLayout",
        CreateSwipeRefreshLayout(CreateView) = "createSwipeRefreshLayout",
        CreateTextView(CreateTextView) = "createTextView",
        CreateEditText(CreateEditText) = "createEditText",
        CreateButton(CreateButton) = "createButton",
        CreateImageView(CreateImageView) = "createImageView",
        CreateSpace(CreateView) = "createSpace",
        CreateNestedScrollView(CreateScrollView) = "createNestedScrollView",
        CreateHorizontalScrollView(CreateScrollView) = "createHorizontalScrollView",
        CreateRadioGroup(CreateView) = "createRadioGroup",
        CreateRadioButton(CreateCompoundButton) = "createRadioButton",
        CreateCheckbox(CreateCompoundButton) = "createCheckbox",
        CreateToggleButton(CreateToggleButton) = "createToggleButton",
        CreateSwitch(CreateCompoundButton) = "createSwitch",
        CreateSpinner(CreateView) = "createSpinner",
        CreateProgressBar(CreateView) = "createProgressBar",
        CreateTabLayout(CreateView) = "createTabLayout",
        CreateWebView(CreateView) = "createWebView",
        CreateGridLayout(CreateGridLayout) = "createGridLayout",
        CreateSurfaceView(CreateSurfaceView) = "createSurfaceView",
    ]
    View => [
        ShowCursor(ViewToggle) = "showCursor",
        SetLinearLayout(SetLinearLayout) = "setLinearLayout",
        SetGridLayout(SetGridLayout) = "setGridLayout",
        SetLocation(SetLocation) = "setLocation",
        SetRelative(SetRelative) = "setRelative",
        SetVisibility(SetVisibility) = "setVisibility",
        SetWidth(SetSize) = "setWidth",
        SetHeight(SetSize) = "setHeight",
        GetDimensions(ViewRef) = "getDimensions",
        DeleteView(ViewRef) = "deleteView",
        DeleteChildren(ViewRef) = "deleteChildren",
        SetMargin(SetSpacing) = "setMargin",
        SetPadding(SetSpacing) = "setPadding",
        SetBackgroundColor(SetColor) = "setBackgroundColor",
        SetTextColor(SetColor) = "setTextColor",
        SetProgress(SetProgress) = "setProgress",
        SetRefreshing(ViewToggle) = "setRefreshing",
        SetText(SetText) = "setText",
        SetGravity(SetGravity) = "setGravity",
        SetTextSize(SetTextSize) = "setTextSize",
        GetText(ViewRef) = "getText",
        RequestFocus(RequestFocus) = "requestFocus",
        GetScrollPosition(ViewRef) = "getScrollPosition",
        SetScrollPosition(SetScrollPosition) = "setScrollPosition",
        SetList(SetList) = "setList",
        SetImage(SetImage) = "setImage",
        SetBuffer(SetBuffer) = "setBuffer",
        RefreshImageView(ViewRef) = "refreshImageView",
        SelectTab(SelectIndex) = "selectTab",
        SelectItem(SelectIndex) = "selectItem",
        SetClickable(ViewToggle) = "setClickable",
        SetChecked(ViewToggle) = "setChecked",
        SetSurfaceBuffer(SetBuffer) = "setSurfaceBuffer",
        SurfaceConfig(SurfaceConfig) = "surfaceConfig",
        AllowJs(ViewToggle) = "allowJS",
        AllowContent(ViewToggle) = "allowContent",
        SetData(SetData) = "setData",
        LoadUri(LoadUri) = "loadURI",
        AllowNavigation(ViewToggle) = "allowNavigation",
        GoBack(ViewRef) = "goBack",
        GoForward(ViewRef) = "goForward",
        EvaluateJs(EvaluateJs) = "evaluateJS",
        SendClickEvent(ViewToggle) = "sendClickEvent",
        SendLongClickEvent(ViewToggle) = "sendLongClickEvent",
        SendFocusChangeEvent(ViewToggle) = "sendFocusChangeEvent",
        SendTouchEvent(ViewToggle) = "sendTouchEvent",
        SendTextEvent(ViewToggle) = "sendTextEvent",
    ]
    Buffer => [
        AddBuffer(AddBuffer) = "addBuffer",
        DeleteBuffer(BufferRef) = "deleteBuffer",
        BlitBuffer(BlitBuffer) = "blitBuffer",
        CreateHardwareBuffer(HardwareBufferSpec) = "createHardwareBuffer",
        DestroyHardwareBuffer(BufferRef) = "destroyHardwareBuffer",
    ]
    Remote => [
        CreateRemoteLayout(Empty) = "createRemoteLayout",
        DeleteRemoteLayout(RemoteLayoutRef) = "deleteRemoteLayout",
        AddRemoteFrameLayout(AddRemoteView) = "addRemoteFrameLayout",
        AddRemoteLinearLayout(AddRemoteLinearLayout) = "addRemoteLinearLayout",
        AddRemoteTextView(AddRemoteView) = "addRemoteTextView",
        AddRemoteButton(AddRemoteView) = "addRemoteButton",
        AddRemoteImageView(AddRemoteView) = "addRemoteImageView",
        AddRemoteProgressBar(AddRemoteView) = "addRemoteProgressBar",
        SetRemoteBackgroundColor(SetRemoteColor) = "setRemoteBackgroundColor",
        SetRemoteProgressBar(SetRemoteProgressBar) = "setRemoteProgressBar",
        SetRemoteText(SetRemoteText) = "setRemoteText",
        SetRemoteTextSize(SetRemoteTextSize) = "setRemoteTextSize",
        SetRemoteTextColor(SetRemoteColor) = "setRemoteTextColor",
        SetRemoteVisibility(SetRemoteVisibility) = "setRemoteVisibility",
        SetRemotePadding(SetRemotePadding) = "setRemotePadding",
        SetRemoteImage(SetRemoteImage) = "setRemoteImage",
        SetWidgetLayout(SetWidgetLayout) = "setWidgetLayout",
    ]
    Notification => [
        CreateChannel(CreateChannel) = "createChannel",
        CreateNotification(CreateNotification) = "createNotification",
        CancelNotification(CancelNotification) = "cancelNotification",
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Empty {}

// activity group

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Normal,
    Dialog,
    DialogCancelOutside,
    Pip,
    Lockscreen,
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    /// Task to launch into; negative starts a new task.
    #[serde(default = "no_handle")]
    pub tid: Handle,
    #[serde(default, rename = "type")]
    pub kind: ActivityType,
    #[serde(default)]
    pub intercept_back_button: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRef {
    pub aid: Handle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityToggle {
    pub aid: Handle,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTheme {
    pub aid: Handle,
    pub status_bar_color: u32,
    pub color_primary: u32,
    pub color_accent: u32,
    pub window_background: u32,
    pub text_color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTaskDescription {
    pub aid: Handle,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub img: Vec<u8>,
    #[serde(default)]
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPiPParams {
    pub aid: Handle,
    pub num: u32,
    pub den: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetInputMode {
    pub aid: Handle,
    pub mode: InputMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOrientation {
    pub aid: Handle,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPosition {
    pub aid: Handle,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptVolume {
    pub aid: Handle,
    #[serde(default)]
    pub intercept_up: bool,
    #[serde(default)]
    pub intercept_down: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigInsets {
    pub aid: Handle,
    #[serde(default)]
    pub shown: Bars,
    #[serde(default)]
    pub behaviour: InsetBehaviour,
}

// global group

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub tid: Handle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub text: String,
    #[serde(default)]
    pub long: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLogLevel {
    pub level: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetLog {
    #[serde(default)]
    pub clear: bool,
}

// create group

/// Where a new view goes: owning activity or overlay, optional parent
/// container and initial visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub aid: Handle,
    #[serde(default = "no_handle")]
    pub parent: Handle,
    #[serde(default, rename = "v")]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateView {
    #[serde(flatten)]
    pub at: Placement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateLinearLayout {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub horizontal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTextView {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub selectable_text: bool,
    #[serde(default)]
    pub clickable_links: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEditText {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub single_line: bool,
    #[serde(default)]
    pub no_line: bool,
    #[serde(default)]
    pub block_input: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateButton {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub all_caps: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateImageView {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub keyboard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScrollView {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub no_bar: bool,
    #[serde(default)]
    pub snapping: bool,
    #[serde(default)]
    pub fill_viewport: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCompoundButton {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateToggleButton {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGridLayout {
    #[serde(flatten)]
    pub at: Placement,
    pub rows: u32,
    pub cols: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSurfaceView {
    #[serde(flatten)]
    pub at: Placement,
    #[serde(default)]
    pub keyboard: bool,
    #[serde(default)]
    pub secure: bool,
}

// view group

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRef {
    pub aid: Handle,
    pub id: Handle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewToggle {
    pub aid: Handle,
    pub id: Handle,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLinearLayout {
    pub aid: Handle,
    pub id: Handle,
    #[serde(default)]
    pub weight: f32,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGridLayout {
    pub aid: Handle,
    pub id: Handle,
    pub row: i32,
    pub col: i32,
    #[serde(default = "one")]
    pub row_size: i32,
    #[serde(default = "one")]
    pub col_size: i32,
    #[serde(default)]
    pub row_align: Gravity,
    #[serde(default)]
    pub col_align: Gravity,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLocation {
    pub aid: Handle,
    pub id: Handle,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub top: bool,
}

/// One relative-layout rule, e.g. `below` some anchor view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeRule {
    pub rule: String,
    #[serde(default = "no_handle")]
    pub anchor: Handle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRelative {
    pub aid: Handle,
    pub id: Handle,
    #[serde(default)]
    pub rules: Vec<RelativeRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetVisibility {
    pub aid: Handle,
    pub id: Handle,
    #[serde(rename = "v")]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSize {
    pub aid: Handle,
    pub id: Handle,
    pub size: ViewSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSpacing {
    pub aid: Handle,
    pub id: Handle,
    pub value: f32,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default, rename = "dir")]
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetColor {
    pub aid: Handle,
    pub id: Handle,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetProgress {
    pub aid: Handle,
    pub id: Handle,
    pub progress: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetText {
    pub aid: Handle,
    pub id: Handle,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetGravity {
    pub aid: Handle,
    pub id: Handle,
    #[serde(default)]
    pub horizontal: Gravity,
    #[serde(default)]
    pub vertical: Gravity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTextSize {
    pub aid: Handle,
    pub id: Handle,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFocus {
    pub aid: Handle,
    pub id: Handle,
    #[serde(default)]
    pub force_soft: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetScrollPosition {
    pub aid: Handle,
    pub id: Handle,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub smooth: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetList {
    pub aid: Handle,
    pub id: Handle,
    #[serde(default)]
    pub list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetImage {
    pub aid: Handle,
    pub id: Handle,
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetBuffer {
    pub aid: Handle,
    pub id: Handle,
    pub buffer: Handle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectIndex {
    pub aid: Handle,
    pub id: Handle,
    pub index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceConfig {
    pub aid: Handle,
    pub id: Handle,
    #[serde(default)]
    pub background: u32,
    #[serde(default)]
    pub x_mode: SurfaceMode,
    #[serde(default)]
    pub y_mode: SurfaceMode,
    #[serde(default)]
    pub framerate: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetData {
    pub aid: Handle,
    pub id: Handle,
    pub data: String,
    #[serde(default)]
    pub mime: String,
    #[serde(default)]
    pub base64: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadUri {
    pub aid: Handle,
    pub id: Handle,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateJs {
    pub aid: Handle,
    pub id: Handle,
    pub code: String,
}

// buffer group

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddBuffer {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub format: BufferFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferRef {
    pub buffer: Handle,
}

/// Replaces the pixel contents (when `pixels` is non-empty) and pushes the
/// buffer to every view showing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlitBuffer {
    pub buffer: Handle,
    #[serde(default)]
    pub pixels: Vec<u8>,
}

// remote group

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLayoutRef {
    pub rid: Handle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRemoteView {
    pub rid: Handle,
    #[serde(default = "no_handle")]
    pub parent: Handle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRemoteLinearLayout {
    pub rid: Handle,
    #[serde(default = "no_handle")]
    pub parent: Handle,
    #[serde(default)]
    pub horizontal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRemoteColor {
    pub rid: Handle,
    pub id: Handle,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRemoteProgressBar {
    pub rid: Handle,
    pub id: Handle,
    pub progress: i32,
    #[serde(default = "hundred")]
    pub max: i32,
}

fn hundred() -> i32 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRemoteText {
    pub rid: Handle,
    pub id: Handle,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRemoteTextSize {
    pub rid: Handle,
    pub id: Handle,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRemoteVisibility {
    pub rid: Handle,
    pub id: Handle,
    #[serde(rename = "v")]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRemotePadding {
    pub rid: Handle,
    pub id: Handle,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub right: i32,
    #[serde(default)]
    pub bottom: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRemoteImage {
    pub rid: Handle,
    pub id: Handle,
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetWidgetLayout {
    pub rid: Handle,
    pub wid: String,
}

// notification group

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub importance: Importance,
}

/// Posts a notification; `id` names an existing one to update in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotification {
    #[serde(default = "no_handle")]
    pub id: Handle,
    pub channel: String,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub ongoing: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub large_text: String,
    #[serde(default)]
    pub large_image: Vec<u8>,
    #[serde(default)]
    pub large_image_as_thumbnail: bool,
    #[serde(default)]
    pub icon: Vec<u8>,
    #[serde(default)]
    pub alert_once: bool,
    #[serde(default)]
    pub show_timestamp: bool,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default = "no_handle")]
    pub layout: Handle,
    #[serde(default = "no_handle")]
    pub expanded_layout: Handle,
    #[serde(default = "no_handle")]
    pub hud_layout: Handle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelNotification {
    pub id: Handle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_tag_has_a_unique_wire_name() {
        let names: HashSet<&str> = MethodTag::ALL.iter().map(|tag| tag.name()).collect();
        assert_eq!(names.len(), MethodTag::ALL.len());
        assert!(MethodTag::ALL.len() >= 90, "got {}", MethodTag::ALL.len());
    }

    #[test]
    fn tag_and_wire_name_agree() {
        let method: Method =
            serde_json::from_str(r#"{"newActivity":{"tid":-1}}"#).expect("decode newActivity");
        assert_eq!(method.tag(), MethodTag::NewActivity);
        assert_eq!(method.tag().group(), HandlerGroup::Activity);

        let method: Method = serde_json::from_str(r#"{"evaluateJS":{"aid":0,"id":1,"code":"1"}}"#)
            .expect("decode evaluateJS");
        assert_eq!(method.tag().name(), "evaluateJS");

        let encoded = serde_json::to_string(&method).expect("encode method");
        assert!(encoded.starts_with(r#"{"evaluateJS":"#), "got {encoded}");
    }

    #[test]
    fn new_activity_defaults_to_new_task() {
        let method: Method = serde_json::from_str(r#"{"newActivity":{}}"#).expect("decode");
        match method {
            Method::NewActivity(request) => {
                assert_eq!(request.tid, NO_HANDLE);
                assert_eq!(request.kind, ActivityType::Normal);
            }
            other => panic!("expected newActivity, got {other:?}"),
        }
    }

    #[test]
    fn create_payloads_flatten_placement() {
        let method: Method =
            serde_json::from_str(r#"{"createTextView":{"aid":0,"parent":2,"text":"hi"}}"#)
                .expect("decode createTextView");
        match method {
            Method::CreateTextView(request) => {
                assert_eq!(request.at.aid, 0);
                assert_eq!(request.at.parent, 2);
                assert_eq!(request.at.visibility, Visibility::Visible);
                assert_eq!(request.text, "hi");
            }
            other => panic!("expected createTextView, got {other:?}"),
        }
    }

    #[test]
    fn groups_cover_every_handler_set() {
        let groups: HashSet<HandlerGroup> =
            MethodTag::ALL.iter().map(|tag| tag.group()).collect();
        assert_eq!(groups.len(), 7);
    }
}
