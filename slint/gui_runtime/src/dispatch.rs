//! The per-connection read loop and the operation table.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::ProtocolError;
use crate::handlers::{
    HandlerContext, HandlerResult, activity, buffer, create, global, notification, remote, view,
};
use crate::methods::Method;
use crate::protocol::{decode_method, read_frame};
use crate::registry::lock;

/// Why a session's read loop stopped.
#[derive(Debug)]
pub enum Termination {
    /// The client closed the stream between frames.
    EndOfStream,
    /// A request carried no method.
    EmptyRequest,
    Protocol(ProtocolError),
    Interrupted,
}

type UnblockHook = Box<dyn Fn() + Send>;

/// Stops a running read loop from another thread.
///
/// The flag is checked before every read. A loop already blocked in a read
/// only notices after the read returns, so hosts install an unblock hook
/// (typically shutting down the read half of the socket).
#[derive(Clone, Default)]
pub struct Interrupter {
    flag: Arc<AtomicBool>,
    unblock: Arc<Mutex<Option<UnblockHook>>>,
}

impl Interrupter {
    pub fn on_interrupt(&self, hook: impl Fn() + Send + 'static) {
        *lock(&self.unblock) = Some(Box::new(hook));
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Some(hook) = lock(&self.unblock).as_ref() {
            hook();
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Interrupter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interrupter")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

/// Reads requests one at a time and hands each to its handler.
pub struct Dispatcher {
    ctx: HandlerContext,
    max_frame_bytes: usize,
    interrupter: Interrupter,
}

impl Dispatcher {
    pub fn new(ctx: HandlerContext, max_frame_bytes: usize, interrupter: Interrupter) -> Self {
        Self {
            ctx,
            max_frame_bytes,
            interrupter,
        }
    }

    pub fn context(&self) -> &HandlerContext {
        &self.ctx
    }

    /// Serves requests until the stream ends, a request is empty or
    /// malformed, writing a response fails, or the loop is interrupted.
    pub fn run(&self, reader: &mut impl Read) -> Termination {
        loop {
            if self.interrupter.is_interrupted() {
                return Termination::Interrupted;
            }

            let payload = match read_frame(reader, self.max_frame_bytes) {
                Ok(payload) => payload,
                Err(_) if self.interrupter.is_interrupted() => return Termination::Interrupted,
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    return Termination::EndOfStream;
                }
                Err(err) => return Termination::Protocol(err.into()),
            };

            let method = match decode_method(&payload) {
                Ok(Some(method)) => method,
                Ok(None) => return Termination::EmptyRequest,
                Err(err) => return Termination::Protocol(err),
            };

            let op = method.tag().name();
            tracing::trace!(op, "dispatch");
            if let Err(err) = self.dispatch(method) {
                if self.interrupter.is_interrupted() {
                    return Termination::Interrupted;
                }
                tracing::warn!(op, %err, "response write failed");
                return Termination::Protocol(err);
            }
        }
    }

    pub fn dispatch(&self, method: Method) -> HandlerResult {
        let ctx = &self.ctx;
        match method {
            Method::NewActivity(request) => activity::new_activity(ctx, request),
            Method::FinishActivity(request) => activity::finish_activity(ctx, request),
            Method::MoveTaskToBack(request) => activity::move_task_to_back(ctx, request),
            Method::SetTheme(request) => activity::set_theme(ctx, request),
            Method::SetTaskDescription(request) => activity::set_task_description(ctx, request),
            Method::SetPiPParams(request) => activity::set_pip_params(ctx, request),
            Method::SetInputMode(request) => activity::set_input_mode(ctx, request),
            Method::SetPiPMode(request) => activity::set_pip_mode(ctx, request),
            Method::SetPiPModeAuto(request) => activity::set_pip_mode_auto(ctx, request),
            Method::KeepScreenOn(request) => activity::keep_screen_on(ctx, request),
            Method::SetOrientation(request) => activity::set_orientation(ctx, request),
            Method::SetPosition(request) => activity::set_position(ctx, request),
            Method::GetConfiguration(request) => activity::get_configuration(ctx, request),
            Method::RequestUnlock(request) => activity::request_unlock(ctx, request),
            Method::HideSoftKeyboard(request) => activity::hide_soft_keyboard(ctx, request),
            Method::InterceptBackButton(request) => activity::intercept_back_button(ctx, request),
            Method::SetSecure(request) => activity::set_secure(ctx, request),
            Method::InterceptVolume(request) => activity::intercept_volume(ctx, request),
            Method::ConfigInsets(request) => activity::config_insets(ctx, request),
            Method::SendOverlayTouch(request) => activity::send_overlay_touch(ctx, request),

            Method::FinishTask(request) => global::finish_task(ctx, request),
            Method::BringTaskToFront(request) => global::bring_task_to_front(ctx, request),
            Method::Toast(request) => global::toast(ctx, request),
            Method::TurnScreenOn(request) => global::turn_screen_on(ctx, request),
            Method::IsLocked(request) => global::is_locked(ctx, request),
            Method::Version(request) => global::version(ctx, request),
            Method::SetLogLevel(request) => global::set_log_level(ctx, request),
            Method::GetLog(request) => global::get_log(ctx, request),

            Method::CreateLinearLayout(request) => create::linear_layout(ctx, request),
            Method::CreateFrameLayout(request) => create::frame_layout(ctx, request),
            Method::CreateSwipeRefreshLayout(request) => create::swipe_refresh_layout(ctx, request),
            Method::CreateTextView(request) => create::text_view(ctx, request),
            Method::CreateEditText(request) => create::edit_text(ctx, request),
            Method::CreateButton(request) => create::button(ctx, request),
            Method::CreateImageView(request) => create::image_view(ctx, request),
            Method::CreateSpace(request) => create::space(ctx, request),
            Method::CreateNestedScrollView(request) => create::nested_scroll_view(ctx, request),
            Method::CreateHorizontalScrollView(request) => {
                create::horizontal_scroll_view(ctx, request)
            }
            Method::CreateRadioGroup(request) => create::radio_group(ctx, request),
            Method::CreateRadioButton(request) => create::radio_button(ctx, request),
            Method::CreateCheckbox(request) => create::checkbox(ctx, request),
            Method::CreateToggleButton(request) => create::toggle_button(ctx, request),
            Method::CreateSwitch(request) => create::switch(ctx, request),
            Method::CreateSpinner(request) => create::spinner(ctx, request),
            Method::CreateProgressBar(request) => create::progress_bar(ctx, request),
            Method::CreateTabLayout(request) => create::tab_layout(ctx, request),
            Method::CreateWebView(request) => create::web_view(ctx, request),
            Method::CreateGridLayout(request) => create::grid_layout(ctx, request),
            Method::CreateSurfaceView(request) => create::surface_view(ctx, request),

            Method::ShowCursor(request) => view::show_cursor(ctx, request),
            Method::SetLinearLayout(request) => view::set_linear_layout(ctx, request),
            Method::SetGridLayout(request) => view::set_grid_layout(ctx, request),
            Method::SetLocation(request) => view::set_location(ctx, request),
            Method::SetRelative(request) => view::set_relative(ctx, request),
            Method::SetVisibility(request) => view::set_visibility(ctx, request),
            Method::SetWidth(request) => view::set_width(ctx, request),
            Method::SetHeight(request) => view::set_height(ctx, request),
            Method::GetDimensions(request) => view::get_dimensions(ctx, request),
            Method::DeleteView(request) => view::delete_view(ctx, request),
            Method::DeleteChildren(request) => view::delete_children(ctx, request),
            Method::SetMargin(request) => view::set_margin(ctx, request),
            Method::SetPadding(request) => view::set_padding(ctx, request),
            Method::SetBackgroundColor(request) => view::set_background_color(ctx, request),
            Method::SetTextColor(request) => view::set_text_color(ctx, request),
            Method::SetProgress(request) => view::set_progress(ctx, request),
            Method::SetRefreshing(request) => view::set_refreshing(ctx, request),
            Method::SetText(request) => view::set_text(ctx, request),
            Method::SetGravity(request) => view::set_gravity(ctx, request),
            Method::SetTextSize(request) => view::set_text_size(ctx, request),
            Method::GetText(request) => view::get_text(ctx, request),
            Method::RequestFocus(request) => view::request_focus(ctx, request),
            Method::GetScrollPosition(request) => view::get_scroll_position(ctx, request),
            Method::SetScrollPosition(request) => view::set_scroll_position(ctx, request),
            Method::SetList(request) => view::set_list(ctx, request),
            Method::SetImage(request) => view::set_image(ctx, request),
            Method::SetBuffer(request) => view::set_buffer(ctx, request),
            Method::RefreshImageView(request) => view::refresh_image_view(ctx, request),
            Method::SelectTab(request) => view::select_tab(ctx, request),
            Method::SelectItem(request) => view::select_item(ctx, request),
            Method::SetClickable(request) => view::set_clickable(ctx, request),
            Method::SetChecked(request) => view::set_checked(ctx, request),
            Method::SetSurfaceBuffer(request) => view::set_surface_buffer(ctx, request),
            Method::SurfaceConfig(request) => view::surface_config(ctx, request),
            Method::AllowJs(request) => view::allow_js(ctx, request),
            Method::AllowContent(request) => view::allow_content(ctx, request),
            Method::SetData(request) => view::set_data(ctx, request),
            Method::LoadUri(request) => view::load_uri(ctx, request),
            Method::AllowNavigation(request) => view::allow_navigation(ctx, request),
            Method::GoBack(request) => view::go_back(ctx, request),
            Method::GoForward(request) => view::go_forward(ctx, request),
            Method::EvaluateJs(request) => view::evaluate_js(ctx, request),
            Method::SendClickEvent(request) => view::send_click_event(ctx, request),
            Method::SendLongClickEvent(request) => view::send_long_click_event(ctx, request),
            Method::SendFocusChangeEvent(request) => view::send_focus_change_event(ctx, request),
            Method::SendTouchEvent(request) => view::send_touch_event(ctx, request),
            Method::SendTextEvent(request) => view::send_text_event(ctx, request),

            Method::AddBuffer(request) => buffer::add_buffer(ctx, request),
            Method::DeleteBuffer(request) => buffer::delete_buffer(ctx, request),
            Method::BlitBuffer(request) => buffer::blit_buffer(ctx, request),
            Method::CreateHardwareBuffer(spec) => buffer::create_hardware_buffer(ctx, spec),
            Method::DestroyHardwareBuffer(request) => buffer::destroy_hardware_buffer(ctx, request),

            Method::CreateRemoteLayout(request) => remote::create_layout(ctx, request),
            Method::DeleteRemoteLayout(request) => remote::delete_layout(ctx, request),
            Method::AddRemoteFrameLayout(request) => remote::add_frame_layout(ctx, request),
            Method::AddRemoteLinearLayout(request) => remote::add_linear_layout(ctx, request),
            Method::AddRemoteTextView(request) => remote::add_text_view(ctx, request),
            Method::AddRemoteButton(request) => remote::add_button(ctx, request),
            Method::AddRemoteImageView(request) => remote::add_image_view(ctx, request),
            Method::AddRemoteProgressBar(request) => remote::add_progress_bar(ctx, request),
            Method::SetRemoteBackgroundColor(request) => {
                remote::set_background_color(ctx, request)
            }
            Method::SetRemoteProgressBar(request) => remote::set_progress_bar(ctx, request),
            Method::SetRemoteText(request) => remote::set_text(ctx, request),
            Method::SetRemoteTextSize(request) => remote::set_text_size(ctx, request),
            Method::SetRemoteTextColor(request) => remote::set_text_color(ctx, request),
            Method::SetRemoteVisibility(request) => remote::set_visibility(ctx, request),
            Method::SetRemotePadding(request) => remote::set_padding(ctx, request),
            Method::SetRemoteImage(request) => remote::set_image(ctx, request),
            Method::SetWidgetLayout(request) => remote::set_widget_layout(ctx, request),

            Method::CreateChannel(request) => notification::create_channel(ctx, request),
            Method::CreateNotification(request) => notification::create_notification(ctx, request),
            Method::CancelNotification(request) => notification::cancel_notification(ctx, request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::SharedBuf;
    use crate::handlers::{HandlerContext, Responder};
    use crate::headless::HeadlessPlatform;
    use crate::logger::Logger;
    use crate::methods::{Empty, Toast};
    use crate::protocol::{ServerFrame, encode_method, shared_writer, write_frame};
    use crate::registry::Registries;
    use crate::responses::Response;
    use std::io::Cursor;

    const CAP: usize = 1 << 20;

    fn dispatcher(out: &SharedBuf, interrupter: Interrupter) -> Dispatcher {
        let ctx = HandlerContext::new(
            Arc::new(Registries::default()),
            Arc::new(HeadlessPlatform::new()),
            Arc::new(Logger::new(0)),
            Responder::new(shared_writer(out.clone()), CAP),
        );
        Dispatcher::new(ctx, CAP, interrupter)
    }

    fn frames(payloads: &[Vec<u8>]) -> Cursor<Vec<u8>> {
        let mut bytes = Vec::new();
        for payload in payloads {
            write_frame(&mut bytes, payload, CAP).expect("frame");
        }
        Cursor::new(bytes)
    }

    fn responses(out: &SharedBuf) -> Vec<Response> {
        let bytes = lock(&out.0).clone();
        let mut cursor = Cursor::new(bytes);
        let mut responses = Vec::new();
        while (cursor.position() as usize) < cursor.get_ref().len() {
            let payload = read_frame(&mut cursor, CAP).expect("frame");
            match serde_json::from_slice(&payload).expect("server frame") {
                ServerFrame::Response(response) => responses.push(response),
                other => panic!("expected response, got {other:?}"),
            }
        }
        responses
    }

    #[test]
    fn serves_requests_in_order_until_eof() {
        let out = SharedBuf::default();
        let dispatcher = dispatcher(&out, Interrupter::default());
        let mut input = frames(&[
            encode_method(&Method::Version(Empty {})).expect("encode"),
            encode_method(&Method::IsLocked(Empty {})).expect("encode"),
        ]);

        let termination = dispatcher.run(&mut input);
        assert!(matches!(termination, Termination::EndOfStream), "got {termination:?}");
        assert_eq!(
            responses(&out),
            vec![
                Response::Version { version_code: 1 },
                Response::Locked { locked: false },
            ]
        );
    }

    #[test]
    fn empty_request_stops_before_later_frames() {
        let out = SharedBuf::default();
        let dispatcher = dispatcher(&out, Interrupter::default());
        let mut input = frames(&[
            b"{}".to_vec(),
            encode_method(&Method::Version(Empty {})).expect("encode"),
        ]);

        let termination = dispatcher.run(&mut input);
        assert!(matches!(termination, Termination::EmptyRequest), "got {termination:?}");
        assert!(responses(&out).is_empty());
    }

    #[test]
    fn malformed_request_is_protocol_error() {
        let out = SharedBuf::default();
        let dispatcher = dispatcher(&out, Interrupter::default());
        let mut input = frames(&[br#"{"noSuchMethod":{}}"#.to_vec()]);

        let termination = dispatcher.run(&mut input);
        assert!(
            matches!(termination, Termination::Protocol(ProtocolError::Decode(_))),
            "got {termination:?}"
        );
    }

    #[test]
    fn oversized_frame_is_protocol_error() {
        let out = SharedBuf::default();
        let dispatcher = dispatcher(&out, Interrupter::default());
        let mut input = Cursor::new(((CAP as u32) + 1).to_be_bytes().to_vec());

        match dispatcher.run(&mut input) {
            Termination::Protocol(ProtocolError::Io(err)) => {
                assert_eq!(err.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("expected oversize failure, got {other:?}"),
        }
    }

    #[test]
    fn interrupted_loop_reads_nothing() {
        let out = SharedBuf::default();
        let interrupter = Interrupter::default();
        let dispatcher = dispatcher(&out, interrupter.clone());
        let hooked = Arc::new(AtomicBool::new(false));
        let flag = hooked.clone();
        interrupter.on_interrupt(move || flag.store(true, Ordering::SeqCst));
        interrupter.interrupt();

        let mut input = frames(&[encode_method(&Method::Toast(Toast {
            text: "hi".to_string(),
            long: false,
        }))
        .expect("encode")]);
        let termination = dispatcher.run(&mut input);
        assert!(matches!(termination, Termination::Interrupted), "got {termination:?}");
        assert!(hooked.load(Ordering::SeqCst));
        assert!(responses(&out).is_empty());
    }
}
