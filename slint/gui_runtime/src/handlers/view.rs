use crate::error::HandlerError;
use crate::handle::{Handle, optional};
use crate::methods::{
    EvaluateJs, LoadUri, RequestFocus, SelectIndex, SetBuffer, SetColor, SetData, SetGravity,
    SetGridLayout, SetImage, SetLinearLayout, SetList, SetLocation, SetProgress, SetRelative,
    SetScrollPosition, SetSize, SetSpacing, SetText, SetTextSize, SetVisibility, SurfaceConfig,
    ViewRef, ViewToggle,
};
use crate::model::{EventSubscriptions, View, ViewKind, ViewSize, argb};
use crate::platform::ViewMutation;
use crate::responses::Response;

use super::{HandlerContext, HandlerResult, any_view};

fn text_view(kind: ViewKind) -> bool {
    kind.has_text()
}

fn edit_text(kind: ViewKind) -> bool {
    kind == ViewKind::EditText
}

fn progress_bar(kind: ViewKind) -> bool {
    kind == ViewKind::ProgressBar
}

fn swipe_refresh(kind: ViewKind) -> bool {
    kind == ViewKind::SwipeRefreshLayout
}

fn scroll_view(kind: ViewKind) -> bool {
    kind.is_scroll()
}

fn list_view(kind: ViewKind) -> bool {
    matches!(kind, ViewKind::Spinner | ViewKind::TabLayout)
}

fn image_view(kind: ViewKind) -> bool {
    kind == ViewKind::ImageView
}

fn tab_layout(kind: ViewKind) -> bool {
    kind == ViewKind::TabLayout
}

fn spinner(kind: ViewKind) -> bool {
    kind == ViewKind::Spinner
}

fn checkable(kind: ViewKind) -> bool {
    kind.is_checkable()
}

fn surface_view(kind: ViewKind) -> bool {
    kind == ViewKind::SurfaceView
}

fn web_view(kind: ViewKind) -> bool {
    kind == ViewKind::WebView
}

fn container(kind: ViewKind) -> bool {
    kind.is_container()
}

/// Checks the view and applies `mutation` through the platform.
fn apply(
    ctx: &HandlerContext,
    aid: Handle,
    id: Handle,
    expected: &'static str,
    accepts: fn(ViewKind) -> bool,
    mutation: ViewMutation,
) -> Result<View, HandlerError> {
    let view = ctx.view_of(aid, id, expected, accepts)?;
    ctx.update(aid, id, &mutation)?;
    Ok(view)
}

fn apply_any(
    ctx: &HandlerContext,
    aid: Handle,
    id: Handle,
    mutation: ViewMutation,
) -> Result<(), HandlerError> {
    apply(ctx, aid, id, "any view", any_view, mutation).map(|_| ())
}

pub fn show_cursor(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    let result = apply(
        ctx,
        request.aid,
        request.id,
        "an edit text",
        edit_text,
        ViewMutation::ShowCursor(request.enabled),
    )
    .map(|_| ());
    ctx.ack("showCursor", result)
}

pub fn set_linear_layout(ctx: &HandlerContext, request: SetLinearLayout) -> HandlerResult {
    let mutation = ViewMutation::LinearLayoutParams {
        weight: request.weight,
        position: request.position,
    };
    ctx.ack(
        "setLinearLayout",
        apply_any(ctx, request.aid, request.id, mutation),
    )
}

pub fn set_grid_layout(ctx: &HandlerContext, request: SetGridLayout) -> HandlerResult {
    let result = if request.row < 0
        || request.col < 0
        || request.row_size < 1
        || request.col_size < 1
    {
        Err(HandlerError::invalid("grid position out of range"))
    } else {
        let mutation = ViewMutation::GridLayoutParams {
            row: request.row,
            column: request.col,
            row_span: request.row_size,
            column_span: request.col_size,
            row_align: request.row_align,
            column_align: request.col_align,
        };
        apply_any(ctx, request.aid, request.id, mutation)
    };
    ctx.ack("setGridLayout", result)
}

pub fn set_location(ctx: &HandlerContext, request: SetLocation) -> HandlerResult {
    let mutation = ViewMutation::Location {
        x: request.x,
        y: request.y,
        unit: request.unit,
        top: request.top,
    };
    ctx.ack(
        "setLocation",
        apply_any(ctx, request.aid, request.id, mutation),
    )
}

/// Relative-layout rules. Anchors must be views of the same activity.
pub fn set_relative(ctx: &HandlerContext, request: SetRelative) -> HandlerResult {
    let aid = request.aid;
    let rules: Result<Vec<(String, Option<Handle>)>, HandlerError> = request
        .rules
        .into_iter()
        .map(|rule| -> Result<(String, Option<Handle>), HandlerError> {
            let anchor = optional(rule.anchor);
            if let Some(anchor) = anchor {
                ctx.view(aid, anchor)?;
            }
            Ok((rule.rule, anchor))
        })
        .collect();

    let result =
        rules.and_then(|rules| apply_any(ctx, aid, request.id, ViewMutation::Relative(rules)));
    ctx.ack("setRelative", result)
}

pub fn set_visibility(ctx: &HandlerContext, request: SetVisibility) -> HandlerResult {
    let result = apply_any(
        ctx,
        request.aid,
        request.id,
        ViewMutation::Visibility(request.visibility),
    )
    .and_then(|()| ctx.record(request.id, |view| view.visibility = request.visibility));
    ctx.ack("setVisibility", result)
}

fn valid_size(size: ViewSize) -> Result<ViewSize, HandlerError> {
    match size {
        ViewSize::Exact { value, .. } if value < 0.0 || !value.is_finite() => {
            Err(HandlerError::invalid("size must be non-negative"))
        }
        size => Ok(size),
    }
}

pub fn set_width(ctx: &HandlerContext, request: SetSize) -> HandlerResult {
    let result = valid_size(request.size)
        .and_then(|size| apply_any(ctx, request.aid, request.id, ViewMutation::Width(size)));
    ctx.ack("setWidth", result)
}

pub fn set_height(ctx: &HandlerContext, request: SetSize) -> HandlerResult {
    let result = valid_size(request.size)
        .and_then(|size| apply_any(ctx, request.aid, request.id, ViewMutation::Height(size)));
    ctx.ack("setHeight", result)
}

pub fn get_dimensions(ctx: &HandlerContext, request: ViewRef) -> HandlerResult {
    let result = ctx
        .view(request.aid, request.id)
        .and_then(|_| Ok(ctx.platform.view_dimensions(request.aid, request.id)?));
    ctx.reply(
        "getDimensions",
        result,
        |(width, height)| Response::Dimensions {
            width,
            height,
            code: None,
        },
        |code| Response::Dimensions {
            width: 0,
            height: 0,
            code: Some(code),
        },
    )
}

fn destroy_all(ctx: &HandlerContext, aid: Handle, removed: Vec<(Handle, View)>) {
    for (id, _) in removed {
        ctx.platform.destroy_view(aid, id);
    }
}

/// Deletes a view together with all of its descendants.
pub fn delete_view(ctx: &HandlerContext, request: ViewRef) -> HandlerResult {
    let ViewRef { aid, id } = request;
    let result = ctx.view(aid, id).map(|_| {
        let removed = ctx.registries.remove_view_tree(aid, id, true);
        destroy_all(ctx, aid, removed);
    });
    ctx.ack("deleteView", result)
}

pub fn delete_children(ctx: &HandlerContext, request: ViewRef) -> HandlerResult {
    let ViewRef { aid, id } = request;
    let result = ctx.view_of(aid, id, "a layout", container).map(|_| {
        let removed = ctx.registries.remove_view_tree(aid, id, false);
        destroy_all(ctx, aid, removed);
    });
    ctx.ack("deleteChildren", result)
}

fn spacing(request: &SetSpacing) -> Result<(), HandlerError> {
    if request.value.is_finite() {
        Ok(())
    } else {
        Err(HandlerError::invalid("spacing must be finite"))
    }
}

pub fn set_margin(ctx: &HandlerContext, request: SetSpacing) -> HandlerResult {
    let result = spacing(&request).and_then(|()| {
        let mutation = ViewMutation::Margin {
            value: request.value,
            unit: request.unit,
            direction: request.direction,
        };
        apply_any(ctx, request.aid, request.id, mutation)
    });
    ctx.ack("setMargin", result)
}

pub fn set_padding(ctx: &HandlerContext, request: SetSpacing) -> HandlerResult {
    let result = spacing(&request).and_then(|()| {
        let mutation = ViewMutation::Padding {
            value: request.value,
            unit: request.unit,
            direction: request.direction,
        };
        apply_any(ctx, request.aid, request.id, mutation)
    });
    ctx.ack("setPadding", result)
}

pub fn set_background_color(ctx: &HandlerContext, request: SetColor) -> HandlerResult {
    let mutation = ViewMutation::BackgroundColor(argb(request.color));
    ctx.ack(
        "setBackgroundColor",
        apply_any(ctx, request.aid, request.id, mutation),
    )
}

pub fn set_text_color(ctx: &HandlerContext, request: SetColor) -> HandlerResult {
    let result = apply(
        ctx,
        request.aid,
        request.id,
        "a text view",
        text_view,
        ViewMutation::TextColor(argb(request.color)),
    )
    .map(|_| ());
    ctx.ack("setTextColor", result)
}

pub fn set_progress(ctx: &HandlerContext, request: SetProgress) -> HandlerResult {
    let result = if (0..=100).contains(&request.progress) {
        apply(
            ctx,
            request.aid,
            request.id,
            "a progress bar",
            progress_bar,
            ViewMutation::Progress(request.progress),
        )
        .and_then(|_| ctx.record(request.id, |view| view.progress = request.progress))
    } else {
        Err(HandlerError::invalid("progress must be within 0..=100"))
    };
    ctx.ack("setProgress", result)
}

pub fn set_refreshing(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    let result = apply(
        ctx,
        request.aid,
        request.id,
        "a swipe refresh layout",
        swipe_refresh,
        ViewMutation::Refreshing(request.enabled),
    )
    .map(|_| ());
    ctx.ack("setRefreshing", result)
}

pub fn set_text(ctx: &HandlerContext, request: SetText) -> HandlerResult {
    let SetText { aid, id, text } = request;
    let result = apply(
        ctx,
        aid,
        id,
        "a text view",
        text_view,
        ViewMutation::Text(text.clone()),
    )
    .and_then(|_| ctx.record(id, |view| view.text = text));
    ctx.ack("setText", result)
}

pub fn set_gravity(ctx: &HandlerContext, request: SetGravity) -> HandlerResult {
    let result = apply(
        ctx,
        request.aid,
        request.id,
        "a text view",
        text_view,
        ViewMutation::Gravity {
            horizontal: request.horizontal,
            vertical: request.vertical,
        },
    )
    .map(|_| ());
    ctx.ack("setGravity", result)
}

pub fn set_text_size(ctx: &HandlerContext, request: SetTextSize) -> HandlerResult {
    let result = if request.size > 0.0 && request.size.is_finite() {
        apply(
            ctx,
            request.aid,
            request.id,
            "a text view",
            text_view,
            ViewMutation::TextSize(request.size),
        )
        .map(|_| ())
    } else {
        Err(HandlerError::invalid("text size must be positive"))
    };
    ctx.ack("setTextSize", result)
}

pub fn get_text(ctx: &HandlerContext, request: ViewRef) -> HandlerResult {
    let result = ctx
        .view_of(request.aid, request.id, "a text view", text_view)
        .map(|view| view.text);
    ctx.reply(
        "getText",
        result,
        |text| Response::Text { text, code: None },
        |code| Response::Text {
            text: String::new(),
            code: Some(code),
        },
    )
}

pub fn request_focus(ctx: &HandlerContext, request: RequestFocus) -> HandlerResult {
    let mutation = ViewMutation::Focus {
        force_soft: request.force_soft,
    };
    ctx.ack(
        "requestFocus",
        apply_any(ctx, request.aid, request.id, mutation),
    )
}

pub fn get_scroll_position(ctx: &HandlerContext, request: ViewRef) -> HandlerResult {
    let result = ctx
        .view_of(request.aid, request.id, "a scroll view", scroll_view)
        .and_then(|_| Ok(ctx.platform.scroll_position(request.aid, request.id)?));
    ctx.reply(
        "getScrollPosition",
        result,
        |(x, y)| Response::ScrollPosition { x, y, code: None },
        |code| Response::ScrollPosition {
            x: 0,
            y: 0,
            code: Some(code),
        },
    )
}

pub fn set_scroll_position(ctx: &HandlerContext, request: SetScrollPosition) -> HandlerResult {
    let result = apply(
        ctx,
        request.aid,
        request.id,
        "a scroll view",
        scroll_view,
        ViewMutation::Scroll {
            x: request.x,
            y: request.y,
            smooth: request.smooth,
        },
    )
    .map(|_| ());
    ctx.ack("setScrollPosition", result)
}

pub fn set_list(ctx: &HandlerContext, request: SetList) -> HandlerResult {
    let SetList { aid, id, list } = request;
    let result = apply(
        ctx,
        aid,
        id,
        "a spinner or tab layout",
        list_view,
        ViewMutation::List(list.clone()),
    )
    .and_then(|_| {
        ctx.record(id, |view| {
            view.items = list;
            view.selected = None;
        })
    });
    ctx.ack("setList", result)
}

pub fn set_image(ctx: &HandlerContext, request: SetImage) -> HandlerResult {
    let SetImage { aid, id, image } = request;
    let result = if image.is_empty() {
        Err(HandlerError::invalid("empty image"))
    } else {
        apply(
            ctx,
            aid,
            id,
            "an image view",
            image_view,
            ViewMutation::Image(image),
        )
        .and_then(|_| ctx.record(id, |view| view.buffer = None))
    };
    ctx.ack("setImage", result)
}

fn buffer_pixels(
    ctx: &HandlerContext,
    buffer: Handle,
) -> Result<slint::SharedPixelBuffer<slint::Rgba8Pixel>, HandlerError> {
    Ok(ctx
        .registries
        .buffers
        .with(buffer, |buffer| buffer.pixels.clone())?)
}

/// Binds a pixel buffer to an image view and shows its current contents.
pub fn set_buffer(ctx: &HandlerContext, request: SetBuffer) -> HandlerResult {
    let SetBuffer { aid, id, buffer } = request;
    let result = ctx
        .view_of(aid, id, "an image view", image_view)
        .and_then(|_| buffer_pixels(ctx, buffer))
        .and_then(|pixels| ctx.update(aid, id, &ViewMutation::Buffer(pixels)))
        .and_then(|()| ctx.record(id, |view| view.buffer = Some(buffer)));
    ctx.ack("setBuffer", result)
}

pub fn refresh_image_view(ctx: &HandlerContext, request: ViewRef) -> HandlerResult {
    let ViewRef { aid, id } = request;
    let result = ctx
        .view_of(aid, id, "an image view", image_view)
        .and_then(|view| {
            view.buffer.ok_or_else(|| {
                HandlerError::invalid(format!("image view {id} has no buffer"))
            })
        })
        .and_then(|buffer| buffer_pixels(ctx, buffer))
        .and_then(|pixels| ctx.update(aid, id, &ViewMutation::Buffer(pixels)));
    ctx.ack("refreshImageView", result)
}

fn select(
    ctx: &HandlerContext,
    request: SelectIndex,
    expected: &'static str,
    accepts: fn(ViewKind) -> bool,
    mutation: fn(i32) -> ViewMutation,
) -> Result<(), HandlerError> {
    let SelectIndex { aid, id, index } = request;
    let view = ctx.view_of(aid, id, expected, accepts)?;
    if index < 0 || index as usize >= view.items.len() {
        return Err(HandlerError::invalid(format!(
            "index {index} out of range for {} items",
            view.items.len()
        )));
    }
    ctx.update(aid, id, &mutation(index))?;
    ctx.record(id, |view| view.selected = Some(index))
}

pub fn select_tab(ctx: &HandlerContext, request: SelectIndex) -> HandlerResult {
    let result = select(
        ctx,
        request,
        "a tab layout",
        tab_layout,
        ViewMutation::SelectTab,
    );
    ctx.ack("selectTab", result)
}

pub fn select_item(ctx: &HandlerContext, request: SelectIndex) -> HandlerResult {
    let result = select(ctx, request, "a spinner", spinner, ViewMutation::SelectItem);
    ctx.ack("selectItem", result)
}

pub fn set_clickable(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    let result = apply_any(
        ctx,
        request.aid,
        request.id,
        ViewMutation::Clickable(request.enabled),
    )
    .and_then(|()| ctx.record(request.id, |view| view.clickable = request.enabled));
    ctx.ack("setClickable", result)
}

pub fn set_checked(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    let result = apply(
        ctx,
        request.aid,
        request.id,
        "a compound button",
        checkable,
        ViewMutation::Checked(request.enabled),
    )
    .and_then(|_| ctx.record(request.id, |view| view.checked = request.enabled));
    ctx.ack("setChecked", result)
}

/// Shows a hardware buffer on a surface view.
pub fn set_surface_buffer(ctx: &HandlerContext, request: SetBuffer) -> HandlerResult {
    let SetBuffer { aid, id, buffer } = request;
    let result = ctx
        .view_of(aid, id, "a surface view", surface_view)
        .and_then(|_| {
            ctx.registries
                .hardware_buffers
                .with(buffer, |hardware| hardware.raw.id())
                .map_err(HandlerError::from)
        })
        .and_then(|raw| ctx.update(aid, id, &ViewMutation::SurfaceBuffer(Some(raw))))
        .and_then(|()| ctx.record(id, |view| view.surface_buffer = Some(buffer)));
    ctx.ack("setSurfaceBuffer", result)
}

pub fn surface_config(ctx: &HandlerContext, request: SurfaceConfig) -> HandlerResult {
    let result = if request.framerate < 0.0 || !request.framerate.is_finite() {
        Err(HandlerError::invalid("frame rate must be non-negative"))
    } else {
        apply(
            ctx,
            request.aid,
            request.id,
            "a surface view",
            surface_view,
            ViewMutation::SurfaceConfig {
                background: argb(request.background),
                x_mode: request.x_mode,
                y_mode: request.y_mode,
                frame_rate: request.framerate,
            },
        )
        .map(|_| ())
    };
    ctx.ack("surfaceConfig", result)
}

fn web(
    ctx: &HandlerContext,
    op: &str,
    aid: Handle,
    id: Handle,
    mutation: ViewMutation,
) -> HandlerResult {
    let result = apply(ctx, aid, id, "a web view", web_view, mutation).map(|_| ());
    ctx.ack(op, result)
}

pub fn allow_js(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    web(
        ctx,
        "allowJS",
        request.aid,
        request.id,
        ViewMutation::AllowJavascript(request.enabled),
    )
}

pub fn allow_content(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    web(
        ctx,
        "allowContent",
        request.aid,
        request.id,
        ViewMutation::AllowContent(request.enabled),
    )
}

pub fn allow_navigation(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    web(
        ctx,
        "allowNavigation",
        request.aid,
        request.id,
        ViewMutation::AllowNavigation(request.enabled),
    )
}

pub fn set_data(ctx: &HandlerContext, request: SetData) -> HandlerResult {
    let SetData {
        aid,
        id,
        data,
        mime,
        base64,
    } = request;
    let mime = if mime.is_empty() {
        "text/html".to_string()
    } else {
        mime
    };
    web(
        ctx,
        "setData",
        aid,
        id,
        ViewMutation::Data { data, mime, base64 },
    )
}

pub fn load_uri(ctx: &HandlerContext, request: LoadUri) -> HandlerResult {
    if request.uri.is_empty() {
        return ctx.ack("loadURI", Err(HandlerError::invalid("empty uri")));
    }
    web(
        ctx,
        "loadURI",
        request.aid,
        request.id,
        ViewMutation::LoadUri(request.uri),
    )
}

pub fn go_back(ctx: &HandlerContext, request: ViewRef) -> HandlerResult {
    web(ctx, "goBack", request.aid, request.id, ViewMutation::GoBack)
}

pub fn go_forward(ctx: &HandlerContext, request: ViewRef) -> HandlerResult {
    web(
        ctx,
        "goForward",
        request.aid,
        request.id,
        ViewMutation::GoForward,
    )
}

pub fn evaluate_js(ctx: &HandlerContext, request: EvaluateJs) -> HandlerResult {
    web(
        ctx,
        "evaluateJS",
        request.aid,
        request.id,
        ViewMutation::EvaluateJavascript(request.code),
    )
}

fn subscribe(
    ctx: &HandlerContext,
    op: &str,
    request: ViewToggle,
    expected: &'static str,
    accepts: fn(ViewKind) -> bool,
    field: fn(&mut EventSubscriptions) -> &mut bool,
) -> HandlerResult {
    let ViewToggle { aid, id, enabled } = request;
    let result = ctx
        .view_of(aid, id, expected, accepts)
        .and_then(|_| ctx.record(id, |view| *field(&mut view.events) = enabled));
    ctx.ack(op, result)
}

pub fn send_click_event(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    subscribe(ctx, "sendClickEvent", request, "a view", any_view, |events| {
        &mut events.click
    })
}

pub fn send_long_click_event(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    subscribe(ctx, "sendLongClickEvent", request, "a view", any_view, |events| {
        &mut events.long_click
    })
}

pub fn send_focus_change_event(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    subscribe(ctx, "sendFocusChangeEvent", request, "a view", any_view, |events| {
        &mut events.focus_change
    })
}

pub fn send_touch_event(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    subscribe(ctx, "sendTouchEvent", request, "a view", any_view, |events| {
        &mut events.touch
    })
}

pub fn send_text_event(ctx: &HandlerContext, request: ViewToggle) -> HandlerResult {
    subscribe(ctx, "sendTextEvent", request, "a text view", text_view, |events| {
        &mut events.text
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handle::NO_HANDLE;
    use crate::handlers::test_support::Harness;
    use crate::model::PixelBuffer;
    use crate::platform::{ActivityOptions, Platform, WidgetSpec};

    /// Activity plus a view known to both the registry and the platform.
    fn setup(kind_spec: WidgetSpec) -> (Harness, Handle, Handle) {
        let harness = Harness::new();
        let aid = harness.activity();
        harness
            .platform
            .launch_activity(aid, NO_HANDLE, &ActivityOptions::default())
            .expect("launch");
        let id = harness.view(aid, kind_spec.kind(), None);
        harness
            .platform
            .create_view(aid, id, None, &kind_spec)
            .expect("platform view");
        (harness, aid, id)
    }

    fn text_spec() -> WidgetSpec {
        WidgetSpec::TextView {
            text: String::new(),
            selectable: false,
            clickable_links: false,
        }
    }

    #[test]
    fn set_text_updates_model_and_platform() {
        let (harness, aid, id) = setup(text_spec());
        set_text(
            &harness.ctx,
            SetText {
                aid,
                id,
                text: "hello".to_string(),
            },
        )
        .expect("respond");
        get_text(&harness.ctx, ViewRef { aid, id }).expect("respond");

        assert_eq!(
            harness.responses(),
            vec![
                Response::ok(),
                Response::Text {
                    text: "hello".to_string(),
                    code: None
                },
            ]
        );
        assert_eq!(
            harness.platform.view(aid, id).map(|view| view.text),
            Some("hello".to_string())
        );
    }

    #[test]
    fn set_text_on_unknown_handle_fails() {
        let (harness, aid, _) = setup(text_spec());
        set_text(
            &harness.ctx,
            SetText {
                aid,
                id: 77,
                text: "x".to_string(),
            },
        )
        .expect("respond");
        assert_eq!(harness.last(), Response::failed(ErrorCode::NotFound));
    }

    #[test]
    fn kind_mismatch_is_invalid_view_type() {
        let (harness, aid, id) = setup(WidgetSpec::Space);
        set_progress(
            &harness.ctx,
            SetProgress {
                aid,
                id,
                progress: 10,
            },
        )
        .expect("respond");
        set_text(
            &harness.ctx,
            SetText {
                aid,
                id,
                text: "x".to_string(),
            },
        )
        .expect("respond");

        assert_eq!(
            harness.responses(),
            vec![
                Response::failed(ErrorCode::InvalidViewType),
                Response::failed(ErrorCode::InvalidViewType),
            ]
        );
    }

    #[test]
    fn delete_view_cascades_to_descendants() {
        let harness = Harness::new();
        let aid = harness.activity();
        let root = harness.view(aid, ViewKind::LinearLayout, None);
        let child = harness.view(aid, ViewKind::FrameLayout, Some(root));
        let leaf = harness.view(aid, ViewKind::TextView, Some(child));
        let other = harness.view(aid, ViewKind::TextView, None);

        delete_view(&harness.ctx, ViewRef { aid, id: root }).expect("respond");
        assert_eq!(harness.last(), Response::ok());

        let views = &harness.ctx.registries.views;
        assert!(!views.contains(root));
        assert!(!views.contains(child));
        assert!(!views.contains(leaf));
        assert!(views.contains(other));
        assert!(!harness.ctx.registries.allocator.is_live(leaf));
    }

    #[test]
    fn delete_children_keeps_the_layout() {
        let harness = Harness::new();
        let aid = harness.activity();
        let root = harness.view(aid, ViewKind::LinearLayout, None);
        let child = harness.view(aid, ViewKind::TextView, Some(root));

        delete_children(&harness.ctx, ViewRef { aid, id: root }).expect("respond");
        delete_children(&harness.ctx, ViewRef { aid, id: child }).expect("respond");

        assert_eq!(
            harness.responses(),
            vec![
                Response::ok(),
                Response::failed(ErrorCode::NotFound),
            ]
        );
        assert!(harness.ctx.registries.views.contains(root));
    }

    #[test]
    fn select_item_requires_index_in_list() {
        let (harness, aid, id) = setup(WidgetSpec::Spinner);
        select_item(&harness.ctx, SelectIndex { aid, id, index: 0 }).expect("respond");
        set_list(
            &harness.ctx,
            SetList {
                aid,
                id,
                list: vec!["a".to_string(), "b".to_string()],
            },
        )
        .expect("respond");
        select_item(&harness.ctx, SelectIndex { aid, id, index: 1 }).expect("respond");

        assert_eq!(
            harness.responses(),
            vec![
                Response::failed(ErrorCode::InvalidParameter),
                Response::ok(),
                Response::ok(),
            ]
        );
        assert_eq!(
            harness.ctx.registries.views.with(id, |view| view.selected),
            Ok(Some(1))
        );
    }

    #[test]
    fn image_view_shows_bound_buffer() {
        let (harness, aid, id) = setup(WidgetSpec::ImageView { keyboard: false });
        let buffer = harness.ctx.registries.allocate().expect("buffer");
        harness
            .ctx
            .registries
            .buffers
            .insert(buffer, PixelBuffer::new(2, 2));

        refresh_image_view(&harness.ctx, ViewRef { aid, id }).expect("respond");
        set_buffer(&harness.ctx, SetBuffer { aid, id, buffer }).expect("respond");
        refresh_image_view(&harness.ctx, ViewRef { aid, id }).expect("respond");

        assert_eq!(
            harness.responses(),
            vec![
                Response::failed(ErrorCode::InvalidParameter),
                Response::ok(),
                Response::ok(),
            ]
        );
        let mutations = harness.platform.view(aid, id).expect("view").mutations;
        assert_eq!(mutations, vec!["Buffer", "Buffer"]);
    }

    #[test]
    fn subscriptions_toggle_event_flags() {
        let (harness, aid, id) = setup(text_spec());
        send_text_event(
            &harness.ctx,
            ViewToggle {
                aid,
                id,
                enabled: true,
            },
        )
        .expect("respond");
        send_click_event(
            &harness.ctx,
            ViewToggle {
                aid,
                id,
                enabled: true,
            },
        )
        .expect("respond");

        let events = harness
            .ctx
            .registries
            .views
            .with(id, |view| view.events)
            .expect("view");
        assert!(events.text);
        assert!(events.click);
        assert!(!events.touch);
    }

    #[test]
    fn text_subscription_names_the_required_kind() {
        let (harness, aid, id) = setup(WidgetSpec::Space);
        harness.ctx.logger.set_level(1);
        send_text_event(
            &harness.ctx,
            ViewToggle {
                aid,
                id,
                enabled: true,
            },
        )
        .expect("respond");

        assert_eq!(harness.last(), Response::failed(ErrorCode::InvalidViewType));
        let log = harness.ctx.logger.get_log(false);
        assert!(
            log.starts_with("sendTextEvent: ") && log.ends_with("requires a text view"),
            "got {log:?}"
        );
    }

    #[test]
    fn dimensions_follow_exact_sizes() {
        let (harness, aid, id) = setup(WidgetSpec::Space);
        let size = ViewSize::Exact {
            value: 40.0,
            unit: crate::model::Unit::Px,
        };
        set_width(&harness.ctx, SetSize { aid, id, size }).expect("respond");
        set_height(&harness.ctx, SetSize { aid, id, size }).expect("respond");
        get_dimensions(&harness.ctx, ViewRef { aid, id }).expect("respond");

        assert_eq!(
            harness.responses().pop(),
            Some(Response::Dimensions {
                width: 40,
                height: 40,
                code: None
            })
        );
    }
}
