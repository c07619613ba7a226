use crate::error::{HandlerError, RegistryError};
use crate::handle::{Handle, optional};
use crate::methods::{
    CreateButton, CreateCompoundButton, CreateEditText, CreateGridLayout, CreateImageView,
    CreateLinearLayout, CreateScrollView, CreateSurfaceView, CreateTextView, CreateToggleButton,
    CreateView, Placement,
};
use crate::model::{View, Visibility};
use crate::platform::{ViewMutation, WidgetSpec};
use crate::registry::ResourceKind;

use super::{HandlerContext, HandlerResult};

/// Registers and instantiates one widget. The parent, if any, must be a
/// container in the same activity or overlay.
fn create(ctx: &HandlerContext, at: Placement, spec: WidgetSpec) -> Result<Handle, HandlerError> {
    let registries = &ctx.registries;
    let aid = at.aid;
    ctx.container(aid)?;

    let parent = optional(at.parent);
    if let Some(parent) = parent {
        let parent_view = ctx.view(aid, parent).map_err(|err| match err {
            HandlerError::Registry(RegistryError::NotFound { .. }) => {
                HandlerError::Registry(RegistryError::NotFound {
                    kind: ResourceKind::View,
                    handle: parent,
                })
            }
            other => other,
        })?;
        if !parent_view.kind.is_container() {
            return Err(HandlerError::InvalidViewType {
                id: parent,
                kind: parent_view.kind,
                expected: "a layout",
            });
        }
    }

    let id = registries.allocate()?;
    let mut view = View::new(spec.kind(), parent);
    view.text = spec.initial_text().to_string();
    view.checked = spec.initially_checked();
    view.visibility = at.visibility;
    registries.views.insert_owned(id, aid, view);

    let created = ctx
        .platform
        .create_view(aid, id, parent, &spec)
        .map_err(HandlerError::from)
        .and_then(|()| {
            if at.visibility == Visibility::Visible {
                Ok(())
            } else {
                ctx.update(aid, id, &ViewMutation::Visibility(at.visibility))
            }
        });

    if let Err(err) = created {
        registries.views.remove(id).ok();
        registries.release(id);
        ctx.platform.destroy_view(aid, id);
        return Err(err);
    }

    tracing::debug!(aid, id, kind = ?spec.kind(), "view created");
    Ok(id)
}

pub fn linear_layout(ctx: &HandlerContext, request: CreateLinearLayout) -> HandlerResult {
    let spec = WidgetSpec::LinearLayout {
        horizontal: request.horizontal,
    };
    ctx.created("createLinearLayout", create(ctx, request.at, spec))
}

pub fn frame_layout(ctx: &HandlerContext, request: CreateView) -> HandlerResult {
    ctx.created(
        "createFrameLayout",
        create(ctx, request.at, WidgetSpec::FrameLayout),
    )
}

pub fn swipe_refresh_layout(ctx: &HandlerContext, request: CreateView) -> HandlerResult {
    ctx.created(
        "createSwipeRefreshLayout",
        create(ctx, request.at, WidgetSpec::SwipeRefreshLayout),
    )
}

pub fn text_view(ctx: &HandlerContext, request: CreateTextView) -> HandlerResult {
    let spec = WidgetSpec::TextView {
        text: request.text,
        selectable: request.selectable_text,
        clickable_links: request.clickable_links,
    };
    ctx.created("createTextView", create(ctx, request.at, spec))
}

pub fn edit_text(ctx: &HandlerContext, request: CreateEditText) -> HandlerResult {
    let spec = WidgetSpec::EditText {
        text: request.text,
        single_line: request.single_line,
        no_line: request.no_line,
        block_input: request.block_input,
    };
    ctx.created("createEditText", create(ctx, request.at, spec))
}

pub fn button(ctx: &HandlerContext, request: CreateButton) -> HandlerResult {
    let spec = WidgetSpec::Button {
        text: request.text,
        all_caps: request.all_caps,
    };
    ctx.created("createButton", create(ctx, request.at, spec))
}

pub fn image_view(ctx: &HandlerContext, request: CreateImageView) -> HandlerResult {
    let spec = WidgetSpec::ImageView {
        keyboard: request.keyboard,
    };
    ctx.created("createImageView", create(ctx, request.at, spec))
}

pub fn space(ctx: &HandlerContext, request: CreateView) -> HandlerResult {
    ctx.created("createSpace", create(ctx, request.at, WidgetSpec::Space))
}

pub fn nested_scroll_view(ctx: &HandlerContext, request: CreateScrollView) -> HandlerResult {
    let spec = WidgetSpec::NestedScrollView {
        no_bar: request.no_bar,
        snapping: request.snapping,
        fill_viewport: request.fill_viewport,
    };
    ctx.created("createNestedScrollView", create(ctx, request.at, spec))
}

pub fn horizontal_scroll_view(ctx: &HandlerContext, request: CreateScrollView) -> HandlerResult {
    let spec = WidgetSpec::HorizontalScrollView {
        no_bar: request.no_bar,
        snapping: request.snapping,
        fill_viewport: request.fill_viewport,
    };
    ctx.created("createHorizontalScrollView", create(ctx, request.at, spec))
}

pub fn radio_group(ctx: &HandlerContext, request: CreateView) -> HandlerResult {
    ctx.created(
        "createRadioGroup",
        create(ctx, request.at, WidgetSpec::RadioGroup),
    )
}

pub fn radio_button(ctx: &HandlerContext, request: CreateCompoundButton) -> HandlerResult {
    let spec = WidgetSpec::RadioButton {
        text: request.text,
        checked: request.checked,
    };
    ctx.created("createRadioButton", create(ctx, request.at, spec))
}

pub fn checkbox(ctx: &HandlerContext, request: CreateCompoundButton) -> HandlerResult {
    let spec = WidgetSpec::Checkbox {
        text: request.text,
        checked: request.checked,
    };
    ctx.created("createCheckbox", create(ctx, request.at, spec))
}

pub fn toggle_button(ctx: &HandlerContext, request: CreateToggleButton) -> HandlerResult {
    let spec = WidgetSpec::ToggleButton {
        checked: request.checked,
    };
    ctx.created("createToggleButton", create(ctx, request.at, spec))
}

pub fn switch(ctx: &HandlerContext, request: CreateCompoundButton) -> HandlerResult {
    let spec = WidgetSpec::Switch {
        text: request.text,
        checked: request.checked,
    };
    ctx.created("createSwitch", create(ctx, request.at, spec))
}

pub fn spinner(ctx: &HandlerContext, request: CreateView) -> HandlerResult {
    ctx.created("createSpinner", create(ctx, request.at, WidgetSpec::Spinner))
}

pub fn progress_bar(ctx: &HandlerContext, request: CreateView) -> HandlerResult {
    ctx.created(
        "createProgressBar",
        create(ctx, request.at, WidgetSpec::ProgressBar),
    )
}

pub fn tab_layout(ctx: &HandlerContext, request: CreateView) -> HandlerResult {
    ctx.created(
        "createTabLayout",
        create(ctx, request.at, WidgetSpec::TabLayout),
    )
}

pub fn web_view(ctx: &HandlerContext, request: CreateView) -> HandlerResult {
    ctx.created("createWebView", create(ctx, request.at, WidgetSpec::WebView))
}

pub fn grid_layout(ctx: &HandlerContext, request: CreateGridLayout) -> HandlerResult {
    let result = if request.rows == 0 || request.cols == 0 {
        Err(HandlerError::invalid("grid needs at least one row and column"))
    } else {
        let spec = WidgetSpec::GridLayout {
            rows: request.rows,
            columns: request.cols,
        };
        create(ctx, request.at, spec)
    };
    ctx.created("createGridLayout", result)
}

pub fn surface_view(ctx: &HandlerContext, request: CreateSurfaceView) -> HandlerResult {
    let spec = WidgetSpec::SurfaceView {
        keyboard: request.keyboard,
        secure: request.secure,
    };
    ctx.created("createSurfaceView", create(ctx, request.at, spec))
}
