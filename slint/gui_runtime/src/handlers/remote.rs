use crate::error::{HandlerError, RegistryError};
use crate::handle::{Handle, optional};
use crate::methods::{
    AddRemoteLinearLayout, AddRemoteView, Empty, RemoteLayoutRef, SetRemoteColor,
    SetRemoteImage, SetRemotePadding, SetRemoteProgressBar, SetRemoteText, SetRemoteTextSize,
    SetRemoteVisibility, SetWidgetLayout,
};
use crate::model::{RemoteLayout, RemoteView, RemoteViewKind, argb};
use crate::registry::ResourceKind;

use super::{HandlerContext, HandlerResult};

fn missing_view(id: Handle) -> HandlerError {
    RegistryError::NotFound {
        kind: ResourceKind::RemoteView,
        handle: id,
    }
    .into()
}

pub fn create_layout(ctx: &HandlerContext, _: Empty) -> HandlerResult {
    let result = ctx.registries.allocate().map(|rid| {
        ctx.registries
            .remote_layouts
            .insert(rid, RemoteLayout::default());
        rid
    });
    ctx.created("createRemoteLayout", result.map_err(HandlerError::from))
}

/// Drops a layout and every view handle inside it.
pub fn delete_layout(ctx: &HandlerContext, request: RemoteLayoutRef) -> HandlerResult {
    let result = ctx
        .registries
        .remote_layouts
        .remove(request.rid)
        .map(|layout| {
            for id in layout.views.keys() {
                ctx.registries.release(*id);
            }
            ctx.registries.release(request.rid);
        })
        .map_err(HandlerError::from);
    ctx.ack("deleteRemoteLayout", result)
}

/// Adds a view under `parent`, or as the root when no parent is given.
fn add(
    ctx: &HandlerContext,
    rid: Handle,
    parent: Handle,
    kind: RemoteViewKind,
) -> Result<Handle, HandlerError> {
    if !ctx.registries.remote_layouts.contains(rid) {
        return Err(RegistryError::NotFound {
            kind: ResourceKind::RemoteLayout,
            handle: rid,
        }
        .into());
    }

    let id = ctx.registries.allocate()?;
    let parent = optional(parent);
    let added = ctx
        .registries
        .remote_layouts
        .with_mut(rid, |layout| -> Result<(), HandlerError> {
            match parent {
                Some(parent) => {
                    let parent_kind = layout
                        .views
                        .get(&parent)
                        .map(|view| view.kind)
                        .ok_or_else(|| missing_view(parent))?;
                    if !parent_kind.is_container() {
                        return Err(HandlerError::invalid(format!(
                            "remote view {parent} is not a layout"
                        )));
                    }
                }
                None if layout.root.is_some() => {
                    return Err(HandlerError::invalid("remote layout already has a root"));
                }
                None => layout.root = Some(id),
            }
            layout.views.insert(id, RemoteView::new(kind, parent));
            Ok(())
        })
        .map_err(HandlerError::from)
        .and_then(|added| added);

    match added {
        Ok(()) => Ok(id),
        Err(err) => {
            ctx.registries.release(id);
            Err(err)
        }
    }
}

pub fn add_frame_layout(ctx: &HandlerContext, request: AddRemoteView) -> HandlerResult {
    ctx.created(
        "addRemoteFrameLayout",
        add(ctx, request.rid, request.parent, RemoteViewKind::FrameLayout),
    )
}

pub fn add_linear_layout(ctx: &HandlerContext, request: AddRemoteLinearLayout) -> HandlerResult {
    let kind = RemoteViewKind::LinearLayout {
        horizontal: request.horizontal,
    };
    ctx.created(
        "addRemoteLinearLayout",
        add(ctx, request.rid, request.parent, kind),
    )
}

pub fn add_text_view(ctx: &HandlerContext, request: AddRemoteView) -> HandlerResult {
    ctx.created(
        "addRemoteTextView",
        add(ctx, request.rid, request.parent, RemoteViewKind::TextView),
    )
}

pub fn add_button(ctx: &HandlerContext, request: AddRemoteView) -> HandlerResult {
    ctx.created(
        "addRemoteButton",
        add(ctx, request.rid, request.parent, RemoteViewKind::Button),
    )
}

pub fn add_image_view(ctx: &HandlerContext, request: AddRemoteView) -> HandlerResult {
    ctx.created(
        "addRemoteImageView",
        add(ctx, request.rid, request.parent, RemoteViewKind::ImageView),
    )
}

pub fn add_progress_bar(ctx: &HandlerContext, request: AddRemoteView) -> HandlerResult {
    ctx.created(
        "addRemoteProgressBar",
        add(ctx, request.rid, request.parent, RemoteViewKind::ProgressBar),
    )
}

/// Mutates one view of a layout after checking that its kind is accepted.
fn edit(
    ctx: &HandlerContext,
    rid: Handle,
    id: Handle,
    expected: &'static str,
    accepts: fn(RemoteViewKind) -> bool,
    f: impl FnOnce(&mut RemoteView),
) -> Result<(), HandlerError> {
    ctx.registries
        .remote_layouts
        .with_mut(rid, |layout| -> Result<(), HandlerError> {
            let view = layout.views.get_mut(&id).ok_or_else(|| missing_view(id))?;
            if !accepts(view.kind) {
                return Err(HandlerError::invalid(format!(
                    "remote view {id} is not {expected}"
                )));
            }
            f(view);
            Ok(())
        })
        .map_err(HandlerError::from)
        .and_then(|edited| edited)
}

fn any(_: RemoteViewKind) -> bool {
    true
}

fn text(kind: RemoteViewKind) -> bool {
    kind.has_text()
}

pub fn set_background_color(ctx: &HandlerContext, request: SetRemoteColor) -> HandlerResult {
    let color = argb(request.color);
    let result = edit(ctx, request.rid, request.id, "any view", any, |view| {
        view.background = Some(color)
    });
    ctx.ack("setRemoteBackgroundColor", result)
}

pub fn set_progress_bar(ctx: &HandlerContext, request: SetRemoteProgressBar) -> HandlerResult {
    let SetRemoteProgressBar {
        rid,
        id,
        progress,
        max,
    } = request;
    let result = if max <= 0 || !(0..=max).contains(&progress) {
        Err(HandlerError::invalid(format!(
            "progress {progress} out of range 0..={max}"
        )))
    } else {
        edit(
            ctx,
            rid,
            id,
            "a progress bar",
            |kind| kind == RemoteViewKind::ProgressBar,
            |view| {
                view.progress = progress;
                view.progress_max = max;
            },
        )
    };
    ctx.ack("setRemoteProgressBar", result)
}

pub fn set_text(ctx: &HandlerContext, request: SetRemoteText) -> HandlerResult {
    let SetRemoteText { rid, id, text: value } = request;
    let result = edit(ctx, rid, id, "a text view", text, |view| view.text = value);
    ctx.ack("setRemoteText", result)
}

pub fn set_text_size(ctx: &HandlerContext, request: SetRemoteTextSize) -> HandlerResult {
    let size = request.size;
    let result = if size > 0.0 && size.is_finite() {
        edit(ctx, request.rid, request.id, "a text view", text, |view| {
            view.text_size = Some(size)
        })
    } else {
        Err(HandlerError::invalid("text size must be positive"))
    };
    ctx.ack("setRemoteTextSize", result)
}

pub fn set_text_color(ctx: &HandlerContext, request: SetRemoteColor) -> HandlerResult {
    let color = argb(request.color);
    let result = edit(ctx, request.rid, request.id, "a text view", text, |view| {
        view.text_color = Some(color)
    });
    ctx.ack("setRemoteTextColor", result)
}

pub fn set_visibility(ctx: &HandlerContext, request: SetRemoteVisibility) -> HandlerResult {
    let visibility = request.visibility;
    let result = edit(ctx, request.rid, request.id, "any view", any, |view| {
        view.visibility = visibility
    });
    ctx.ack("setRemoteVisibility", result)
}

pub fn set_padding(ctx: &HandlerContext, request: SetRemotePadding) -> HandlerResult {
    let padding = [request.left, request.top, request.right, request.bottom];
    let result = edit(ctx, request.rid, request.id, "any view", any, |view| {
        view.padding = padding
    });
    ctx.ack("setRemotePadding", result)
}

pub fn set_image(ctx: &HandlerContext, request: SetRemoteImage) -> HandlerResult {
    let SetRemoteImage { rid, id, image } = request;
    let result = if image.is_empty() {
        Err(HandlerError::invalid("empty image"))
    } else {
        edit(
            ctx,
            rid,
            id,
            "an image view",
            |kind| kind == RemoteViewKind::ImageView,
            |view| view.image = image,
        )
    };
    ctx.ack("setRemoteImage", result)
}

/// Shows a layout in a home screen widget.
pub fn set_widget_layout(ctx: &HandlerContext, request: SetWidgetLayout) -> HandlerResult {
    let result = if request.wid.is_empty() {
        Err(HandlerError::invalid("empty widget id"))
    } else {
        ctx.registries
            .remote_layouts
            .get(request.rid)
            .map_err(HandlerError::from)
            .and_then(|layout| Ok(ctx.platform.update_widget(&request.wid, &layout)?))
    };
    ctx.ack("setWidgetLayout", result)
}
