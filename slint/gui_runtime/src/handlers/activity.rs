use crate::error::{ErrorCode, HandlerError, RegistryError};
use crate::handle::{Handle, NO_HANDLE, optional};
use crate::methods::{
    ActivityRef, ActivityToggle, ActivityType, ConfigInsets, InterceptVolume, NewActivity,
    SetInputMode, SetOrientation, SetPiPParams, SetPosition, SetTaskDescription, SetTheme,
};
use crate::model::{Activity, Overlay, Task, argb};
use crate::platform::{ActivityCommand, ActivityOptions};
use crate::registry::ResourceKind;
use crate::responses::Response;

use super::{HandlerContext, HandlerResult};

const TAG: &str = "activity";

pub fn new_activity(ctx: &HandlerContext, request: NewActivity) -> HandlerResult {
    if request.kind == ActivityType::Overlay {
        return new_overlay(ctx);
    }

    match launch(ctx, &request) {
        Ok((aid, tid)) => ctx.respond(Response::NewActivity {
            aid,
            tid,
            code: None,
        }),
        Err(err) => {
            ctx.logger.log(1, TAG, format!("newActivity failed: {err}"));
            ctx.respond(Response::NewActivity {
                aid: NO_HANDLE,
                tid: NO_HANDLE,
                code: Some(err.code()),
            })
        }
    }
}

fn launch(ctx: &HandlerContext, request: &NewActivity) -> Result<(Handle, Handle), HandlerError> {
    let registries = &ctx.registries;
    let existing_task = optional(request.tid);
    if let Some(tid) = existing_task {
        if !registries.tasks.contains(tid) {
            return Err(RegistryError::NotFound {
                kind: ResourceKind::Task,
                handle: tid,
            }
            .into());
        }
    }

    let aid = registries.allocate()?;
    let tid = match existing_task {
        Some(tid) => tid,
        None => match registries.allocate() {
            Ok(tid) => tid,
            Err(err) => {
                registries.release(aid);
                return Err(err.into());
            }
        },
    };

    let options = ActivityOptions {
        dialog: matches!(
            request.kind,
            ActivityType::Dialog | ActivityType::DialogCancelOutside
        ),
        pip: request.kind == ActivityType::Pip,
        lockscreen: request.kind == ActivityType::Lockscreen,
        cancel_outside: request.kind == ActivityType::DialogCancelOutside,
    };

    let mut activity = Activity::new(tid);
    activity.dialog = options.dialog;
    activity.pip = options.pip;
    activity.intercept_back = request.intercept_back_button;
    registries.activities.insert(aid, activity);
    if existing_task.is_some() {
        registries
            .tasks
            .with_mut(tid, |task| task.activities.push(aid))?;
    } else {
        registries.tasks.insert(
            tid,
            Task {
                activities: vec![aid],
            },
        );
    }

    // The platform reports create/start/resume through the listener, possibly
    // before this call returns, so the activity must be registered first.
    if let Err(err) = ctx.platform.launch_activity(aid, tid, &options) {
        registries.activities.remove(aid).ok();
        registries.release(aid);
        if existing_task.is_some() {
            registries
                .tasks
                .with_mut(tid, |task| task.activities.retain(|member| *member != aid))
                .ok();
        } else if registries.tasks.remove(tid).is_ok() {
            registries.release(tid);
        }
        return Err(err.into());
    }

    tracing::debug!(aid, tid, "activity launched");
    Ok((aid, tid))
}

/// Creates an overlay window. Without the overlay permission the platform is
/// asked to prompt for it and no handle is allocated.
fn new_overlay(ctx: &HandlerContext) -> HandlerResult {
    let denied = Response::NewActivity {
        aid: NO_HANDLE,
        tid: NO_HANDLE,
        code: Some(ErrorCode::PermissionDenied),
    };

    if !ctx.platform.can_draw_overlays() {
        ctx.platform.request_overlay_permission();
        ctx.logger.log(1, TAG, "overlay permission missing");
        return ctx.respond(denied);
    }

    let result = ctx.registries.allocate().map_err(HandlerError::from).and_then(|aid| {
        match ctx.platform.create_overlay(aid) {
            Ok(bounds) => {
                ctx.registries.overlays.insert(
                    aid,
                    Overlay {
                        send_touch: false,
                        bounds,
                    },
                );
                Ok(aid)
            }
            Err(err) => {
                ctx.registries.release(aid);
                Err(err.into())
            }
        }
    });

    match result {
        Ok(aid) => ctx.respond(Response::NewActivity {
            aid,
            tid: NO_HANDLE,
            code: None,
        }),
        Err(err) => {
            ctx.logger.log(1, TAG, format!("overlay failed: {err}"));
            ctx.respond(Response::NewActivity {
                aid: NO_HANDLE,
                tid: NO_HANDLE,
                code: Some(err.code()),
            })
        }
    }
}

pub fn finish_activity(ctx: &HandlerContext, request: ActivityRef) -> HandlerResult {
    let aid = request.aid;
    let result = if ctx.registries.overlays.remove(aid).is_ok() {
        ctx.registries.remove_views_of(aid);
        ctx.registries.release(aid);
        ctx.platform.destroy_overlay(aid);
        Ok(())
    } else {
        ctx.registries
            .activities
            .with_mut(aid, |activity| activity.finishing = true)
            .map_err(HandlerError::from)
            .and_then(|()| Ok(ctx.platform.finish_activity(aid)?))
    };
    ctx.ack("finishActivity", result)
}

fn activity_exists(ctx: &HandlerContext, aid: Handle) -> Result<(), HandlerError> {
    if ctx.registries.activities.contains(aid) {
        Ok(())
    } else {
        Err(RegistryError::NotFound {
            kind: ResourceKind::Activity,
            handle: aid,
        }
        .into())
    }
}

fn command(ctx: &HandlerContext, aid: Handle, command: ActivityCommand) -> Result<(), HandlerError> {
    activity_exists(ctx, aid)?;
    Ok(ctx.platform.activity_command(aid, &command)?)
}

fn update(ctx: &HandlerContext, aid: Handle, f: impl FnOnce(&mut Activity)) -> Result<(), HandlerError> {
    Ok(ctx.registries.activities.with_mut(aid, f)?)
}

pub fn move_task_to_back(ctx: &HandlerContext, request: ActivityRef) -> HandlerResult {
    ctx.ack(
        "moveTaskToBack",
        command(ctx, request.aid, ActivityCommand::MoveTaskToBack),
    )
}

pub fn set_theme(ctx: &HandlerContext, request: SetTheme) -> HandlerResult {
    let theme = ActivityCommand::SetTheme {
        status_bar_color: argb(request.status_bar_color),
        primary_color: argb(request.color_primary),
        accent_color: argb(request.color_accent),
        window_background: argb(request.window_background),
        text_color: argb(request.text_color),
    };
    ctx.ack("setTheme", command(ctx, request.aid, theme))
}

pub fn set_task_description(ctx: &HandlerContext, request: SetTaskDescription) -> HandlerResult {
    let description = ActivityCommand::SetTaskDescription {
        label: request.label,
        icon: request.img,
        primary_color: argb(request.color),
    };
    ctx.ack("setTaskDescription", command(ctx, request.aid, description))
}

pub fn set_pip_params(ctx: &HandlerContext, request: SetPiPParams) -> HandlerResult {
    let result = if request.num == 0 || request.den == 0 {
        Err(HandlerError::invalid("aspect ratio must be positive"))
    } else {
        command(
            ctx,
            request.aid,
            ActivityCommand::SetPiPParams {
                numerator: request.num,
                denominator: request.den,
            },
        )
    };
    ctx.ack("setPiPParams", result)
}

pub fn set_input_mode(ctx: &HandlerContext, request: SetInputMode) -> HandlerResult {
    let result = command(ctx, request.aid, ActivityCommand::SetInputMode(request.mode))
        .and_then(|()| update(ctx, request.aid, |activity| activity.input_mode = request.mode));
    ctx.ack("setInputMode", result)
}

pub fn set_pip_mode(ctx: &HandlerContext, request: ActivityToggle) -> HandlerResult {
    ctx.ack(
        "setPiPMode",
        command(ctx, request.aid, ActivityCommand::SetPiPMode(request.enabled)),
    )
}

pub fn set_pip_mode_auto(ctx: &HandlerContext, request: ActivityToggle) -> HandlerResult {
    ctx.ack(
        "setPiPModeAuto",
        command(
            ctx,
            request.aid,
            ActivityCommand::SetPiPModeAuto(request.enabled),
        ),
    )
}

pub fn keep_screen_on(ctx: &HandlerContext, request: ActivityToggle) -> HandlerResult {
    let result = command(ctx, request.aid, ActivityCommand::KeepScreenOn(request.enabled))
        .and_then(|()| {
            update(ctx, request.aid, |activity| {
                activity.keep_screen_on = request.enabled
            })
        });
    ctx.ack("keepScreenOn", result)
}

pub fn set_orientation(ctx: &HandlerContext, request: SetOrientation) -> HandlerResult {
    let result = command(
        ctx,
        request.aid,
        ActivityCommand::SetOrientation(request.orientation),
    )
    .and_then(|()| {
        update(ctx, request.aid, |activity| {
            activity.orientation = request.orientation
        })
    });
    ctx.ack("setOrientation", result)
}

/// Moves an overlay window.
pub fn set_position(ctx: &HandlerContext, request: SetPosition) -> HandlerResult {
    let SetPosition { aid, x, y } = request;
    let result = ctx
        .registries
        .overlays
        .with(aid, |_| ())
        .map_err(HandlerError::from)
        .and_then(|()| Ok(ctx.platform.activity_command(aid, &ActivityCommand::SetPosition { x, y })?))
        .and_then(|()| {
            Ok(ctx.registries.overlays.with_mut(aid, |overlay| {
                overlay.bounds.x = x;
                overlay.bounds.y = y;
            })?)
        });
    ctx.ack("setPosition", result)
}

pub fn get_configuration(ctx: &HandlerContext, request: ActivityRef) -> HandlerResult {
    let result = activity_exists(ctx, request.aid)
        .and_then(|()| Ok(ctx.platform.configuration(request.aid)?));
    ctx.reply(
        "getConfiguration",
        result,
        |configuration| Response::Configuration {
            configuration: Some(configuration),
            code: None,
        },
        |code| Response::Configuration {
            configuration: None,
            code: Some(code),
        },
    )
}

pub fn request_unlock(ctx: &HandlerContext, request: ActivityRef) -> HandlerResult {
    ctx.ack(
        "requestUnlock",
        command(ctx, request.aid, ActivityCommand::RequestUnlock),
    )
}

pub fn hide_soft_keyboard(ctx: &HandlerContext, request: ActivityRef) -> HandlerResult {
    ctx.ack(
        "hideSoftKeyboard",
        command(ctx, request.aid, ActivityCommand::HideSoftKeyboard),
    )
}

pub fn intercept_back_button(ctx: &HandlerContext, request: ActivityToggle) -> HandlerResult {
    ctx.ack(
        "interceptBackButton",
        update(ctx, request.aid, |activity| {
            activity.intercept_back = request.enabled
        }),
    )
}

pub fn set_secure(ctx: &HandlerContext, request: ActivityToggle) -> HandlerResult {
    let result = command(ctx, request.aid, ActivityCommand::SetSecure(request.enabled))
        .and_then(|()| update(ctx, request.aid, |activity| activity.secure = request.enabled));
    ctx.ack("setSecure", result)
}

pub fn intercept_volume(ctx: &HandlerContext, request: InterceptVolume) -> HandlerResult {
    ctx.ack(
        "interceptVolume",
        update(ctx, request.aid, |activity| {
            activity.intercept_volume_up = request.intercept_up;
            activity.intercept_volume_down = request.intercept_down;
        }),
    )
}

pub fn config_insets(ctx: &HandlerContext, request: ConfigInsets) -> HandlerResult {
    ctx.ack(
        "configInsets",
        command(
            ctx,
            request.aid,
            ActivityCommand::ConfigureInsets {
                shown: request.shown,
                behaviour: request.behaviour,
            },
        ),
    )
}

pub fn send_overlay_touch(ctx: &HandlerContext, request: ActivityToggle) -> HandlerResult {
    let result = ctx
        .registries
        .overlays
        .with_mut(request.aid, |overlay| overlay.send_touch = request.enabled)
        .map_err(HandlerError::from);
    ctx.ack("sendOverlayTouch", result)
}
