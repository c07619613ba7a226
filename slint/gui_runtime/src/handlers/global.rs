use crate::error::{HandlerError, RegistryError};
use crate::handle::Handle;
use crate::methods::{Empty, GetLog, SetLogLevel, TaskRef, Toast};
use crate::registry::ResourceKind;
use crate::responses::Response;

use super::{HandlerContext, HandlerResult};

fn task_exists(ctx: &HandlerContext, tid: Handle) -> Result<(), HandlerError> {
    if ctx.registries.tasks.contains(tid) {
        Ok(())
    } else {
        Err(RegistryError::NotFound {
            kind: ResourceKind::Task,
            handle: tid,
        }
        .into())
    }
}

/// Finishes every activity of a task. The activities and the task itself
/// leave the registries as the platform reports their destruction.
pub fn finish_task(ctx: &HandlerContext, request: TaskRef) -> HandlerResult {
    let tid = request.tid;
    let result = task_exists(ctx, tid).and_then(|()| {
        let members = ctx
            .registries
            .tasks
            .with(tid, |task| task.activities.clone())?;
        for aid in &members {
            ctx.registries
                .activities
                .with_mut(*aid, |activity| activity.finishing = true)
                .ok();
        }
        Ok(ctx.platform.finish_task(tid)?)
    });
    ctx.ack("finishTask", result)
}

pub fn bring_task_to_front(ctx: &HandlerContext, request: TaskRef) -> HandlerResult {
    let result = task_exists(ctx, request.tid)
        .and_then(|()| Ok(ctx.platform.bring_task_to_front(request.tid)?));
    ctx.ack("bringTaskToFront", result)
}

pub fn toast(ctx: &HandlerContext, request: Toast) -> HandlerResult {
    ctx.platform.toast(&request.text, request.long);
    ctx.respond(Response::ok())
}

pub fn turn_screen_on(ctx: &HandlerContext, _: Empty) -> HandlerResult {
    ctx.platform.turn_screen_on();
    ctx.respond(Response::ok())
}

pub fn is_locked(ctx: &HandlerContext, _: Empty) -> HandlerResult {
    ctx.respond(Response::Locked {
        locked: ctx.platform.is_locked(),
    })
}

pub fn version(ctx: &HandlerContext, _: Empty) -> HandlerResult {
    ctx.respond(Response::Version {
        version_code: ctx.platform.version_code(),
    })
}

pub fn set_log_level(ctx: &HandlerContext, request: SetLogLevel) -> HandlerResult {
    ctx.logger.set_level(request.level);
    ctx.respond(Response::ok())
}

pub fn get_log(ctx: &HandlerContext, request: GetLog) -> HandlerResult {
    ctx.respond(Response::Log {
        log: ctx.logger.get_log(request.clear),
    })
}
