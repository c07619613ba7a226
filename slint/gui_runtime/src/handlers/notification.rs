use crate::error::{HandlerError, RegistryError};
use crate::handle::{Handle, optional};
use crate::methods::{CancelNotification, CreateChannel, CreateNotification};
use crate::model::{Notification, NotificationChannel, RemoteLayout};
use crate::platform::NotificationLayouts;
use crate::registry::{ResourceKind, lock};

use super::{HandlerContext, HandlerResult};

pub fn create_channel(ctx: &HandlerContext, request: CreateChannel) -> HandlerResult {
    let result = if request.id.is_empty() {
        Err(HandlerError::invalid("empty channel id"))
    } else {
        let channel = NotificationChannel {
            id: request.id,
            name: request.name,
            importance: request.importance,
        };
        ctx.platform
            .create_channel(&channel)
            .map(|()| {
                lock(&ctx.registries.channels).insert(channel.id.clone(), channel);
            })
            .map_err(HandlerError::from)
    };
    ctx.ack("createChannel", result)
}

fn layout(ctx: &HandlerContext, rid: Option<Handle>) -> Result<Option<RemoteLayout>, HandlerError> {
    rid.map(|rid| ctx.registries.remote_layouts.get(rid))
        .transpose()
        .map_err(HandlerError::from)
}

/// Posts a new notification, or replaces the one named by a non-negative id.
pub fn create_notification(ctx: &HandlerContext, request: CreateNotification) -> HandlerResult {
    ctx.created("createNotification", post(ctx, request))
}

fn post(ctx: &HandlerContext, request: CreateNotification) -> Result<Handle, HandlerError> {
    if !lock(&ctx.registries.channels).contains_key(&request.channel) {
        return Err(HandlerError::invalid(format!(
            "unknown channel {:?}",
            request.channel
        )));
    }

    let notification = Notification {
        channel: request.channel,
        importance: request.importance,
        ongoing: request.ongoing,
        title: request.title,
        content: request.content,
        large_text: request.large_text,
        large_image: request.large_image,
        large_image_as_thumbnail: request.large_image_as_thumbnail,
        icon: request.icon,
        alert_once: request.alert_once,
        show_timestamp: request.show_timestamp,
        timestamp: request.timestamp,
        actions: request.actions,
        layout: optional(request.layout),
        expanded_layout: optional(request.expanded_layout),
        hud_layout: optional(request.hud_layout),
    };
    let layouts = NotificationLayouts {
        normal: layout(ctx, notification.layout)?,
        expanded: layout(ctx, notification.expanded_layout)?,
        heads_up: layout(ctx, notification.hud_layout)?,
    };

    let (id, fresh) = match optional(request.id) {
        Some(id) if ctx.registries.notifications.contains(id) => (id, false),
        Some(id) => {
            return Err(RegistryError::NotFound {
                kind: ResourceKind::Notification,
                handle: id,
            }
            .into());
        }
        None => (ctx.registries.allocate()?, true),
    };

    // Registered before posting so callbacks fired during the post find it.
    let previous = ctx.registries.notifications.get(id).ok();
    ctx.registries.notifications.insert(id, notification.clone());
    if let Err(err) = ctx.platform.post_notification(id, &notification, &layouts) {
        match previous {
            Some(previous) => ctx.registries.notifications.insert(id, previous),
            None => {
                let _ = ctx.registries.notifications.remove(id);
                ctx.registries.release(id);
            }
        }
        return Err(err.into());
    }
    tracing::debug!(id, fresh, "notification posted");
    Ok(id)
}

pub fn cancel_notification(ctx: &HandlerContext, request: CancelNotification) -> HandlerResult {
    let id = request.id;
    let result = ctx
        .registries
        .notifications
        .remove(id)
        .map(|_| {
            ctx.platform.cancel_notification(id);
            ctx.registries.release(id);
        })
        .map_err(HandlerError::from);
    ctx.ack("cancelNotification", result)
}
