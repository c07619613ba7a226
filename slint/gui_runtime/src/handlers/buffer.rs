use crate::error::HandlerError;
use crate::handle::Handle;
use crate::methods::{AddBuffer, BlitBuffer, BufferRef};
use crate::model::{HardwareBuffer, HardwareBufferSpec, PixelBuffer, View};
use crate::platform::ViewMutation;

use super::{HandlerContext, HandlerResult};

/// Largest accepted edge of a buffer, in pixels.
pub const MAX_BUFFER_EDGE: u32 = 8192;

fn check_size(width: u32, height: u32) -> Result<(), HandlerError> {
    if width == 0 || height == 0 || width > MAX_BUFFER_EDGE || height > MAX_BUFFER_EDGE {
        Err(HandlerError::invalid(format!(
            "buffer size {width}x{height} out of range"
        )))
    } else {
        Ok(())
    }
}

pub fn add_buffer(ctx: &HandlerContext, request: AddBuffer) -> HandlerResult {
    let result = check_size(request.width, request.height).and_then(|()| {
        let id = ctx.registries.allocate()?;
        ctx.registries
            .buffers
            .insert(id, PixelBuffer::new(request.width, request.height));
        Ok(id)
    });
    ctx.created("addBuffer", result)
}

/// Views that still show `buffer` are left without one.
pub fn delete_buffer(ctx: &HandlerContext, request: BufferRef) -> HandlerResult {
    let buffer = request.buffer;
    let result = ctx
        .registries
        .buffers
        .remove(buffer)
        .map(|_| {
            for (_, id) in views_showing(ctx, |view| view.buffer == Some(buffer)) {
                let _ = ctx.registries.views.with_mut(id, |view| view.buffer = None);
            }
            ctx.registries.release(buffer);
        })
        .map_err(HandlerError::from);
    ctx.ack("deleteBuffer", result)
}

fn views_showing(ctx: &HandlerContext, shows: impl Fn(&View) -> bool) -> Vec<(Handle, Handle)> {
    ctx.registries
        .views
        .collect_where(|id, owner, view| match owner {
            Some(owner) if shows(view) => Some((owner, id)),
            _ => None,
        })
}

/// Copies new pixel data into the buffer, if given, and pushes the buffer to
/// every image view showing it.
pub fn blit_buffer(ctx: &HandlerContext, request: BlitBuffer) -> HandlerResult {
    let BlitBuffer { buffer, pixels } = request;
    let result = ctx
        .registries
        .buffers
        .with_mut(buffer, |target| {
            if pixels.is_empty() {
                return Ok(target.pixels.clone());
            }
            if pixels.len() != target.byte_len() {
                return Err(HandlerError::invalid(format!(
                    "expected {} bytes, got {}",
                    target.byte_len(),
                    pixels.len()
                )));
            }
            target.pixels.make_mut_bytes().copy_from_slice(&pixels);
            Ok(target.pixels.clone())
        })
        .map_err(HandlerError::from)
        .and_then(|copied| copied)
        .and_then(|snapshot| {
            for (owner, id) in views_showing(ctx, |view| view.buffer == Some(buffer)) {
                ctx.update(owner, id, &ViewMutation::Buffer(snapshot.clone()))?;
            }
            Ok(())
        });
    ctx.ack("blitBuffer", result)
}

pub fn create_hardware_buffer(ctx: &HandlerContext, spec: HardwareBufferSpec) -> HandlerResult {
    let result = check_size(spec.width, spec.height).and_then(|()| {
        let id = ctx.registries.allocate()?;
        match ctx.platform.create_hardware_buffer(&spec) {
            Ok(raw) => {
                ctx.registries
                    .hardware_buffers
                    .insert(id, HardwareBuffer { spec, raw });
                Ok(id)
            }
            Err(err) => {
                ctx.registries.release(id);
                Err(err.into())
            }
        }
    });
    ctx.created("createHardwareBuffer", result)
}

/// Detaches the buffer from every surface view showing it, then gives it
/// back to the platform.
pub fn destroy_hardware_buffer(ctx: &HandlerContext, request: BufferRef) -> HandlerResult {
    let buffer = request.buffer;
    let result = ctx
        .registries
        .hardware_buffers
        .remove(buffer)
        .map(|hardware| {
            for (owner, id) in views_showing(ctx, |view| view.surface_buffer == Some(buffer)) {
                if let Err(err) = ctx.update(owner, id, &ViewMutation::SurfaceBuffer(None)) {
                    tracing::debug!(owner, id, %err, "surface already gone");
                }
                let _ = ctx
                    .registries
                    .views
                    .with_mut(id, |view| view.surface_buffer = None);
            }
            ctx.platform.release_hardware_buffer(hardware.raw);
            ctx.registries.release(buffer);
        })
        .map_err(HandlerError::from);
    ctx.ack("destroyHardwareBuffer", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handle::NO_HANDLE;
    use crate::handlers::test_support::Harness;
    use crate::handlers::view::set_surface_buffer;
    use crate::methods::SetBuffer;
    use crate::model::{HardwareBufferFormat, ViewKind};
    use crate::platform::{ActivityOptions, Platform, WidgetSpec};
    use crate::responses::Response;

    fn spec(width: u32, height: u32) -> HardwareBufferSpec {
        HardwareBufferSpec {
            width,
            height,
            format: HardwareBufferFormat::Rgba8888,
            cpu_read: Default::default(),
            cpu_write: Default::default(),
        }
    }

    #[test]
    fn add_and_delete_buffer() {
        let harness = Harness::new();
        add_buffer(
            &harness.ctx,
            AddBuffer {
                width: 4,
                height: 2,
                format: Default::default(),
            },
        )
        .expect("respond");
        let Response::Created { id, .. } = harness.last() else {
            panic!("expected created response");
        };
        assert_eq!(
            harness.ctx.registries.buffers.with(id, PixelBuffer::byte_len),
            Ok(32)
        );

        delete_buffer(&harness.ctx, BufferRef { buffer: id }).expect("respond");
        delete_buffer(&harness.ctx, BufferRef { buffer: id }).expect("respond");
        assert_eq!(
            harness.responses(),
            vec![Response::ok(), Response::failed(ErrorCode::NotFound)]
        );
        assert!(!harness.ctx.registries.allocator.is_live(id));
    }

    #[test]
    fn zero_sized_buffer_is_rejected() {
        let harness = Harness::new();
        add_buffer(
            &harness.ctx,
            AddBuffer {
                width: 0,
                height: 2,
                format: Default::default(),
            },
        )
        .expect("respond");
        assert_eq!(
            harness.last(),
            Response::not_created(ErrorCode::InvalidParameter)
        );
    }

    #[test]
    fn blit_copies_pixels_and_refreshes_viewers() {
        let harness = Harness::new();
        let aid = harness.activity();
        harness
            .platform
            .launch_activity(aid, NO_HANDLE, &ActivityOptions::default())
            .expect("launch");
        let image = harness.view(aid, ViewKind::ImageView, None);
        harness
            .platform
            .create_view(aid, image, None, &WidgetSpec::ImageView { keyboard: false })
            .expect("platform view");

        let buffer = harness.ctx.registries.allocate().expect("buffer");
        harness
            .ctx
            .registries
            .buffers
            .insert(buffer, PixelBuffer::new(1, 1));
        harness
            .ctx
            .registries
            .views
            .with_mut(image, |view| view.buffer = Some(buffer))
            .expect("view");

        blit_buffer(
            &harness.ctx,
            BlitBuffer {
                buffer,
                pixels: vec![1, 2, 3, 4],
            },
        )
        .expect("respond");
        blit_buffer(
            &harness.ctx,
            BlitBuffer {
                buffer,
                pixels: vec![1, 2],
            },
        )
        .expect("respond");

        assert_eq!(
            harness.responses(),
            vec![
                Response::ok(),
                Response::failed(ErrorCode::InvalidParameter)
            ]
        );
        let bytes = harness
            .ctx
            .registries
            .buffers
            .with(buffer, |b| b.pixels.as_bytes().to_vec())
            .expect("buffer");
        assert_eq!(bytes, vec![1, 2, 3, 4]);
        assert_eq!(
            harness.platform.view(aid, image).expect("view").mutations,
            vec!["Buffer"]
        );
    }

    #[test]
    fn hardware_buffer_is_released_on_destroy() {
        let harness = Harness::new();
        create_hardware_buffer(&harness.ctx, spec(16, 16)).expect("respond");
        let Response::Created { id, .. } = harness.last() else {
            panic!("expected created response");
        };
        assert_eq!(harness.platform.live_hardware_buffers(), 1);

        destroy_hardware_buffer(&harness.ctx, BufferRef { buffer: id }).expect("respond");
        assert_eq!(harness.last(), Response::ok());
        assert_eq!(harness.platform.released_hardware_buffers(), 1);
        assert!(harness.ctx.registries.hardware_buffers.is_empty());
    }

    #[test]
    fn deleting_a_buffer_unbinds_image_views() {
        let harness = Harness::new();
        let aid = harness.activity();
        let image = harness.view(aid, ViewKind::ImageView, None);
        let buffer = harness.ctx.registries.allocate().expect("buffer");
        harness
            .ctx
            .registries
            .buffers
            .insert(buffer, PixelBuffer::new(1, 1));
        harness
            .ctx
            .registries
            .views
            .with_mut(image, |view| view.buffer = Some(buffer))
            .expect("view");

        delete_buffer(&harness.ctx, BufferRef { buffer }).expect("respond");
        assert_eq!(harness.last(), Response::ok());
        assert_eq!(
            harness.ctx.registries.views.with(image, |view| view.buffer),
            Ok(None)
        );
    }

    #[test]
    fn destroying_a_hardware_buffer_detaches_surfaces() {
        let harness = Harness::new();
        let aid = harness.activity();
        harness
            .platform
            .launch_activity(aid, NO_HANDLE, &ActivityOptions::default())
            .expect("launch");
        let surface = harness.view(aid, ViewKind::SurfaceView, None);
        harness
            .platform
            .create_view(
                aid,
                surface,
                None,
                &WidgetSpec::SurfaceView {
                    keyboard: false,
                    secure: false,
                },
            )
            .expect("platform view");

        create_hardware_buffer(&harness.ctx, spec(4, 4)).expect("respond");
        let Response::Created { id: buffer, .. } = harness.last() else {
            panic!("expected created response");
        };
        set_surface_buffer(
            &harness.ctx,
            SetBuffer {
                aid,
                id: surface,
                buffer,
            },
        )
        .expect("respond");
        assert_eq!(harness.last(), Response::ok());
        assert_eq!(
            harness.ctx.registries.views.with(surface, |view| view.surface_buffer),
            Ok(Some(buffer))
        );
        assert!(
            harness
                .platform
                .view(aid, surface)
                .expect("view")
                .surface_buffer
                .is_some()
        );

        destroy_hardware_buffer(&harness.ctx, BufferRef { buffer }).expect("respond");
        assert_eq!(harness.last(), Response::ok());
        assert_eq!(
            harness.ctx.registries.views.with(surface, |view| view.surface_buffer),
            Ok(None)
        );
        let view = harness.platform.view(aid, surface).expect("view");
        assert_eq!(view.surface_buffer, None);
        assert_eq!(view.mutations, vec!["SurfaceBuffer", "SurfaceBuffer"]);
        assert_eq!(harness.platform.released_hardware_buffers(), 1);

        set_surface_buffer(
            &harness.ctx,
            SetBuffer {
                aid,
                id: surface,
                buffer,
            },
        )
        .expect("respond");
        assert_eq!(harness.last(), Response::failed(ErrorCode::NotFound));
    }

    #[test]
    fn pixel_buffer_cannot_back_a_surface() {
        let harness = Harness::new();
        let aid = harness.activity();
        let surface = harness.view(aid, ViewKind::SurfaceView, None);
        let buffer = harness.ctx.registries.allocate().expect("buffer");
        harness
            .ctx
            .registries
            .buffers
            .insert(buffer, PixelBuffer::new(1, 1));

        set_surface_buffer(
            &harness.ctx,
            SetBuffer {
                aid,
                id: surface,
                buffer,
            },
        )
        .expect("respond");
        assert_eq!(harness.last(), Response::failed(ErrorCode::NotFound));
    }
}
