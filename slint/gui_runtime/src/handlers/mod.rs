//! Operation handlers, one module per handler group.
//!
//! A handler validates its request against the registries, performs the
//! platform call without holding any registry lock and writes at most one
//! response. Only a failure to write that response is returned as an error.

pub mod activity;
pub mod buffer;
pub mod create;
pub mod global;
pub mod notification;
pub mod remote;
pub mod view;

use std::sync::Arc;

use crate::error::{ErrorCode, HandlerError, ProtocolError, RegistryError};
use crate::handle::Handle;
use crate::logger::Logger;
use crate::model::{View, ViewKind};
use crate::platform::{Platform, ViewMutation};
use crate::protocol::{ServerFrame, SharedWriter, write_server_frame};
use crate::registry::{Registries, ResourceKind};
use crate::responses::Response;

pub type HandlerResult = Result<(), ProtocolError>;

/// Writes responses on the dispatch thread.
pub struct Responder {
    writer: SharedWriter,
    max_payload: usize,
}

impl Responder {
    pub fn new(writer: SharedWriter, max_payload: usize) -> Self {
        Self {
            writer,
            max_payload,
        }
    }

    pub fn send(&self, response: Response) -> HandlerResult {
        write_server_frame(
            &self.writer,
            &ServerFrame::Response(response),
            self.max_payload,
        )
    }
}

/// Everything a handler may touch.
pub struct HandlerContext {
    pub registries: Arc<Registries>,
    pub platform: Arc<dyn Platform>,
    pub logger: Arc<Logger>,
    responder: Responder,
}

impl HandlerContext {
    pub fn new(
        registries: Arc<Registries>,
        platform: Arc<dyn Platform>,
        logger: Arc<Logger>,
        responder: Responder,
    ) -> Self {
        Self {
            registries,
            platform,
            logger,
            responder,
        }
    }

    pub fn respond(&self, response: Response) -> HandlerResult {
        self.responder.send(response)
    }

    fn report(&self, op: &str, err: &HandlerError) {
        self.logger.log(1, op, err.to_string());
    }

    /// Answers with an ack carrying the outcome of `result`.
    pub fn ack(&self, op: &str, result: Result<(), HandlerError>) -> HandlerResult {
        match result {
            Ok(()) => self.respond(Response::ok()),
            Err(err) => {
                self.report(op, &err);
                self.respond(Response::failed(err.code()))
            }
        }
    }

    /// Answers with the new handle, or `-1` and the failure code.
    pub fn created(&self, op: &str, result: Result<Handle, HandlerError>) -> HandlerResult {
        match result {
            Ok(id) => self.respond(Response::created(id)),
            Err(err) => {
                self.report(op, &err);
                self.respond(Response::not_created(err.code()))
            }
        }
    }

    /// Answers with `ok(value)` or with `failed(code)`.
    pub fn reply<T>(
        &self,
        op: &str,
        result: Result<T, HandlerError>,
        ok: impl FnOnce(T) -> Response,
        failed: impl FnOnce(ErrorCode) -> Response,
    ) -> HandlerResult {
        match result {
            Ok(value) => self.respond(ok(value)),
            Err(err) => {
                self.report(op, &err);
                self.respond(failed(err.code()))
            }
        }
    }

    /// Fails unless `aid` is a live activity or overlay.
    pub fn container(&self, aid: Handle) -> Result<(), HandlerError> {
        if self.registries.is_container(aid) {
            Ok(())
        } else {
            Err(RegistryError::NotFound {
                kind: ResourceKind::Activity,
                handle: aid,
            }
            .into())
        }
    }

    /// Snapshot of view `id`, which must belong to `aid`.
    pub fn view(&self, aid: Handle, id: Handle) -> Result<View, HandlerError> {
        self.container(aid)?;
        match self.registries.views.owner_of(id)? {
            Some(owner) if owner == aid => Ok(self.registries.views.get(id)?),
            _ => Err(RegistryError::NotFound {
                kind: ResourceKind::View,
                handle: id,
            }
            .into()),
        }
    }

    /// Like [`HandlerContext::view`], additionally checking the kind.
    pub fn view_of(
        &self,
        aid: Handle,
        id: Handle,
        expected: &'static str,
        accepts: fn(ViewKind) -> bool,
    ) -> Result<View, HandlerError> {
        let view = self.view(aid, id)?;
        if accepts(view.kind) {
            Ok(view)
        } else {
            Err(HandlerError::InvalidViewType {
                id,
                kind: view.kind,
                expected,
            })
        }
    }

    /// Applies `mutation` through the platform.
    pub fn update(
        &self,
        aid: Handle,
        id: Handle,
        mutation: &ViewMutation,
    ) -> Result<(), HandlerError> {
        tracing::trace!(aid, id, mutation = mutation.name(), "update view");
        Ok(self.platform.update_view(aid, id, mutation)?)
    }

    /// Records a model change for a view already checked with
    /// [`HandlerContext::view`].
    pub fn record(&self, id: Handle, f: impl FnOnce(&mut View)) -> Result<(), HandlerError> {
        Ok(self.registries.views.with_mut(id, f)?)
    }
}

pub(crate) fn any_view(_: ViewKind) -> bool {
    true
}
