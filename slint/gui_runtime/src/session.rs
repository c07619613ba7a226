//! One client connection from listener installation to teardown.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::SessionConfig;
use crate::dispatch::{Dispatcher, Interrupter, Termination};
use crate::emitter::{EventEmitter, SessionListener};
use crate::error::ProtocolError;
use crate::handle::HandleAllocator;
use crate::handlers::{HandlerContext, Responder};
use crate::logger::Logger;
use crate::platform::{ListenerToken, Platform};
use crate::protocol::{shared_writer, writer_loop};
use crate::registry::{Registries, lock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    ListenersInstalled = 1,
    Running = 2,
    TearingDown = 3,
    Closed = 4,
}

impl SessionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::ListenersInstalled,
            2 => Self::Running,
            3 => Self::TearingDown,
            _ => Self::Closed,
        }
    }
}

type WriterHandle = JoinHandle<Result<(), ProtocolError>>;

/// Owns every resource a client created. Tearing the session down, whether
/// after [`Session::run`] returns or on drop, releases all of them exactly
/// once.
pub struct Session {
    dispatcher: Dispatcher,
    emitter: EventEmitter,
    interrupter: Interrupter,
    state: AtomicU8,
    listener: Mutex<Option<ListenerToken>>,
    writer: Mutex<Option<WriterHandle>>,
}

impl Session {
    /// Prepares a session writing frames to `output` and starts its event
    /// writer thread.
    pub fn new(
        platform: Arc<dyn Platform>,
        output: impl Write + Send + 'static,
        config: &SessionConfig,
    ) -> Result<Self, ProtocolError> {
        Self::with_interrupter(platform, output, config, Interrupter::default())
    }

    /// Like [`Session::new`], stopped by an interrupter the caller already
    /// holds.
    pub fn with_interrupter(
        platform: Arc<dyn Platform>,
        output: impl Write + Send + 'static,
        config: &SessionConfig,
        interrupter: Interrupter,
    ) -> Result<Self, ProtocolError> {
        let writer = shared_writer(output);
        let (tx, rx) = mpsc::channel();

        let event_writer = writer.clone();
        let max_payload = config.max_frame_bytes;
        let writer_handle = thread::Builder::new()
            .name("gui-session-events".to_string())
            .spawn(move || writer_loop(rx, event_writer, max_payload))?;

        let registries = Arc::new(Registries::new(HandleAllocator::with_limit(
            config.handle_limit,
        )));
        let logger = Arc::new(Logger::new(config.log_level));
        let ctx = HandlerContext::new(
            registries,
            platform,
            logger,
            Responder::new(writer, config.max_frame_bytes),
        );

        Ok(Self {
            dispatcher: Dispatcher::new(ctx, config.max_frame_bytes, interrupter.clone()),
            emitter: EventEmitter::new(tx),
            interrupter,
            state: AtomicU8::new(SessionState::Idle as u8),
            listener: Mutex::new(None),
            writer: Mutex::new(Some(writer_handle)),
        })
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    pub fn context(&self) -> &HandlerContext {
        self.dispatcher.context()
    }

    /// Installs the lifecycle listener, serves requests from `input` and
    /// tears the session down. A session runs at most once.
    pub fn run(&self, input: &mut impl Read) -> Termination {
        if self
            .state
            .compare_exchange(
                SessionState::Idle as u8,
                SessionState::ListenersInstalled as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            tracing::warn!(state = ?self.state(), "session already ran");
            return Termination::Interrupted;
        }

        let installed = self.install_listener();

        // Lose the race with a concurrent teardown rather than overwrite it.
        let _ = self.state.compare_exchange(
            SessionState::ListenersInstalled as u8,
            SessionState::Running as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        let termination = if installed && self.state() == SessionState::Running {
            tracing::info!("session running");
            self.dispatcher.run(input)
        } else {
            Termination::Interrupted
        };

        match &termination {
            Termination::Protocol(err) => tracing::warn!(%err, "session ended by protocol error"),
            other => tracing::info!(termination = ?other, "session ended"),
        }
        self.teardown();
        termination
    }

    /// Installs the lifecycle listener unless teardown already began. The
    /// token is stored under the same lock teardown takes after leaving
    /// `ListenersInstalled`, so an installed listener is always removed.
    fn install_listener(&self) -> bool {
        let mut slot = lock(&self.listener);
        if self.state() != SessionState::ListenersInstalled {
            return false;
        }
        let ctx = self.context();
        let listener = SessionListener::new(
            ctx.registries.clone(),
            self.emitter.clone(),
            ctx.logger.clone(),
        );
        *slot = Some(ctx.platform.add_listener(Arc::new(listener)));
        true
    }

    /// Releases everything the session owns. Only the first call does
    /// anything.
    pub fn teardown(&self) {
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            if current >= SessionState::TearingDown as u8 {
                return;
            }
            match self.state.compare_exchange(
                current,
                SessionState::TearingDown as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let ctx = self.context();
        let token = lock(&self.listener).take();
        if let Some(token) = token {
            ctx.platform.remove_listener(token);
        }

        release_resources(ctx);

        self.emitter.close();
        if let Some(handle) = lock(&self.writer).take() {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!(%err, "event writer failed"),
                Err(_) => tracing::error!("event writer panicked"),
            }
        }

        self.state
            .store(SessionState::Closed as u8, Ordering::SeqCst);
        tracing::debug!("session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Empties every registry, giving platform-owned resources back. Each
/// registry is drained under its own lock before the platform is called.
fn release_resources(ctx: &HandlerContext) {
    let registries = &ctx.registries;
    let platform = &ctx.platform;

    for (aid, _) in registries.overlays.drain() {
        registries.remove_views_of(aid);
        platform.destroy_overlay(aid);
    }
    for (aid, activity) in registries.activities.drain() {
        registries.remove_views_of(aid);
        if let Err(err) = platform.finish_activity(aid) {
            tracing::debug!(aid, tid = activity.task, %err, "activity already gone");
        }
    }
    registries.views.drain();

    for (_, buffer) in registries.hardware_buffers.drain() {
        platform.release_hardware_buffer(buffer.raw);
    }
    for (id, _) in registries.notifications.drain() {
        platform.cancel_notification(id);
    }
    registries.buffers.drain();
    registries.remote_layouts.drain();
    registries.tasks.drain();
    lock(&registries.channels).clear();

    registries.allocator.release_all();
}
