//! Session engine of a remote GUI server.
//!
//! A client drives live windows and widgets through length-prefixed JSON
//! requests on a local socket and receives lifecycle and interaction events
//! on the same stream. The toolkit itself sits behind [`Platform`].

pub mod config;
pub mod dispatch;
pub mod emitter;
pub mod error;
pub mod events;
pub mod handle;
pub mod handlers;
pub mod headless;
pub mod logger;
pub mod methods;
pub mod model;
pub mod platform;
pub mod protocol;
pub mod registry;
pub mod responses;
pub mod session;

use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::Arc;

pub use config::SessionConfig;
pub use dispatch::{Interrupter, Termination};
pub use error::{ErrorCode, HandlerError, PlatformError, ProtocolError, RegistryError};
pub use events::Event;
pub use handle::{Handle, NO_HANDLE};
pub use headless::{HeadlessCall, HeadlessPlatform};
pub use methods::Method;
pub use platform::{LifecycleListener, Platform};
pub use protocol::ServerFrame;
pub use responses::Response;
pub use session::{Session, SessionState};

/// Runs one session over an accepted connection. Interrupting the session
/// shuts down the read half of the socket so a blocked read returns.
pub fn serve_unix_stream(
    stream: UnixStream,
    platform: Arc<dyn Platform>,
    config: &SessionConfig,
    interrupter: Interrupter,
) -> Result<Termination, ProtocolError> {
    let output = stream.try_clone()?;
    let unblock = stream.try_clone()?;
    let mut input = stream;

    let session = Session::with_interrupter(platform, output, config, interrupter)?;
    session.interrupter().on_interrupt(move || {
        if let Err(err) = unblock.shutdown(Shutdown::Read) {
            tracing::debug!(%err, "socket already closed");
        }
    });

    Ok(session.run(&mut input))
}
