mod config;

use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::thread;

use gui_session_runtime::{HeadlessPlatform, Interrupter, Termination, serve_unix_stream};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_LOG_FILTER, HostConfig};

fn main() {
    if let Err(err) = run() {
        eprintln!("gui_host fatal error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = HostConfig::from_env();
    init_tracing(&config.log_filter)?;

    remove_stale_socket(&config.socket_path)?;
    let listener = UnixListener::bind(&config.socket_path)?;
    tracing::info!(socket = %config.socket_path.display(), "listening");

    for (session_id, incoming) in (1_u64..).zip(listener.incoming()) {
        match incoming {
            Ok(stream) => spawn_session(session_id, stream, &config)?,
            Err(err) => tracing::warn!(%err, "accept failed"),
        }
    }

    Ok(())
}

fn init_tracing(filter: &str) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid GUI_HOST_LOG filter {filter:?}: {err}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| -> Box<dyn std::error::Error> { err })
}

fn remove_stale_socket(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(socket = %path.display(), "removed stale socket");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Serves one connection on its own thread. Every session gets its own
/// platform so handles never leak between clients.
fn spawn_session(session_id: u64, stream: UnixStream, config: &HostConfig) -> io::Result<()> {
    let session_config = config.session.clone();
    thread::Builder::new()
        .name(format!("gui-session-{session_id}"))
        .spawn(move || {
            let span = tracing::info_span!("session", id = session_id);
            let _entered = span.enter();

            let platform = Arc::new(HeadlessPlatform::new());
            match serve_unix_stream(stream, platform, &session_config, Interrupter::default()) {
                Ok(Termination::Protocol(err)) => tracing::warn!(%err, "session failed"),
                Ok(termination) => tracing::info!(?termination, "session finished"),
                Err(err) => tracing::error!(%err, "session could not start"),
            }
        })?;
    Ok(())
}
