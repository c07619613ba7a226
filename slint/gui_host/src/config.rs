use std::path::PathBuf;

use gui_session_runtime::SessionConfig;

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_SOCKET_NAME: &str = "gui-host.sock";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub socket_path: PathBuf,
    pub log_filter: String,
    pub session: SessionConfig,
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let socket_path = lookup("GUI_HOST_SOCKET")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                lookup("TMPDIR")
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(std::env::temp_dir)
                    .join(DEFAULT_SOCKET_NAME)
            });

        let log_filter = lookup("GUI_HOST_LOG")
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            socket_path,
            log_filter,
            session: SessionConfig::from_lookup(lookup),
        }
    }
}
