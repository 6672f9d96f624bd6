//! RegimeLab Runner: project-level orchestration on top of `regimelab-core`.
//!
//! - `regimelab.toml` configuration (file locations, regime overrides)
//! - `Workspace`: lazy matrix loading, catalog resolution, model creation and
//!   loading, batch signal generation, regime classification with persistence
//! - CSV export of signal tables and regime detail

pub mod config;
pub mod export;
pub mod workspace;

pub use config::{ConfigError, PathsConfig, RegimeOverride, RegimelabConfig, DEFAULT_CONFIG_FILE};
pub use export::{export_regime_detail_csv, SignalTable};
pub use workspace::{Workspace, WorkspaceError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn workspace_is_send_sync() {
        assert_send::<Workspace>();
        assert_sync::<Workspace>();
    }

    #[test]
    fn signal_table_is_send_sync() {
        assert_send::<SignalTable>();
        assert_sync::<SignalTable>();
    }
}
