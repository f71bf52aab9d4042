use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INIT: OnceCell<()> = OnceCell::new();

/// Installs the fmt subscriber, honouring `RUST_LOG`. Safe to call more than
/// once; only the first call has any effect.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("festival_companion=info"));
        // Another subscriber may already be installed by the host application.
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
