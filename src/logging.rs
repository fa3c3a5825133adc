use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// install a global fmt subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("card_billing_rs=info"));

        // another subscriber may already be installed by the host application
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
