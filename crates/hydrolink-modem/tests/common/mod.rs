use std::sync::Arc;

use hydrolink_modem::mock::{MockHandle, MockTransport};
use hydrolink_modem::{EngineConfig, ModemEngine};

/// Install a test subscriber; repeated calls are fine.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Engine wired to a scripted transport, receiver running.
pub fn engine_with_config(
    config: EngineConfig,
) -> (Arc<ModemEngine<MockTransport>>, MockHandle) {
    init_tracing();
    let (transport, handle, chunks) = MockTransport::new();
    let engine = Arc::new(ModemEngine::new(transport, config));
    tokio::spawn(Arc::clone(&engine).run_receiver(chunks));
    (engine, handle)
}

pub fn engine() -> (Arc<ModemEngine<MockTransport>>, MockHandle) {
    engine_with_config(EngineConfig::fast())
}
