use disputes_bench::prelude::*;
use mock_service::{MockConfig, MockServer};
use std::num::NonZeroU32;
use std::sync::{Arc, OnceLock};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("disputes_bench=debug,mock_service=debug")
            .try_init();
    });
}

/// Mock server with `config` and a bench configuration pointed at it.
#[allow(unused)]
pub async fn setup(mock: MockConfig, max_pages: u32) -> (MockServer, Arc<Config>) {
    init();

    let server = mock_service::spawn(mock).await.unwrap();
    let mut config = Config::new(&server.base_url()).unwrap();
    config.max_pages = NonZeroU32::new(max_pages).unwrap();

    (server, Arc::new(config))
}

/// One `last_1d` flow against the mock through the real HTTP client.
#[allow(unused)]
pub async fn single_flow(config: Arc<Config>, registry: &Registry) -> FlowResult {
    let client = Arc::new(HttpTransport::new(&config, registry).unwrap());
    Flow::new(LAST_1D, config, client, registry)
        .run()
        .await
        .unwrap()
}
