use std::sync::Arc;

mod config;
mod error;
mod gallery;
mod handler;
mod http;
mod logger;
mod primitive;
mod server;
mod store;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Size the runtime from the workers setting; default is one per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(config::AppState::new(&cfg));

    if let Err(e) = state.store.ensure_dir().await {
        logger::log_error(&format!(
            "Cannot create image directory {}: {e}",
            state.store.dir().display()
        ));
        return Err(e.into());
    }

    let server = server::Server::bind(addr, state)?;
    let addr = server.local_addr()?;
    let handle = server.shutdown_handle();
    logger::log_server_start(&addr, &cfg);

    let mut run = tokio::spawn(server.run());
    tokio::select! {
        result = &mut run => {
            result??;
            return Ok(());
        }
        result = server::wait_for_shutdown_signal() => result?,
    }

    handle.shutdown();
    run.await??;
    Ok(())
}
