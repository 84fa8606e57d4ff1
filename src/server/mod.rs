// Server module entry
// Explicit server object: bind, run until stopped, stop through a handle

pub mod connection;
pub mod listener;
pub mod signal;

use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::AppState;
use crate::logger;

pub use listener::create_listener;
pub use signal::wait_for_shutdown_signal;

/// Stops a running `Server` from another task
#[derive(Clone)]
pub struct ShutdownHandle(Arc<Notify>);

impl ShutdownHandle {
    /// Request shutdown; safe to call before `run` starts polling
    pub fn shutdown(&self) {
        self.0.notify_one();
    }
}

pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
}

impl Server {
    /// Bind the listening socket; nothing is accepted until `run`
    pub fn bind(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<Self> {
        Ok(Self {
            listener: create_listener(addr)?,
            state,
            active_connections: Arc::new(AtomicUsize::new(0)),
            shutdown: Arc::new(Notify::new()),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Accept connections until shutdown is requested.
    ///
    /// Connections already being served keep running in their own tasks.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.listener.local_addr()?;
        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            connection::accept_connection(
                                stream,
                                peer_addr,
                                &self.state,
                                &self.active_connections,
                            );
                        }
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }

                () = self.shutdown.notified() => {
                    logger::log_server_stop(&addr);
                    return Ok(());
                }
            }
        }
    }
}
