use std::sync::{Arc, Mutex};
use std::time::Duration;

use hub_pool::{Mode, PoolStore};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::io::{connect_upstream, read_prologue, read_sniff};
use crate::sniff::{keyword_hit, status_code_hit};
use crate::splice::splice;

/// Tunables for the dispatcher state machine (§4.5, §6 "Configuration").
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub prologue_timeout: Duration,
    pub connect_timeout: Duration,
    pub sniff_timeout: Duration,
    pub max_retries: u32,
    pub fail_threshold: u32,
    pub switch_status_codes: Vec<u16>,
    pub switch_keywords: Vec<String>,
}

/// The hub's data plane: accept loop plus the per-connection
/// READ_PROLOGUE → SELECT → CONNECT_UPSTREAM → FORWARD_PROLOGUE → BRANCH →
/// SNIFF → SPLICE state machine (§4.5).
pub struct Dispatcher {
    store: Arc<PoolStore>,
    settings: DispatchSettings,
    mode: Mutex<Mode>,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(store: Arc<PoolStore>, settings: DispatchSettings, max_connections: usize) -> Arc<Self> {
        Arc::new(Self {
            store,
            settings,
            mode: Mutex::new(Mode::All),
            semaphore: Arc::new(Semaphore::new(max_connections.max(1))),
        })
    }

    /// Admin "set hub mode" (§6).
    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn mode(&self) -> Mode {
        *self.mode.lock().unwrap()
    }

    /// Admin "manual switch" (§6, §4.5.1): advance the shared cursor without
    /// serving the upstream it currently points at.
    pub fn manual_switch(&self) {
        self.store.next_cursor();
    }

    /// Accepts connections forever, each on its own task gated by the
    /// connection-admission semaphore.
    pub async fn accept_loop(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        loop {
            let (stream, addr) = listener.accept().await?;
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => continue,
            };

            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = permit;
                let span = tracing::info_span!("dispatch_connection", client = %addr);
                let _enter = span.enter();
                dispatcher.handle_connection(stream).await;
            });
        }
    }

    #[instrument(skip(self, client))]
    async fn handle_connection(&self, mut client: TcpStream) {
        let Some(prologue) = read_prologue(&mut client, self.settings.prologue_timeout).await else {
            debug!(target: "hub_dispatch", "prologue unreadable; closing client");
            return;
        };

        let is_connect = prologue.starts_with(b"CONNECT");

        for attempt in 0..self.settings.max_retries {
            let Some(upstream_url) = self.select() else {
                debug!(target: "hub_dispatch", attempt, "no live upstream available; closing client");
                return;
            };

            let mut upstream = match connect_upstream(&upstream_url, self.settings.connect_timeout).await {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(target: "hub_dispatch", upstream = %upstream_url, error = %err, "upstream unreachable");
                    self.store.mark_failure(&upstream_url, self.settings.fail_threshold);
                    continue;
                }
            };

            if let Err(err) = upstream.write_all(&prologue).await.and(upstream.flush().await) {
                warn!(target: "hub_dispatch", upstream = %upstream_url, error = %err, "failed forwarding prologue");
                self.store.mark_failure(&upstream_url, self.settings.fail_threshold);
                continue;
            }

            if is_connect {
                self.store.mark_success(&upstream_url);
                splice(client, upstream).await;
                return;
            }

            let sniff = match read_sniff(&mut upstream, self.settings.sniff_timeout).await {
                Ok(buf) => buf,
                Err(err) => {
                    warn!(target: "hub_dispatch", upstream = %upstream_url, error = %err, "sniff read failed");
                    self.store.mark_failure(&upstream_url, self.settings.fail_threshold);
                    continue;
                }
            };

            if status_code_hit(&sniff, &self.settings.switch_status_codes)
                || keyword_hit(&sniff, &self.settings.switch_keywords)
            {
                debug!(target: "hub_dispatch", upstream = %upstream_url, "sniff hit; rotating");
                self.store.mark_failure(&upstream_url, self.settings.fail_threshold);
                continue;
            }

            if client.write_all(&sniff).await.is_err() {
                return;
            }

            self.store.mark_success(&upstream_url);
            info!(target: "hub_dispatch", upstream = %upstream_url, attempt, "splicing");
            splice(client, upstream).await;
            return;
        }

        debug!(target: "hub_dispatch", "retry budget exhausted; closing client");
    }

    /// Rotation picker (§4.5.1): snapshot the live pool under the current
    /// mode, then index it with the shared cursor.
    fn select(&self) -> Option<String> {
        let mode = self.mode();
        let live = self.store.live(mode);
        if live.is_empty() {
            return None;
        }
        let cursor = self.store.next_cursor();
        Some(live[cursor % live.len()].url.clone())
    }
}
