//! In-memory bulletin and session fixtures for pipeline tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use pgrelay_chat_log::LogTailer;
use pgrelay_credentials::{CredentialEntry, CredentialFile};
use pgrelay_protocol::constants::{DOWNLOAD_ENDPOINT, UPLOAD_ENDPOINT};
use pgrelay_sync::{RelayTransport, SyncClient, SyncError};
use tokio::sync::mpsc;

use crate::config::RelayConfig;
use crate::events::RelayEvent;
use crate::session::RelaySession;

type Form = Vec<(&'static str, String)>;

#[derive(Default)]
struct BulletinState {
    requests: Vec<(String, Form)>,
    downloads: VecDeque<Result<String, SyncError>>,
}

/// Records requests and serves queued download bodies.
#[derive(Clone, Default)]
pub(crate) struct MemoryBulletin {
    state: Arc<Mutex<BulletinState>>,
}

impl MemoryBulletin {
    pub(crate) fn queue_download(&self, body: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .downloads
            .push_back(Ok(body.into()));
    }

    pub(crate) fn queue_failure(&self) {
        self.state
            .lock()
            .unwrap()
            .downloads
            .push_back(Err(SyncError::Timeout));
    }

    pub(crate) fn requests_to(&self, endpoint: &str) -> Vec<Form> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, form)| form.clone())
            .collect()
    }

    pub(crate) fn uploads(&self) -> Vec<Form> {
        self.requests_to(UPLOAD_ENDPOINT)
    }
}

impl RelayTransport for MemoryBulletin {
    fn post_form<'a>(
        &'a self,
        endpoint: &'a str,
        form: &'a [(&'static str, String)],
    ) -> Pin<Box<dyn Future<Output = Result<String, SyncError>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.requests.push((endpoint.to_string(), form.to_vec()));
            if endpoint == DOWNLOAD_ENDPOINT {
                state.downloads.pop_front().unwrap_or_else(|| Ok(String::new()))
            } else {
                Ok(String::new())
            }
        })
    }
}

/// A session wired to an in-memory bulletin and a temp credential file.
pub(crate) struct TestSession {
    pub(crate) session: RelaySession,
    pub(crate) bulletin: MemoryBulletin,
    pub(crate) credentials: Arc<CredentialFile>,
    pub(crate) events: mpsc::Receiver<RelayEvent>,
    _dir: tempfile::TempDir,
}

impl TestSession {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let credentials =
            Arc::new(CredentialFile::open(dir.path().join("credentials.json")).unwrap());
        let bulletin = MemoryBulletin::default();
        let (tx, events) = mpsc::channel(64);

        let config = RelayConfig {
            session_id: "test-session".into(),
            ..RelayConfig::default()
        };
        let tailer = LogTailer::new(vec![dir.path().to_path_buf()], None);
        let client = SyncClient::new(Box::new(bulletin.clone()), "test-session");
        let session = RelaySession::new(config, tailer, client, credentials.clone(), tx);

        Self {
            session,
            bulletin,
            credentials,
            events,
            _dir: dir,
        }
    }

    pub(crate) fn add_credentials(&self, name: &str, guild: &str, auto_update: bool, password: &str) {
        self.credentials
            .upsert(CredentialEntry {
                name: name.into(),
                guild_name: guild.into(),
                auto_update,
                password: password.into(),
            })
            .unwrap();
    }

    pub(crate) fn drain_events(&mut self) -> Vec<RelayEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
