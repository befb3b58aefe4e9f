//! In-memory fakes for interactor tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use exnota_auth_bridge::{ApiFailure, NotionGrant, StoredToken};

use crate::repository::TokenRepository;
use crate::workspace::WorkspaceClient;

#[derive(Default)]
pub struct MemoryRepo {
    token: Mutex<Option<StoredToken>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MemoryRepo {
    pub fn with_token(token: &str) -> Self {
        let repo = Self::default();
        *repo.token.lock().unwrap() = Some(StoredToken::new(token));
        repo
    }

    pub fn stored(&self) -> Option<StoredToken> {
        self.token.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRepository for MemoryRepo {
    async fn load(&self) -> Result<Option<StoredToken>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("disk on fire"));
        }
        Ok(self.stored())
    }

    async fn save(&self, token: &StoredToken) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("read-only filesystem"));
        }
        *self.token.lock().unwrap() = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("read-only filesystem"));
        }
        self.token.lock().unwrap().take();
        Ok(())
    }
}

/// Scripted Notion API.
pub struct FakeWorkspace {
    pub check: Result<(), ApiFailure>,
    pub exchange: Result<NotionGrant, ApiFailure>,
    pub pages: Result<Vec<String>, ApiFailure>,
    pub exchanges: AtomicUsize,
}

impl FakeWorkspace {
    pub fn granting(pages: &[&str]) -> Self {
        Self {
            check: Ok(()),
            exchange: Ok(NotionGrant {
                access_token: "ntn_granted".to_string(),
                workspace_id: Some("ws-1".to_string()),
                workspace_name: Some("Notes".to_string()),
                bot_id: Some("bot-1".to_string()),
            }),
            pages: Ok(pages.iter().map(|p| p.to_string()).collect()),
            exchanges: AtomicUsize::new(0),
        }
    }

    pub fn status(status: u16) -> ApiFailure {
        ApiFailure::Status { status, code: None }
    }
}

#[async_trait]
impl WorkspaceClient for FakeWorkspace {
    async fn check_token(&self, _token: &str) -> Result<(), ApiFailure> {
        self.check.clone()
    }

    async fn exchange_code(&self, _code: &str, _redirect_url: &str) -> Result<NotionGrant, ApiFailure> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        self.exchange.clone()
    }

    async fn granted_page_ids(&self, _token: &str) -> Result<Vec<String>, ApiFailure> {
        self.pages.clone()
    }
}
