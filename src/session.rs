//! Ties the sync pipeline to the signed-in state.
//!
//! The auth side publishes an [`AuthEvent`] on a `watch` channel. The
//! session observes it from the UI loop: signing in starts the scheduler,
//! signing out stops it and resets the store so the next user starts from
//! fallbacks.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::client::FetchClient;
use crate::scheduler::Scheduler;
use crate::store::{self, DataStore, SharedStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedOut,
    SignedIn { user: String, token: Option<String> },
}

impl AuthEvent {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

/// Publisher side handed to whoever performs the login.
pub fn auth_channel() -> (watch::Sender<AuthEvent>, watch::Receiver<AuthEvent>) {
    watch::channel(AuthEvent::SignedOut)
}

pub struct Session {
    auth: watch::Receiver<AuthEvent>,
    scheduler: Scheduler,
    client: Arc<FetchClient>,
    store: SharedStore,
    user: Option<String>,
}

impl Session {
    pub fn new(
        auth: watch::Receiver<AuthEvent>,
        scheduler: Scheduler,
        client: Arc<FetchClient>,
        store: SharedStore,
    ) -> Self {
        Self {
            auth,
            scheduler,
            client,
            store,
            user: None,
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Apply the latest auth change, if there is one.
    pub fn poll(&mut self) -> Option<AuthEvent> {
        match self.auth.has_changed() {
            Ok(true) => {}
            Ok(false) => return None,
            Err(_) => {
                // Auth publisher is gone; nobody can be signed in any more
                if self.scheduler.is_running() {
                    self.sign_out();
                    return Some(AuthEvent::SignedOut);
                }
                return None;
            }
        }

        let state = self.auth.borrow_and_update().clone();
        match &state {
            AuthEvent::SignedIn { user, token } => {
                info!(%user, "Signed in, starting sync");
                self.client.set_token(token.clone());
                self.user = Some(user.clone());
                self.scheduler.start();
            }
            AuthEvent::SignedOut => self.sign_out(),
        }
        Some(state)
    }

    fn sign_out(&mut self) {
        info!(user = self.user.as_deref().unwrap_or("-"), "Signed out, stopping sync");
        self.scheduler.stop();
        self.client.set_token(None);
        self.user = None;
        *store::write(&self.store) = DataStore::new();
    }

    pub fn shutdown(&mut self) {
        self.scheduler.stop();
    }
}
