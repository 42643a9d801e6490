use anyhow::{bail, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fmt;

use crate::domain::models::Credential;
use crate::infra::credentials::CredentialStore;
use crate::infra::tmdb::AuthApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    TokenRequested,
    AwaitingUserConfirmation,
    Exchanging,
    Authorized,
    Failed,
}

/// Source of the operator's "I approved the token" signal.
pub trait Confirmation {
    fn confirm(&mut self, prompt: &str) -> Result<()>;
}

/// Blocks on the terminal until the user presses Enter.
pub struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn confirm(&mut self, prompt: &str) -> Result<()> {
        println!("{prompt}");
        let mut rl = DefaultEditor::new()?;
        match rl.readline(">> ") {
            Ok(_) => Ok(()),
            Err(ReadlineError::Interrupted) => bail!("Interrupted"),
            Err(ReadlineError::Eof) => bail!("EOF"),
            Err(err) => Err(err.into()),
        }
    }
}

/// Request token -> user approval -> access token -> saved credential.
pub struct AuthorizationFlow<'a, A, C> {
    api: &'a A,
    confirmation: C,
    store: &'a CredentialStore,
    state: AuthState,
}

impl<'a, A: AuthApi, C: Confirmation> AuthorizationFlow<'a, A, C> {
    pub fn new(api: &'a A, confirmation: C, store: &'a CredentialStore) -> Self {
        Self {
            api,
            confirmation,
            store,
            state: AuthState::Idle,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Runs the whole handshake. Nothing is written unless every step succeeds.
    pub fn run(&mut self) -> Option<Credential> {
        self.state = AuthState::Idle;

        println!("Requesting token...");
        let request_token = match self.api.request_token() {
            Ok(token) => token,
            Err(e) => return self.fail("requesting a token", e),
        };
        self.transition(AuthState::TokenRequested);

        println!("Visit: {}", self.api.authorization_url(&request_token));
        self.transition(AuthState::AwaitingUserConfirmation);
        if let Err(e) = self
            .confirmation
            .confirm("Did you approve the token? Press Enter to continue...")
        {
            return self.fail("waiting for approval", e);
        }

        self.transition(AuthState::Exchanging);
        let token = match self.api.access_token(&request_token) {
            Ok(token) => token,
            Err(e) => return self.fail("exchanging the request token", e),
        };

        let credential = Credential { token };
        println!("Saving access token...");
        if let Err(e) = self.store.save(&credential) {
            return self.fail("saving the access token", e);
        }

        self.transition(AuthState::Authorized);
        println!("Access token saved to {}", self.store.path().display());
        Some(credential)
    }

    fn transition(&mut self, next: AuthState) {
        tracing::debug!("Authorization {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, step: &str, err: impl fmt::Display) -> Option<Credential> {
        tracing::error!("Authorization failed while {step}: {err}");
        self.transition(AuthState::Failed);
        None
    }
}
