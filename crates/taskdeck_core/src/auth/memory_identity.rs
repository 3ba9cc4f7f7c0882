//! In-process `IdentityProvider`.

use crate::auth::identity::{AuthError, AuthResult, AuthUser, IdentityProvider, SocialProvider};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

struct Account {
    password: String,
    user: AuthUser,
}

#[derive(Default)]
struct IdentityState {
    accounts: BTreeMap<String, Account>,
    social: BTreeMap<SocialProvider, AuthUser>,
    current: Option<AuthUser>,
    unavailable: bool,
}

/// Email/password and social identities kept in memory.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    state: Mutex<IdentityState>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the identity a social popup will return for `provider`.
    pub fn register_social(
        &self,
        provider: SocialProvider,
        email: &str,
        display_name: Option<&str>,
    ) -> AuthUser {
        let user = AuthUser {
            uid: new_uid(),
            email: Some(email.to_string()),
            display_name: display_name.map(str::to_string),
        };
        self.lock().social.insert(provider, user.clone());
        user
    }

    /// Makes every provider call fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    fn lock(&self) -> MutexGuard<'_, IdentityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available(&self) -> AuthResult<MutexGuard<'_, IdentityState>> {
        let state = self.lock();
        if state.unavailable {
            return Err(AuthError::Provider("network-request-failed".to_string()));
        }
        Ok(state)
    }
}

fn new_uid() -> String {
    Uuid::new_v4().simple().to_string()
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl IdentityProvider for MemoryIdentityProvider {
    fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let mut state = self.available()?;
        let user = match state.accounts.get(&email_key(email)) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        state.current = Some(user.clone());
        Ok(user)
    }

    fn create_user(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let mut state = self.available()?;
        let key = email_key(email);
        if state.accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse(key));
        }
        let user = AuthUser {
            uid: new_uid(),
            email: Some(key.clone()),
            display_name: None,
        };
        state.accounts.insert(
            key,
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        state.current = Some(user.clone());
        Ok(user)
    }

    fn sign_in_with_social(&self, provider: SocialProvider) -> AuthResult<AuthUser> {
        let mut state = self.available()?;
        let user = state.social.get(&provider).cloned().ok_or_else(|| {
            AuthError::Provider(format!("popup closed by user ({})", provider.as_str()))
        })?;
        state.current = Some(user.clone());
        Ok(user)
    }

    fn update_display_name(&self, uid: &str, display_name: &str) -> AuthResult<AuthUser> {
        let mut state = self.available()?;
        let account = state
            .accounts
            .values_mut()
            .find(|account| account.user.uid == uid)
            .ok_or_else(|| AuthError::Provider(format!("user not found: {uid}")))?;
        account.user.display_name = Some(display_name.to_string());
        let user = account.user.clone();
        if state.current.as_ref().is_some_and(|current| current.uid == uid) {
            state.current = Some(user.clone());
        }
        Ok(user)
    }

    fn sign_out(&self) -> AuthResult<()> {
        self.lock().current = None;
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.lock().current.clone()
    }
}
