//! Session use-cases: signup, login, logout and profile loading.
//!
//! # Responsibility
//! - Drive the identity provider and build the explicit `Session` object
//!   handed to the task and theme services.
//! - Keep the mirrored profile in step with the backend profile.
//!
//! # Invariants
//! - Signup and login hard-fail when offline; there is no offline path.
//! - Signup validation runs before the connectivity check.
//! - Logout clears every mirror slot.

use crate::auth::identity::{AuthError, AuthResult, AuthUser, IdentityProvider, SocialProvider};
use crate::auth::validation::SignupRequest;
use crate::clock::Clock;
use crate::connectivity::Connectivity;
use crate::mirror::local_mirror::LocalMirror;
use crate::model::profile::UserProfile;
use crate::remote::document_store::DocumentStore;
use log::{info, warn};
use std::sync::Arc;

const DEFAULT_PROFILE_NAME: &str = "User";

/// Signed-in identity plus its profile, when one could be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: AuthUser,
    pub profile: Option<UserProfile>,
}

impl Session {
    pub fn new(user: AuthUser, profile: Option<UserProfile>) -> Self {
        Self { user, profile }
    }

    pub fn uid(&self) -> &str {
        &self.user.uid
    }
}

/// Authentication and profile use-case service.
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    mirror: LocalMirror,
    connectivity: Arc<dyn Connectivity>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        mirror: LocalMirror,
        connectivity: Arc<dyn Connectivity>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            store,
            mirror,
            connectivity,
            clock,
        }
    }

    /// Creates an account and its profile.
    ///
    /// # Errors
    /// - `Validation` for incomplete or inconsistent form input.
    /// - `OfflineRequired` when the client is offline.
    /// - Provider errors from account creation.
    pub fn signup(&self, request: &SignupRequest) -> AuthResult<Session> {
        request.validate()?;
        self.require_online("Account creation requires an internet connection")?;

        let user = self
            .identity
            .create_user(request.email.trim(), &request.password)?;
        let name = request.name.trim();
        let user = match self.identity.update_display_name(&user.uid, name) {
            Ok(updated) => updated,
            Err(err) => {
                warn!(
                    "event=auth_signup module=auth_service status=degraded uid={} error={}",
                    user.uid, err
                );
                user
            }
        };
        let profile = self.create_profile(&user, Some(name), request.normalized_phone());
        info!("event=auth_signup module=auth_service status=ok uid={}", user.uid);
        Ok(Session::new(user, Some(profile)))
    }

    /// Email/password login.
    pub fn login(&self, email: &str, password: &str) -> AuthResult<Session> {
        self.require_online("Login requires an internet connection")?;
        let user = self.identity.sign_in_with_password(email.trim(), password)?;
        let profile = self.load_profile(&user);
        info!("event=auth_login module=auth_service status=ok uid={}", user.uid);
        Ok(Session::new(user, profile))
    }

    /// Social login; creates the profile on first sign-in.
    pub fn login_with_social(&self, provider: SocialProvider) -> AuthResult<Session> {
        self.require_online("Social login requires an internet connection")?;
        let user = self.identity.sign_in_with_social(provider)?;

        let profile = match self.store.get_profile(&user.uid) {
            Ok(Some(profile)) => {
                self.mirror.set_profile(&profile);
                profile
            }
            Ok(None) => self.create_profile(&user, None, None),
            Err(err) => {
                warn!(
                    "event=auth_social module=auth_service status=fallback provider={} error={}",
                    provider.as_str(),
                    err
                );
                self.create_profile(&user, None, None)
            }
        };
        info!(
            "event=auth_social module=auth_service status=ok provider={} uid={}",
            provider.as_str(),
            user.uid
        );
        Ok(Session::new(user, Some(profile)))
    }

    /// Signs out and clears the local mirror.
    pub fn logout(&self) -> AuthResult<()> {
        self.identity.sign_out()?;
        self.mirror.clear();
        info!("event=auth_logout module=auth_service status=ok");
        Ok(())
    }

    /// Rebuilds the session for the provider's current user, if any.
    pub fn current_session(&self) -> Option<Session> {
        let user = self.identity.current_user()?;
        let profile = self.load_profile(&user);
        Some(Session::new(user, profile))
    }

    /// Loads the profile for `user`.
    ///
    /// Online: backend profile (mirrored on hit, `None` on miss, mirror on
    /// error). Offline: the mirrored profile when it belongs to `user`.
    pub fn load_profile(&self, user: &AuthUser) -> Option<UserProfile> {
        if !self.connectivity.is_online() {
            return self
                .mirror
                .profile()
                .filter(|profile| profile.uid == user.uid);
        }

        match self.store.get_profile(&user.uid) {
            Ok(Some(profile)) => {
                self.mirror.set_profile(&profile);
                Some(profile)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(
                    "event=profile_load module=auth_service status=fallback uid={} error={}",
                    user.uid, err
                );
                self.mirror.profile()
            }
        }
    }

    fn create_profile(
        &self,
        user: &AuthUser,
        name: Option<&str>,
        phone: Option<String>,
    ) -> UserProfile {
        let name = user
            .display_name
            .as_deref()
            .or(name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_PROFILE_NAME);
        let profile = UserProfile::new(
            user.uid.clone(),
            user.email.clone().unwrap_or_default(),
            name,
            phone,
            self.clock.now_ms(),
        );

        if let Err(err) = self.store.set_profile(&profile) {
            warn!(
                "event=profile_create module=auth_service status=fallback uid={} error={}",
                profile.uid, err
            );
        }
        self.mirror.set_profile(&profile);
        profile
    }

    fn require_online(&self, message: &'static str) -> AuthResult<()> {
        if self.connectivity.is_online() {
            return Ok(());
        }
        Err(AuthError::OfflineRequired(message))
    }
}
