/// Signed-in identity context
///
/// The session is an explicit object owned by the application and passed
/// to whatever needs it. Interested parts of the UI subscribe and get a
/// `watch` receiver; dropping the receiver unsubscribes.

use tokio::sync::watch;
use tracing::info;

use super::data::{Identity, UserProfile};

/// Current identity plus its mirrored profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub profile: Option<UserProfile>,
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Admin console is only reachable for profiles with the admin flag
    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_admin)
    }
}

#[derive(Debug)]
pub struct Session {
    sender: watch::Sender<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::default());
        Self { sender }
    }

    /// Subscribe to identity changes. The receiver starts out marked as
    /// seen; `has_changed` turns true on the next sign-in or sign-out.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.sender.borrow().identity.clone()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// A sign-in (or profile reload) finished
    pub fn signed_in(&self, identity: Identity, profile: UserProfile) {
        info!(uid = %identity.uid, admin = profile.is_admin, "signed in");
        self.sender.send_replace(SessionState {
            identity: Some(identity),
            profile: Some(profile),
        });
    }

    /// Replace the mirrored profile without changing who is signed in
    pub fn refresh_profile(&self, profile: UserProfile) {
        self.sender.send_if_modified(|state| match &state.identity {
            Some(identity) if identity.uid == profile.uid && state.profile.as_ref() != Some(&profile) => {
                state.profile = Some(profile);
                true
            }
            _ => false,
        });
    }

    pub fn sign_out(&self) {
        let previous = self.sender.send_replace(SessionState::default());
        if let Some(identity) = previous.identity {
            info!(uid = %identity.uid, "signed out");
        }
    }
}
