use std::sync::{Arc, Mutex};

use askama::Template;
use tracing::{debug, info, warn};

use crate::view::{render_template, Markup};

/// Id of the element the sign-in control is mounted into
pub const SIGN_IN_MOUNT_ID: &str = "google-login-btn";

/// Name of the page-level callback the Google widget invokes with its credential
const CALLBACK_NAME: &str = "handleCredentialResponse";

/// Read-only field the page callback fills with the credential, to be handed
/// to `schedulo sign-in`
pub const CREDENTIAL_FIELD_ID: &str = "google-credential";

/// Completion handler receiving the opaque credential of a finished sign-in.
/// Returns false when the credential could not be accepted.
pub type TokenCallback = Box<dyn Fn(String) -> bool + Send + Sync>;

/// A third-party single-sign-on widget.
pub trait IdentityProvider: Send {
    /// Register `on_token`, called once per successful external sign-in.
    fn initialize(&mut self, client_id: &str, on_token: TokenCallback);

    /// Markup for the provider's sign-in control, to be placed in `container_id`.
    fn render_button(&self, container_id: &str) -> Markup;
}

#[derive(Template)]
#[template(path = "gsi_button.html")]
struct GsiButtonTemplate<'a> {
    client_id: &'a str,
    callback: &'a str,
    field_id: &'a str,
}

type SharedCallback = Arc<Mutex<Option<TokenCallback>>>;

/// Google Identity Services, driven through its declarative HTML API.
#[derive(Default)]
pub struct GoogleIdentity {
    client_id: Option<String>,
    handler: SharedCallback,
}

impl GoogleIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle through which the external flow hands back its credential.
    pub fn responder(&self) -> CredentialResponder {
        CredentialResponder {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl IdentityProvider for GoogleIdentity {
    fn initialize(&mut self, client_id: &str, on_token: TokenCallback) {
        info!(client_id, "Initializing Google sign-in");
        self.client_id = Some(client_id.to_string());

        let mut handler = self.handler.lock().unwrap_or_else(|e| e.into_inner());
        *handler = Some(on_token);
    }

    fn render_button(&self, container_id: &str) -> Markup {
        debug!(container_id, "Rendering Google sign-in control");
        let client_id = match self.client_id.as_deref() {
            Some(id) => id,
            None => {
                warn!("Sign-in control rendered before initialize");
                ""
            }
        };

        render_template(&GsiButtonTemplate {
            client_id,
            callback: CALLBACK_NAME,
            field_id: CREDENTIAL_FIELD_ID,
        })
    }
}

/// Delivers a credential to the handler registered with `initialize`.
#[derive(Clone)]
pub struct CredentialResponder {
    handler: SharedCallback,
}

impl CredentialResponder {
    /// Returns false when no handler has been registered yet, or when the
    /// handler could not accept the credential.
    pub fn respond(&self, credential: impl Into<String>) -> bool {
        let handler = self.handler.lock().unwrap_or_else(|e| e.into_inner());
        match handler.as_ref() {
            Some(on_token) => on_token(credential.into()),
            None => {
                warn!("Credential received before sign-in was initialized");
                false
            }
        }
    }
}
