//! Query and response types for the authorization flow.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{CompleteAuthorizationCommand, CompleteAuthorizationResult};

/// Query string of `GET /authorize/callback`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

impl From<CallbackParams> for CompleteAuthorizationCommand {
    fn from(params: CallbackParams) -> Self {
        CompleteAuthorizationCommand {
            code: params.code,
            state: params.state,
        }
    }
}

/// Body returned to the browser once the identity is linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretResponse {
    pub secret: String,
}

impl From<CompleteAuthorizationResult> for SecretResponse {
    fn from(result: CompleteAuthorizationResult) -> Self {
        Self {
            secret: result.secret.into_inner(),
        }
    }
}
