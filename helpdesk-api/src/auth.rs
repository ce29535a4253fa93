use crate::STUB_UUID;

use uuid::Uuid;

/// Bearer token attached to every collaborator request. Sessions themselves
/// are managed by the external auth endpoints.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

impl AuthToken {
    pub fn stub() -> AuthToken {
        AuthToken(STUB_UUID)
    }
}
