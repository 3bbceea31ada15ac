/// Source of the bearer credential attached to job API requests.
///
/// The authentication provider owns the session lifecycle; this port only
/// asks for the current token. `None` means no active session and requests
/// go out without an `Authorization` header.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}
