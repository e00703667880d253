//! Hook invoked when the session ends involuntarily.

/// Why the session was ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// A request was rejected and no refresh token was stored.
    MissingRefreshToken,
    /// The refresh exchange was rejected or failed.
    RefreshRejected,
}

/// Collaborator that sends the user back to the login entry point.
///
/// Invoked after the session keys have been cleared.
pub trait LoginBoundary: Send + Sync {
    /// Redirect to login.
    fn redirect_to_login(&self, reason: ExpiryReason);
}

impl<F> LoginBoundary for F
where
    F: Fn(ExpiryReason) + Send + Sync,
{
    fn redirect_to_login(&self, reason: ExpiryReason) {
        self(reason);
    }
}

/// Boundary that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBoundary;

impl LoginBoundary for NoopBoundary {
    fn redirect_to_login(&self, _reason: ExpiryReason) {}
}
