//! Secure credential container with automatic memory zeroing.

use zeroize::Zeroizing;

/// SAP logon credentials that zero their memory on drop.
///
/// # Example
///
/// ```rust
/// use gosaudit_core::security::Credentials;
///
/// let creds = Credentials::new("RFC_USER", "secret");
/// assert_eq!(creds.username(), "RFC_USER");
/// assert!(!format!("{:?}", creds).contains("secret"));
/// ```
#[derive(Clone)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Creates new credentials with automatic memory zeroing.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Zeroizing::new(username.into()),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Gets the logon user.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Exposes the password to a transport for authentication.
    ///
    /// Callers must not log or persist the returned value.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Checks if a password is present without exposing it.
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username.as_str())
            .field("password", &"****")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = Credentials::new("testuser", "testpass");
        assert_eq!(creds.username(), "testuser");
        assert_eq!(creds.password(), "testpass");
        assert!(creds.has_password());
    }

    #[test]
    fn test_credentials_empty_password() {
        let creds = Credentials::new("testuser", "");
        assert!(!creds.has_password());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("testuser", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("testuser"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_clone() {
        let creds1 = Credentials::new("user", "pass");
        let creds2 = creds1.clone();
        assert_eq!(creds1.username(), creds2.username());
        assert_eq!(creds1.has_password(), creds2.has_password());
    }
}
