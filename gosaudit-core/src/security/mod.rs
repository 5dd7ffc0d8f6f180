//! Credential protection for SAP logon data.
//!
//! # Guarantees
//! - Passwords are stored in `Zeroizing` containers for automatic memory clearing
//! - `Debug` output never contains the password
//! - Credentials are handed to transports by reference and never logged

mod credentials;

pub use credentials::Credentials;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_zeroization() {
        let creds = Credentials::new("RFC_USER", "password");
        assert_eq!(creds.username(), "RFC_USER");
        assert!(creds.has_password());
        // Password buffer is zeroized when `creds` is dropped
    }
}
