/// Username prefix shared by every service account identity.
pub const SERVICE_ACCOUNT_PREFIX: &str = "system:serviceaccount";

/// Service account identities are never mutated.
pub fn is_exempt(username: &str) -> bool {
    username.starts_with(SERVICE_ACCOUNT_PREFIX)
}
