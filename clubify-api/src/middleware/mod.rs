/// Middleware for the API server
///
/// - `identity`: resolves the caller and rejects anonymous requests
/// - `security`: security response headers

pub mod identity;
pub mod security;
