/// API route handlers, one module per resource
///
/// - `health`: banner, health check, 404 fallback
/// - `auth`: signup, login, identity echo
/// - `users`, `clubs`, `tasks`, `events`, `products`, `sales`,
///   `proposals`, `messages`: resource collections
/// - `email`: relay to leads and board members
/// - `extract`: JSON-rejecting extractors shared by the handlers

pub mod auth;
pub mod clubs;
pub mod email;
pub mod events;
pub mod extract;
pub mod health;
pub mod messages;
pub mod products;
pub mod proposals;
pub mod sales;
pub mod tasks;
pub mod users;
