/// Command handlers for inbound bot messages
pub mod handlers;
/// Group notification delivery
pub mod notify;
/// Static replies and HTML formatting
pub mod views;
