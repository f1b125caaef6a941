pub mod cancel_message;
pub mod create_message;
pub mod get_message;
pub mod list_messages;
pub mod lookup_delivery;
pub mod update_message;
