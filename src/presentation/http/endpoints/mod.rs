pub mod health;
pub mod messages;
pub mod messaging;
pub mod root;
