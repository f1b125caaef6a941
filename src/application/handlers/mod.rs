pub mod dispatch_scheduler;
pub mod message_dispatcher;
