pub mod dispatcher;
pub mod message;
pub mod osc_listener;
pub mod osc_sender;
pub mod relay;
