pub mod errors;
pub mod events;
pub mod frame;
pub mod hub;
