pub mod appointment;
pub mod enums;
pub mod health_log;
pub mod lab;
pub mod message;
pub mod patient;
pub mod recommendation;
pub mod staff;

pub use appointment::*;
pub use health_log::*;
pub use lab::*;
pub use message::*;
pub use patient::*;
pub use recommendation::*;
pub use staff::*;
