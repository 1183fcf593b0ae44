pub mod message;
pub mod observation;
pub mod sample;
