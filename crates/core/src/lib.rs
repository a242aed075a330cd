pub mod detection;
pub mod pipeline;
pub mod redaction;
pub mod shared;
pub mod tracking;
pub mod video;
