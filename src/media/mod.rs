pub mod encode;
pub mod sniff;
pub mod types;

pub use encode::MediaEncoder;
pub use types::MediaPart;
