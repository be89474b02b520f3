mod clock;
mod files;

pub use clock::SystemClock;
pub use files::{read_source_image, write_output};
