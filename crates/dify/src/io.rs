mod chunks;
mod lines;

pub use chunks::{Chunks, Error as ChunksError};
pub use lines::{Error as LinesError, Lines, MAX_LINE_LEN};
