mod time;

pub use time::{latest_stamp, seconds};
