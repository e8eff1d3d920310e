pub mod clash;
pub mod explodes;
pub mod filter;

pub use clash::{looks_like_clash, parse_clash_yaml, ClashError, ClashProxy};
pub use explodes::{explode, explode_link, explode_links, ExplodeError, ExplodeStats};
