mod blocks;
mod record;
mod resource;

pub use blocks::*;
pub use record::*;
pub use resource::*;
