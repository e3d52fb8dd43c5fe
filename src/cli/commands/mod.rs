//! CLI command implementations

pub mod cache;
pub mod load;
pub mod load_from_file;
pub mod publish;
pub mod push;
pub mod tag;

pub use cache::execute as cache;
pub use load::execute as load;
pub use load_from_file::execute as load_from_file;
pub use publish::execute as publish;
pub use push::execute as push;
pub use tag::execute as tag;
