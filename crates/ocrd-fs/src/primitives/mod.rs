pub mod atomic_write;
pub mod copy;

pub use atomic_write::{Options, atomic_read, atomic_write, atomic_write_from};
pub use copy::atomic_copy;
