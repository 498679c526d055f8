//! Various utilities shared by the AUR crates

pub mod math;

mod pool;
pub use pool::*;

mod result_ext;
pub use result_ext::AnyhowResultExt;

pub type AnyResult<T = (), E = anyhow::Error> = anyhow::Result<T, E>;
