pub mod buffer;
pub mod idle;
pub mod stream;
mod util;
pub mod ws;
