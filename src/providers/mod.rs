pub mod fintual;
pub mod util;

pub use fintual::FintualProvider;
