pub mod codegen;
pub mod compile;
pub mod settings;
pub mod translate;
mod util;
