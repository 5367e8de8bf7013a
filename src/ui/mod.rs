pub mod modern;
pub mod modern_helpers;
pub mod pipe;
pub mod styles;

pub use modern::run_modern;
pub use pipe::run_pipe;
