pub mod bloch;
pub mod constants;
pub mod contrast;
