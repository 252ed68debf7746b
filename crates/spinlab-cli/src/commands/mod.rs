pub mod contrast;
pub mod run;
