pub mod align;
pub mod run;
pub mod tasks;
