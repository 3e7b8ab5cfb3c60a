pub mod replay;
pub mod rows;
pub mod show;
