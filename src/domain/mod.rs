pub mod event;
pub mod extract;
pub mod statement;
