pub mod guard;
pub mod logger;
