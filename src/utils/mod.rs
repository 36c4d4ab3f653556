pub mod scheduler;
pub mod time;
