pub mod email;
pub mod history;
pub mod schedule;
pub mod send;
pub mod watch;
