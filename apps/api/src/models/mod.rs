pub mod career;
pub mod job;
pub mod user;
