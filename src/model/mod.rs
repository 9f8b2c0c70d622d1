pub mod application;
pub mod employee;
pub mod hr;
pub mod role;
pub mod user;
