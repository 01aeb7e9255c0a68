pub mod call;
pub mod notification;
pub mod report;
pub mod role;
pub mod user;
