pub mod analytics;
pub mod calls;
pub mod device;
pub mod notifications;
pub mod personnel;
pub mod reports;
