pub mod dashboard;
pub mod menu;
pub mod resource;
pub mod session;
