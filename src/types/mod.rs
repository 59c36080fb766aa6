pub mod check;
pub mod context;
pub mod event;
pub mod healthz;
pub mod permission;
pub mod review;
