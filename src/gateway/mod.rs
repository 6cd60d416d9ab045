//! HTTP gateway: webhook intake and event dispatch

pub mod handler;
pub mod server;

pub use handler::{plan_event, EventAction, EventDispatcher};
pub use server::{build_router, serve, AppState};
