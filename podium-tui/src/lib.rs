//! Podium live leaderboard dashboard.
//!
//! REST and event-stream clients, the push channel manager that keeps the
//! leaderboard cache live, and the terminal views rendered from it.

pub mod api_client;
pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod realtime;
pub mod sse;
pub mod state;
pub mod theme;
pub mod views;
pub mod widgets;
