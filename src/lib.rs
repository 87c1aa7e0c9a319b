//! Livestock inventory with an offline-first sync coordinator.
//!
//! Records live in a local SQLite cache ([`db`]) and are reconciled with a
//! remote HTTP API ([`api`]) by the [`sync::SyncCoordinator`].

pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod inventory;
pub mod loaded;
pub mod models;
pub mod network;
pub mod server;
pub mod sync;
