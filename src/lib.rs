pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod domain;
pub mod presenter;
pub mod simulation;
pub mod telemetry;
