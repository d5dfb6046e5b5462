//! Use cases (application services)

pub mod stream_controller;
