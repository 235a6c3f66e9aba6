//! sdk/mod.rs
//! Cliente Rust de la API pública (`/api/*`).

pub mod client;

pub use client::{AnimationResult, GenerateOptions, XeBotClient};
