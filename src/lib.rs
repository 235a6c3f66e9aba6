//! Xe-Bot: papers de arXiv → introducción → segmentos → animaciones Manim.

pub mod app;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod logger;
pub mod models;
pub mod sdk;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;
