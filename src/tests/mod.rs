//! tests/mod.rs
//! Pruebas unitarias y de integración de servicios y handlers.

mod support;

mod cli_tests;
mod llm_tests;
mod pipeline_tests;
mod sanitizer_tests;
mod sdk_tests;
mod template_tests;
