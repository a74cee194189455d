//! Host-facing API of the SimpleLens grid.
//!
//! Native hosts call [`api`] directly; on `wasm32` the same calls are
//! exported to the dashboard page through `wasm-bindgen`.

pub mod api;

#[cfg(target_arch = "wasm32")]
mod wasm;
