//! End-to-end tests over the public API: no network, temp files only.

mod portfolio_flow;
mod server_flow;
mod stub_prices;
