// Module layout (Clean Architecture style)
// - bootstrap: configuration and wiring of the coins module
// - infrastructure: Postgres repositories and the CoinEx market feed
// - presentation: HTTP handlers and routing
// - application: ports, use cases and the coins service
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
pub mod test_support;
