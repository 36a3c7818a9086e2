// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup wiring
// - infrastructure: Postgres repositories, blob stores and address building
// - presentation: HTTP handlers and routing
// - application: ports, tree/outline/history services and use cases
// - domain: books, documents, history entries

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
