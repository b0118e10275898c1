// ABOUTME: Container state markers for the type state pattern.
// ABOUTME: Separates containers that only exist locally from ones the server knows about.

/// Built locally, not yet known to the server.
/// Available actions: builder methods, `create()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Local;

/// Backed by a server resource.
/// Available actions: `refresh()`, `edit()`, `update()`, state changes, `delete()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Remote;
