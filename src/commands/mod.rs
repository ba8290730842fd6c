/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `scrape` — Run an authenticated extraction pipeline
- `serve`  — Start the chat HTTP endpoint
- `map`    — Corridor map checks
- `runs`   — Inspect persisted run documents

These handlers are intentionally small and use the library components:
the browser, session, scrape, storage, chat, and map modules.
*/

pub mod map;
pub mod runs;
pub mod scrape;
pub mod serve;
