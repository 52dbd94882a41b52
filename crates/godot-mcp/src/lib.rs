//! MCP server for editing the GDScript files of one Godot project.
//!
//! Tools are served over stdio. Every path a tool receives is confined to the
//! configured project root, and edits to the same file are serialized.

pub mod config;
pub mod locks;
pub mod paths;
pub mod tools;
