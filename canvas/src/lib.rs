//! Canvas editing engine for the worldbuilding wiki.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! interactive part of the three visual editors (map markers, the character
//! relationship graph and system flowcharts): translating raw DOM input
//! events into document edits, maintaining camera state for pan/zoom,
//! hit-testing entities and edges, and drawing the scene. The host layer is
//! responsible only for wiring DOM events to the engine and persisting the
//! resulting [`engine::Action`]s through the wiki's page store.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`scene`] | The [`scene::Scene`] trait each editor implements |
//! | [`map_scene`] | Markers on a background image |
//! | [`relationship_scene`] | Character cards with anchored, typed edges |
//! | [`system_scene`] | Free-form nodes and labeled arrows |
//! | [`doc`] | Serializable scene documents and schema migration |
//! | [`palette`] | Marker categories, colours and visibility |
//! | [`camera`] | Pan/zoom camera, geometry and fit helpers |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Nearest-within-radius and segment distance queries |
//! | [`render`] | Display lists and Canvas2D painting |
//! | [`schedule`] | Animation-frame redraw coalescing |
//! | [`consts`] | Shared numeric constants (radii, thresholds, layout) |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod map_scene;
pub mod palette;
pub mod relationship_scene;
pub mod render;
pub mod scene;
pub mod schedule;
pub mod system_scene;
