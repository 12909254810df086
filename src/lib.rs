//! Worldbuilding wiki core: pages, categories, the document store seam and
//! the editor sessions that drive the `canvas` scene editors.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`page`] | Page model and page-key helpers |
//! | [`category`] | Closed category set with form schemas and view fields |
//! | [`store`] | Async document store contract, memory and REST adapters |
//! | [`cache`] | Local key/value cache |
//! | [`context`] | Page index, current selection, load tickets |
//! | [`persistence`] | Scene documents in page metadata |
//! | [`session`] | Editor sessions and page-level operations |
//! | [`config`] | Environment configuration |

pub mod cache;
pub mod category;
pub mod config;
pub mod context;
pub mod page;
pub mod persistence;
pub mod session;
pub mod store;

pub use canvas;
