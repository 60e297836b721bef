//! Parse, query and rewrite nested media containers: ISO-14496 boxes, ASF
//! objects and ID3v2 frames share one node tree, one query layer and one
//! in-place write-back engine.
//!
//! ```no_run
//! use mediabox::{Mp4, Tree};
//!
//! let mut tree = Tree::<Mp4>::open("movie.mp4")?;
//! mediabox::mp4::set_text_item(&mut tree, "\u{a9}nam", "New title")?;
//! tree.save()?;
//! # Ok::<(), mediabox::Error>(())
//! ```

pub mod bits;
pub mod cursor;
pub mod error;
pub mod format;
pub mod ids;
pub mod json_api;
pub mod node;
pub mod parser;
pub mod primitives;
pub mod query;
pub mod registry;
pub mod splice;
pub mod text;
pub mod util;
pub mod writer;

pub mod asf;
pub mod id3;
pub mod mp4;

pub use asf::Asf;
pub use cursor::ByteCursor;
pub use error::{Error, Result};
pub use format::{Format, NodeHeader, Record};
pub use id3::Id3;
pub use ids::{FourCC, FrameId, Guid};
pub use mp4::Mp4;
pub use node::{Children, Node, NodeId, Raw, Tree};
pub use parser::{ParseOptions, Parser};
pub use query::{NodeRef, Pattern, Resolved};
pub use registry::{Decoded, NodeDecoder, Registry};
pub use writer::{WriteOptions, WriteReport};
