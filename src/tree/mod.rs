//! Thought tree data model and persistence.
//!
//! - `content`: tagged step content and its plain-text normalization
//! - `node`: arena-backed tree of reasoning steps
//! - `codec`: nested/flat records and the persisted file envelope

pub mod codec;
pub mod content;
pub mod node;

pub use codec::{
    decode, decode_flat, encode, encode_flat, load_tree, save_tree, FlatNode, FlatTree,
    NodeRecord, TreeFile, TREE_FORMAT_VERSION,
};
pub use content::{Content, ContentPart};
pub use node::{Node, NodeId, ThoughtTree};
