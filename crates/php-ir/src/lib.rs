pub mod fmt;
pub mod ir;
pub mod irutil;
pub mod lower;
pub mod nodeset;
pub mod shape;

pub use fmt::{print, print_root};
pub use ir::*;
pub use irutil::{clone_detached, find, is_assign, node_equal, node_slice_equal, unparen, Detach};
pub use lower::{lower, Context, Lower, LowerError};
pub use nodeset::{NodeSet, NODE_SET_LIST_MAX};
pub use shape::{canonical_key, Shape};
