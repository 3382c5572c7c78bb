//! Element trees whose leaves may be deferred: lazy values resolved
//! against a resolution context, and repeaters driving template
//! repetition. Nothing is evaluated until the tree is rendered.

pub mod error;
pub mod myfrom;
pub mod url_encoding;
pub mod config;
pub mod context;
pub mod value;
pub mod lazy;
pub mod repeater;
pub mod attribute;
pub mod allocator;
pub mod node;
pub mod table;
pub mod render;
pub mod elements;
pub mod dump;

pub use allocator::{AId, HtmlAllocator, RegionId};
pub use attribute::{AttrKind, AttributeContainer};
pub use config::RenderConfig;
pub use context::Context;
pub use dump::dump;
pub use error::{TreeError, TreeErrorKind};
pub use lazy::LazyValue;
pub use node::{Node, NodeKind};
pub use render::{Renderer, CIRCULAR};
pub use repeater::{DataSource, FnSource, RecordList, Records, Repeater};
pub use table::TableSlots;
pub use value::{att, opt_att, Arg, ForeignValue, ToArgs, Value};
