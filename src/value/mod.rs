pub mod interior;
pub mod tagged;
pub mod view;

pub use interior::{read_interior, write_interior};
pub use tagged::{read_tagged, tag_pointer, write_tagged, TaggedValue};
pub use view::{is_same, Extent, RawView};
