pub mod deletion;
pub mod extra_attributes;
pub mod filters;
pub mod inheritance;
pub mod lineage;
pub mod peering_sync;

pub use deletion::*;
pub use extra_attributes::*;
pub use filters::*;
pub use inheritance::*;
pub use lineage::*;
pub use peering_sync::*;
