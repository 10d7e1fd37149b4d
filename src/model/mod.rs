pub mod address_family;
pub mod autonomous_system;
pub mod choices;
pub mod common;
pub mod catalog;
pub mod peer_endpoint;
pub mod peer_group;
pub mod peering;
pub mod peering_role;
pub mod routing_instance;

pub use address_family::*;
pub use autonomous_system::*;
pub use choices::*;
pub use common::*;
pub use catalog::*;
pub use peer_endpoint::*;
pub use peer_group::*;
pub use peering::*;
pub use peering_role::*;
pub use routing_instance::*;
