pub mod address_family;
pub mod autonomous_system;
pub mod input;
pub mod nested;
pub mod peer_endpoint;
pub mod peer_group;
pub mod peering;
pub mod peering_role;
pub mod representation;
pub mod routing_instance;

pub use input::*;
pub use representation::*;
