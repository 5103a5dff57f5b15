//! Named channels: per-channel hubs and the registry that owns them.

pub mod hub;
pub mod member;
pub mod registry;

pub use hub::ChannelHub;
pub use member::Member;
pub use registry::ChannelRegistry;
