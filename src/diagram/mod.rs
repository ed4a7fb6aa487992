pub mod camera;
pub mod events;
pub mod model;
pub mod routing;
pub mod store;
