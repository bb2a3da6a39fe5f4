pub mod api;
pub mod catalogue;
pub mod error;
pub mod model;
pub mod normalize;
pub mod sections;
pub mod view;
