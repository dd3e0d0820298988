pub mod auth;
pub mod component;
pub mod docs;
pub mod model;
pub mod page;
pub mod template;
