pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{PgProductRepository, ProductRepository};
pub use routes::routes;
pub use services::ProductService;
