pub mod subscribe_routes;
pub mod system_routes;
