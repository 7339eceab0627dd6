// API routes and handlers

pub mod equipment;
pub mod health;
pub mod home;
pub mod periods;
pub mod rankings;
pub mod routes;
pub mod settings;
pub mod summaries;
pub mod workouts;
