//! Session service module: login, refresh and logout over the token services

mod service;


pub use service::SessionService;
