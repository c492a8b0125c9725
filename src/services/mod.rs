pub mod backend;
pub mod health;
pub mod poller;
pub mod report;
pub mod session;
pub mod upload;
pub mod viewer;
pub mod viewport;

#[cfg(test)]
pub(crate) mod testing;
