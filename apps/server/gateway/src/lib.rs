// Library exports for testing
// The binary (main.rs) imports these as well

pub mod error;
pub mod handler;
pub mod logger;
pub mod paths;

#[cfg(test)]
mod tests;
