pub mod errors;
pub mod db;
pub mod college;
pub mod user;

pub use college::GradingScale;

#[cfg(test)]
mod tests;
