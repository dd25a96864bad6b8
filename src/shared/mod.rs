pub mod error;
pub mod locks;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod wire;
