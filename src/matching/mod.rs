pub mod aggregate;
pub mod diagnostics;
pub mod pipeline;

#[cfg(test)]
pub mod testing;
