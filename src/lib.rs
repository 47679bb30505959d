pub mod config;
pub mod error;
pub mod net;
pub mod stack;
pub mod topo;

#[cfg(test)]
mod test;
