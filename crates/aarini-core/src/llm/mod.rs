pub mod box_provider;
pub mod deadline;
pub mod fallback;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;
