pub mod crawler;
pub mod discovery;
pub mod web;

#[cfg(test)]
pub(crate) mod tests;
