pub mod assertion;
pub mod placement;
pub mod signal;

#[cfg(test)]
pub mod test;
