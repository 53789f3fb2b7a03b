pub mod evaluations;
pub mod notifications;
pub mod recovery;
pub mod valuation;

#[cfg(test)]
pub(crate) mod test_support;
