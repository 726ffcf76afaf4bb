pub mod constants;
pub mod media;
pub mod slug;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
pub mod validation;
