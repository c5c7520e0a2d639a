pub mod files;
pub mod health;
pub mod requirements;
pub mod test_cases;
pub mod tracker;
