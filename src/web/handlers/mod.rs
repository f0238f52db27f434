pub mod assessment;
pub mod batch;
pub mod history;
pub mod pages;
pub mod system;
