pub mod constants;
mod timeout;
mod wait_for_element;

pub use timeout::{validate_navigation_timeout, validate_poll_interval};
pub use wait_for_element::{element_present, poll_attempts};
