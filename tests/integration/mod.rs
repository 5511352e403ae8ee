//! Integration tests for the GuIA guide-generation worker

mod test_utils;
