mod config_tests;
mod support;
