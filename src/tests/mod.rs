mod load_tests;
mod utils;
