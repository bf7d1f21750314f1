mod export_tests;
mod home_tests;
mod properties_tests;
mod summary_tests;
