mod pipeline_tests;
mod router_tests;
mod utils;
