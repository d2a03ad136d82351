mod export_tests;
mod health_tests;
mod scrape_tests;
