//! Defense Line Integration Tests
//!
//! Contract-level tests run against the Odra VM: two CEP-18 tokens, a
//! `PriceFeed` and a `DefenseVault` are deployed per test and driven through
//! their entry points.



#[cfg(test)]
mod trigger_tests;



#[cfg(test)]
mod admin_tests;

#[cfg(test)]
mod price_feed_tests;
