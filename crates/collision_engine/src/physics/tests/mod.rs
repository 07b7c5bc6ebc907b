//! Scenario tests for the collision manager
