//! Shared test harness modules for the ridings CLI.

use super::*;

mod helpers;
mod steps;
mod unit;
