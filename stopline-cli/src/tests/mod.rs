//! Shared test harness modules for the stopline CLI.

use super::*;

mod helpers;
mod steps;
