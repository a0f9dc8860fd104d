//! Search inputs and outputs, and the pieces shared between searches.
pub mod captures;
pub mod input;
pub mod iter;
pub mod matches;
pub mod prefilter;
