pub mod codeforces;
pub mod filters;
pub mod loadable;

pub use filters::FilteredProblems;
pub use loadable::Loadable;
