pub mod cursbnr;

pub use cursbnr::CursBnrSource;
