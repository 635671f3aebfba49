pub mod chassis;
pub mod result;
pub mod run;
pub mod scan;
pub mod signals;
