pub mod configure;
pub mod logger;
pub mod logging;
pub mod interop;
