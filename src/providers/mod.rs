pub(crate) mod logger;
pub(crate) mod meter;
pub(crate) mod tracer;
