pub(crate) const DEFAULT_LEVEL: &str = "WARNING";
