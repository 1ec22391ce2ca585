mod registry;

pub use registry::StatsError;
pub use registry::StatsRegistry;
pub use registry::StatsSource;
