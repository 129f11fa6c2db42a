pub mod corpus;
pub mod resolver;

pub use corpus::EventCorpus;
pub use resolver::{EventResolver, Resolution, ResolverScope, RetryPolicy};
