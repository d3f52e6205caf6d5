pub mod parse;
mod resolver;

pub use resolver::{Query, QueryResolver, Resolution, ResolverSettings};
