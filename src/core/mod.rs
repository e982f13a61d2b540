pub mod corpus;
pub mod generator;
pub mod runtime;
pub mod text;
pub mod tracking;
