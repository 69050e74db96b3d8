pub mod data;
pub mod error;
pub mod extractors;
pub mod knowledge;
pub mod llm;
pub mod pipeline;
pub mod recommender;
pub mod report;
pub mod scoring;
pub mod store;
pub mod tools;
pub mod workflow;
