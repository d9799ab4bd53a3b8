use super::{
    CleanerContext, GithubCleaner, JobsCleaner, MetricsCleaner, SourceCleaner, SurveysCleaner,
    TrendsCleaner,
};

/// Ordered set of cleaners; the pipeline runs them in registration order.
pub struct CleanerRegistry {
    cleaners: Vec<Box<dyn SourceCleaner>>,
}

impl CleanerRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self {
            cleaners: Vec::new(),
        }
    }

    /// The four built-in cleaners: jobs, github, trends, surveys
    pub fn with_defaults(ctx: &CleanerContext) -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(MetricsCleaner::new(JobsCleaner::new(ctx.clone()))));
        registry.register(Box::new(MetricsCleaner::new(GithubCleaner::new(ctx.clone()))));
        registry.register(Box::new(MetricsCleaner::new(TrendsCleaner::new(ctx.clone()))));
        registry.register(Box::new(MetricsCleaner::new(SurveysCleaner::new(ctx.clone()))));
        registry
    }

    /// Register a cleaner, replacing any existing one with the same source id
    pub fn register(&mut self, cleaner: Box<dyn SourceCleaner>) {
        self.cleaners
            .retain(|existing| existing.source_id() != cleaner.source_id());
        self.cleaners.push(cleaner);
    }

    pub fn get(&self, source_id: &str) -> Option<&dyn SourceCleaner> {
        self.cleaners
            .iter()
            .find(|c| c.source_id() == source_id)
            .map(|c| c.as_ref())
    }

    /// Cleaners to run. `None` selects all; unknown names are ignored.
    pub fn select(&self, sources: Option<&[String]>) -> Vec<&dyn SourceCleaner> {
        self.cleaners
            .iter()
            .filter(|c| match sources {
                Some(wanted) => wanted.iter().any(|s| s == c.source_id()),
                None => true,
            })
            .map(|c| c.as_ref())
            .collect()
    }

    /// List all registered source IDs
    pub fn list_sources(&self) -> Vec<&str> {
        self.cleaners.iter().map(|c| c.source_id()).collect()
    }
}
