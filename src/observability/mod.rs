// Observability: metric recording through the `metrics` facade.
// Installing an exporter is left to the embedding binary.

pub mod metrics;
