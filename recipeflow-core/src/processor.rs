use crate::analytics::{self, ChartSummary, Insights, RecipeAnalytics};
use crate::cleanup;
use crate::config::PipelineConfig;
use crate::export::{self, ExportSummary};
use crate::normalize::Normalizer;
use crate::rules::{ValidationReport, Validator};
use crate::seed::{self, SeedSummary, Seeder};
use crate::store::{open_store, DocumentStore};
use crate::tables;
use crate::types::*;
use anyhow::{Context, Result};
use chrono::Utc;
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        println!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        println!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Files and figures produced by the analyze stage
#[derive(Debug, Clone)]
pub struct AnalyticsOutcome {
    pub insights: Insights,
    pub charts: ChartSummary,
}

/// Result of a full `run`
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seeded: Option<SeedSummary>,
    pub exported: ExportSummary,
    pub rows: usize,
    pub report: ValidationReport,
    pub analytics: AnalyticsOutcome,
}

/// Drives the pipeline stages against one document store and one output directory
pub struct Pipeline {
    config: PipelineConfig,
    store: Box<dyn DocumentStore>,
    normalizer: Normalizer,
    validator: Validator,
}

impl Pipeline {
    /// Create a Pipeline with an injected store
    pub fn new_with_store(config: PipelineConfig, store: Box<dyn DocumentStore>) -> Self {
        let validator = Validator::new(&config.validation);
        Self {
            config,
            store,
            normalizer: Normalizer::new(),
            validator,
        }
    }

    /// Create a Pipeline with the store selected by the config
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let store = open_store(&config).context("Failed to open document store")?;
        tracing::debug!(store = store.name(), "document store opened");
        Ok(Self::new_with_store(config, store))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Generate the synthetic dataset and upsert it into the store.
    pub fn seed(&self) -> Result<SeedSummary> {
        let mut seeder = Seeder::new(self.config.seed.clone());
        let candidate = seeder.load_candidate()?;
        let data = seeder.generate(candidate, Utc::now());
        let summary = seed::seed_store(self.store(), &data)?;
        println!(
            "✅ Seeded {} recipes, {} users, {} interactions",
            summary.recipes, summary.users, summary.interactions
        );
        Ok(summary)
    }

    /// Dump every configured collection to `raw_json/`.
    pub fn export(&self) -> Result<ExportSummary> {
        let summary = export::export_collections(
            self.store(),
            &self.config.store.collections,
            &self.config.raw_json_dir(),
        )?;
        println!("✅ Exported {} documents", summary.total());
        Ok(summary)
    }

    /// Normalize the JSON dumps into the four tables under `csv/`.
    pub fn transform(&self) -> Result<NormalizedTables> {
        let recipes = export::load_dump(&self.config.raw_json_path(collections::RECIPES))?;
        let interactions = export::load_dump(&self.config.raw_json_path(collections::INTERACTIONS))?;
        println!(
            "📄 Normalizing {} recipes and {} interactions",
            recipes.len(),
            interactions.len()
        );

        let tables = self.normalizer.normalize(&recipes, &interactions);
        let csv_dir = self.config.csv_dir();
        tables::write_tables(&csv_dir, &tables)?;

        println!(
            "✅ Wrote {} recipe, {} ingredient, {} step, {} interaction rows to {}",
            tables.recipes.len(),
            tables.ingredients.len(),
            tables.steps.len(),
            tables.interactions.len(),
            csv_dir.display()
        );
        Ok(tables)
    }

    /// Check the tables against the row rules and save `validation_report.json`.
    pub fn validate(&self) -> Result<ValidationReport> {
        let tables = tables::read_tables(&self.config.csv_dir())?;
        let report = self.validator.validate(&tables);

        let path = self.config.validation_report_path();
        report
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        report.print_summary();
        println!("💾 Validation report written to {}", path.display());
        Ok(report)
    }

    /// Compute the insights summary and render the charts.
    pub fn analyze(&self) -> Result<AnalyticsOutcome> {
        let tables = tables::read_tables(&self.config.csv_dir())?;
        let insights = RecipeAnalytics::compute(&tables, self.config.analytics.top_n);

        let insights_path = self.config.insights_path();
        analytics::write_insights(&insights, &insights_path)?;
        println!("💾 Insights written to {}", insights_path.display());

        let charts = if self.config.analytics.charts {
            let charts = analytics::render_charts(&insights, &self.config.charts_dir());
            println!(
                "✅ {} charts written to {}",
                charts.written.len(),
                self.config.charts_dir().display()
            );
            for (chart, reason) in &charts.skipped {
                println!("⚠️  Chart {chart} skipped: {reason}");
            }
            charts
        } else {
            ChartSummary::default()
        };

        Ok(AnalyticsOutcome { insights, charts })
    }

    /// export → transform → validate → analyze, optionally seeding first.
    pub fn run_all(&self, with_seed: bool, profiler: &mut StepProfiler) -> Result<RunSummary> {
        let seeded = if with_seed {
            Some(profiler.time_step("0. Seed", || self.seed())?)
        } else {
            None
        };
        let exported = profiler.time_step("1. Export", || self.export())?;
        let tables = profiler.time_step("2. Transform", || self.transform())?;
        let report = profiler.time_step("3. Validate", || self.validate())?;
        let analytics = profiler.time_step("4. Analyze", || self.analyze())?;

        Ok(RunSummary {
            seeded,
            exported,
            rows: tables.total_rows(),
            report,
            analytics,
        })
    }

    /// Print the document count of every configured collection.
    pub fn count(&self) -> Vec<(String, Result<usize>)> {
        let counts = cleanup::count_documents(self.store(), &self.config.store.collections);
        for (collection, count) in &counts {
            match count {
                Ok(n) => println!("{collection}: {n} documents"),
                Err(e) => println!("⚠️  Error reading {collection}: {e:#}"),
            }
        }
        counts
    }

    /// Remove generated outputs, keeping the local store.
    pub fn cleanup(&self) -> Result<usize> {
        let removed = cleanup::cleanup_outputs(&self.config)?;
        println!("✅ Cleanup complete. {removed} files removed.");
        Ok(removed)
    }
}
