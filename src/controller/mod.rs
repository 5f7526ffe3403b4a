//! Load orchestration: select a place, fetch its feeds, plot their points.

mod generation;

pub use generation::{Generation, LoadToken};

use serde_json::Value;
use std::thread;

use crate::api::{Fetcher, fetch_records, resolve_endpoint};
use crate::domain::DataSource;
use crate::error::{LoadError, TransportError};
use crate::registry::{MAP_ANCHOR_CLASS, Session};
use crate::view::{MapSetup, MapView, MarkerEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loaded { place: String, markers: usize },
}

/// What happened to one data source during a load.
#[derive(Debug)]
pub enum SourceOutcome {
    Plotted { markers: usize, skipped: usize },
    Failed(TransportError),
    /// A newer load started before this result was used.
    Discarded,
}

#[derive(Debug)]
pub struct SourceReport {
    pub name: String,
    pub url: String,
    pub outcome: SourceOutcome,
}

#[derive(Debug)]
pub struct LoadReport {
    pub place: String,
    pub sources: Vec<SourceReport>,
}

impl LoadReport {
    pub fn markers(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match s.outcome {
                SourceOutcome::Plotted { markers, .. } => markers,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> usize {
        self.sources
            .iter()
            .map(|s| match s.outcome {
                SourceOutcome::Plotted { skipped, .. } => skipped,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &TransportError)> {
        self.sources.iter().filter_map(|s| match &s.outcome {
            SourceOutcome::Failed(e) => Some((s.name.as_str(), e)),
            _ => None,
        })
    }

    pub fn was_discarded(&self) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s.outcome, SourceOutcome::Discarded))
    }
}

struct Job<'a> {
    name: &'a str,
    source: &'a DataSource,
    url: String,
}

/// Drives a session from `Idle` to `Loaded`.
pub struct LoadOrchestrator<F> {
    session: Session,
    fetcher: F,
    generation: Generation,
    state: LoadState,
}

impl<F: Fetcher> LoadOrchestrator<F> {
    pub fn new(session: Session, fetcher: F) -> Self {
        Self {
            session,
            fetcher,
            generation: Generation::new(),
            state: LoadState::Idle,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Handle for superseding loads from elsewhere.
    pub fn generation(&self) -> Generation {
        self.generation.clone()
    }

    /// Puts the application name on the page.
    pub fn init(&self, view: &mut dyn MapView) {
        view.set_title(self.session.registry().app_name());
    }

    /// Drops whatever is in flight and returns to `Idle`.
    pub fn reset(&mut self) {
        self.generation.cancel();
        self.state = LoadState::Idle;
    }

    /// Loads `data_sources` of `place` (all of them when empty) into `view`.
    ///
    /// Unknown places and data sources are refused before anything changes.
    /// A feed that fails to fetch is reported and the others still render;
    /// records without a usable position are skipped. Repeated source names
    /// are fetched once. The selected place and state only change if no newer
    /// load superseded this one.
    ///
    /// # Arguments
    /// * `place` - Place key (case-insensitive)
    /// * `data_sources` - Source names to load, or empty for all of them
    /// * `view` - Receives the map, caption and markers
    ///
    /// # Returns
    /// * `Ok(LoadReport)` - Per-source outcome, including failed feeds
    /// * `Err(LoadError)` - If the place or a data source is unknown
    pub fn load(
        &mut self,
        place: &str,
        data_sources: &[&str],
        view: &mut dyn MapView,
    ) -> Result<LoadReport, LoadError> {
        let registry = self.session.shared_registry();
        let target = registry.place(place)?;
        let key = registry
            .canonical_key(place)
            .unwrap_or(place)
            .to_string();

        let names: Vec<&str> = if data_sources.is_empty() {
            registry.data_sources(&key)?
        } else {
            let mut names = Vec::with_capacity(data_sources.len());
            for &name in data_sources {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            names
        };

        let mut jobs = Vec::with_capacity(names.len());
        for name in names {
            let source = registry.data_source(&key, name)?;
            jobs.push(Job {
                name,
                source,
                url: resolve_endpoint(&source.endpoint, None),
            });
        }

        let token = self.generation.begin();
        log::info!("Loading {} data source(s) for {key}", jobs.len());

        view.show_map(&MapSetup {
            anchor_id: registry.map_anchor_id(&key, None),
            anchor_class: MAP_ANCHOR_CLASS,
            center: target.center(),
            zoom: target.zoom(),
            background_image: target.map_options.background_image.clone(),
        });
        let caption = jobs
            .iter()
            .map(|job| job.source.description())
            .collect::<Vec<_>>()
            .join(", ");
        if !caption.is_empty() {
            view.set_caption(&caption);
        }

        let results = self.fetch_all(&jobs);

        let mut sources = Vec::with_capacity(jobs.len());
        for (job, result) in jobs.into_iter().zip(results) {
            let outcome = if !self.generation.is_current(token) {
                log::info!("Discarding stale {} results for {key}", job.name);
                SourceOutcome::Discarded
            } else {
                match result {
                    Ok(records) => plot_records(job.name, job.source, &records, view),
                    Err(e) => {
                        log::error!("Failed to fetch {} ({}): {e}", job.name, job.url);
                        SourceOutcome::Failed(e)
                    }
                }
            };
            sources.push(SourceReport {
                name: job.name.to_string(),
                url: job.url,
                outcome,
            });
        }

        let report = LoadReport { place: key, sources };
        if self.generation.is_current(token) {
            self.session.set_current_place(&report.place);
            self.state = LoadState::Loaded {
                place: report.place.clone(),
                markers: report.markers(),
            };
        }
        Ok(report)
    }

    /// One concurrent fetch per job, results in job order.
    fn fetch_all(&self, jobs: &[Job<'_>]) -> Vec<Result<Vec<Value>, TransportError>> {
        let fetcher = &self.fetcher;
        thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|job| scope.spawn(move || fetch_records(fetcher, &job.url)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    }
}

fn plot_records(
    name: &str,
    source: &DataSource,
    records: &[Value],
    view: &mut dyn MapView,
) -> SourceOutcome {
    let mut markers = 0;
    let mut skipped = 0;

    for record in records {
        match source.extract_coordinate(record) {
            Ok(position) => {
                view.place_marker(&MarkerEvent {
                    data_source: name.to_string(),
                    position,
                    title: source.marker_title(record),
                });
                markers += 1;
            }
            Err(reason) => {
                log::trace!("Skipping {name} record: {reason}");
                skipped += 1;
            }
        }
    }

    log::info!(
        "{name}: placed {markers} markers, skipped {skipped} of {} records",
        records.len()
    );
    SourceOutcome::Plotted { markers, skipped }
}
