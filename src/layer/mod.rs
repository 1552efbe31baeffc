//! Layer definitions and the pipeline that produces them
//!
//! The five published layers share one pipeline. A [`LayerSpec`] holds
//! everything that differs between them: which records they read, the scope
//! used to reconcile redactions, and how records map to a GEOID.

pub mod pipeline;

pub use pipeline::{
    LayerReport, ReferenceData, RunDiagnostics, RunStatus, run_all_layers, run_layer,
};

use crate::algorithm::{GeoStrategy, ScopeKind};
use crate::config::PipelineConfig;
use crate::lookup::GeographyMap;
use crate::models::Layer;
use crate::store::{NamePredicate, ScopeFilter};

/// Per-layer parameters of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    pub layer: Layer,
    /// Records the layer reads
    pub filter: ScopeFilter,
    /// Extent of each "All Students" reconciliation
    pub scope: ScopeKind,
    /// Backfill dimensions a scope lacks entirely
    pub backfill: bool,
    pub geography: GeoStrategy,
}

impl LayerSpec {
    /// Parameters for `layer`
    ///
    /// The county layer reads every county that has a GEOID, so it needs the
    /// county [`GeographyMap`]; the other layers ignore `counties`.
    #[must_use]
    pub fn for_layer(layer: Layer, config: &PipelineConfig, counties: &GeographyMap) -> Self {
        match layer {
            Layer::State => Self {
                layer,
                filter: ScopeFilter::all().with_district_name(NamePredicate::Equals(
                    config.statewide_sentinel.clone(),
                )),
                scope: ScopeKind::Global,
                backfill: false,
                geography: GeoStrategy::Constant(config.state_geoid.clone()),
            },
            Layer::Region => Self {
                layer,
                filter: ScopeFilter::all()
                    .with_counties(config.region_counties.iter().cloned())
                    .with_school_name(NamePredicate::EqualsIgnoreCase(
                        config.districtwide_sentinel.clone(),
                    )),
                scope: ScopeKind::Global,
                backfill: false,
                geography: GeoStrategy::Constant(config.region_slug.clone()),
            },
            Layer::County => {
                let mut names: Vec<&str> = counties.names().collect();
                names.sort_unstable();
                Self {
                    layer,
                    filter: ScopeFilter::all()
                        .with_counties(names)
                        .with_school_name(NamePredicate::Equals(
                            config.districtwide_sentinel.clone(),
                        )),
                    scope: ScopeKind::County,
                    backfill: false,
                    geography: GeoStrategy::CountyName,
                }
            }
            Layer::ZipCode | Layer::City => Self {
                layer,
                filter: ScopeFilter::all()
                    .with_counties(config.region_counties.iter().cloned())
                    .with_school_name(NamePredicate::NotStartingWith(
                        config.summary_prefix.clone(),
                    )),
                scope: ScopeKind::School,
                backfill: true,
                geography: if layer == Layer::City {
                    GeoStrategy::City {
                        suffix: config.city_suffix.clone(),
                    }
                } else {
                    GeoStrategy::ZipCode
                },
            },
        }
    }

    /// Suffix cut from GEOID table names before keying
    #[must_use]
    pub fn geo_name_suffix<'a>(&self, config: &'a PipelineConfig) -> &'a str {
        match self.geography {
            GeoStrategy::CountyName => &config.county_name_suffix,
            _ => "",
        }
    }

    /// Whether the layer resolves geography through the address directory
    #[must_use]
    pub fn uses_addresses(&self) -> bool {
        matches!(self.geography, GeoStrategy::ZipCode | GeoStrategy::City { .. })
    }
}
