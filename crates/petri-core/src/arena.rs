//! The arena: every live cell plus the state the tick cycle mutates.
//!
//! The arena owns the single RNG, the id generator, the species catalog and
//! the last published snapshot. The tick phases themselves live in
//! [`crate::tick`].

use std::collections::BTreeMap;
use std::sync::Arc;

use petri_agents::presets::{self, FEED_PELLET_MASS};
use petri_agents::{Cell, RuleError, SpeciesConfig, SpeciesProfile, TickContext, Walls};
use petri_types::{CellId, IdGenerator, LifecycleEvent, Snapshot, Species, Vec2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::{PopulationConfig, SimulationConfig};
use crate::tick::TickError;

/// Half the side of the square each starting herd is scattered across.
pub const HERD_SPREAD: f64 = 50.0;

/// Species profiles by species.
pub type Catalog = BTreeMap<Species, Arc<SpeciesProfile>>;

/// Build the catalog: every built-in preset, with `overrides` replacing
/// whole profiles.
///
/// # Errors
///
/// Returns the first [`RuleError`] found in an override.
pub fn catalog(overrides: &[SpeciesConfig]) -> Result<Catalog, RuleError> {
    let mut catalog: Catalog = Species::ALL
        .into_iter()
        .map(|species| (species, Arc::new(presets::profile(species))))
        .collect();
    for config in overrides {
        let profile = SpeciesProfile::try_from(config.clone())?;
        info!(
            species = %profile.species,
            rules = profile.rules.len(),
            "Species profile overridden"
        );
        catalog.insert(profile.species, Arc::new(profile));
    }
    Ok(catalog)
}

/// RNG, id source, and the buffers filled while a tick is computed.
#[derive(Debug)]
pub(crate) struct Bench {
    pub(crate) rng: SmallRng,
    pub(crate) ids: IdGenerator,
    /// Offspring, corpse pellets and food waiting to join the arena.
    pub(crate) pending: Vec<Cell>,
    pub(crate) events: Vec<LifecycleEvent>,
}

impl Bench {
    /// Borrow the bench as a [`TickContext`].
    pub(crate) fn context(
        &mut self,
        walls: Walls,
        tick: u64,
        food: Arc<SpeciesProfile>,
    ) -> TickContext<'_, SmallRng> {
        TickContext {
            rng: &mut self.rng,
            ids: &mut self.ids,
            walls,
            tick,
            food,
            spawned: &mut self.pending,
            events: &mut self.events,
        }
    }
}

/// The simulated petri dish.
#[derive(Debug)]
pub struct Arena {
    pub(crate) walls: Walls,
    pub(crate) cells: Vec<Cell>,
    pub(crate) bench: Bench,
    pub(crate) catalog: Catalog,
    pub(crate) tick: u64,
    pub(crate) feed_rate: u32,
    pub(crate) tick_rate: f64,
    pub(crate) snapshot: Arc<Snapshot>,
}

impl Arena {
    /// An empty arena.
    ///
    /// With a `seed` the run is reproducible; without one the RNG is seeded
    /// from the operating system.
    pub fn new(
        width: f64,
        height: f64,
        seed: Option<u64>,
        catalog: Catalog,
        feed_rate: u32,
    ) -> Self {
        let rng = seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        Self {
            walls: Walls::new(width, height),
            cells: Vec::new(),
            bench: Bench {
                rng,
                ids: IdGenerator::new(),
                pending: Vec::new(),
                events: Vec::new(),
            },
            catalog,
            tick: 0,
            feed_rate,
            tick_rate: 0.0,
            snapshot: Arc::new(Snapshot::default()),
        }
    }

    /// An arena seeded with the configured populations.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Config`] for an invalid species override, or
    /// [`TickError::Ids`] if ids run out while seeding.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, TickError> {
        config.validate()?;
        let catalog = catalog(&config.species).map_err(crate::config::ConfigError::from)?;
        let mut arena = Self::new(
            config.arena.width,
            config.arena.height,
            config.seed,
            catalog,
            config.feed_rate,
        );
        arena.seed_population(&config.population)?;
        info!(
            width = config.arena.width,
            height = config.arena.height,
            seed = ?config.seed,
            cells = arena.cells.len(),
            "Arena seeded"
        );
        Ok(arena)
    }

    /// Seed the starting populations.
    ///
    /// Grazers are scattered around the left quarter line and predators
    /// around the right one; agar and plants land anywhere inside the walls.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Ids`] if ids run out.
    pub fn seed_population(&mut self, population: &PopulationConfig) -> Result<(), TickError> {
        let (w, h) = (self.walls.width, self.walls.height);
        let left = Vec2::new(w / 4.0, h / 2.0);
        let right = Vec2::new(w * 0.75, h / 2.0);

        for _ in 0..population.grazers {
            let position = self.near(left);
            self.spawn(Species::Grazer, position)?;
        }
        for _ in 0..population.predators {
            let position = self.near(right);
            self.spawn(Species::Predator, position)?;
        }
        for _ in 0..population.agar {
            let position = self.walls.random_point(&mut self.bench.rng);
            let id = self.spawn(Species::Agar, position)?;
            if let Some(pellet) = self.cell_mut(id) {
                pellet.mass = FEED_PELLET_MASS;
            }
        }
        for _ in 0..population.plants {
            let position = self.walls.random_point(&mut self.bench.rng);
            self.spawn(Species::Plant, position)?;
        }
        self.snapshot = Arc::new(self.build_snapshot());
        Ok(())
    }

    fn near(&mut self, centre: Vec2) -> Vec2 {
        let rng = &mut self.bench.rng;
        centre.plus(Vec2::new(
            rng.random_range(-HERD_SPREAD..HERD_SPREAD),
            rng.random_range(-HERD_SPREAD..HERD_SPREAD),
        ))
    }

    /// Add a fresh cell of `species` at `position` straight into the live
    /// set. It acts from the next tick on.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Ids`] if ids run out.
    pub fn spawn(&mut self, species: Species, position: Vec2) -> Result<CellId, TickError> {
        let id = self.bench.ids.next_id()?;
        self.cells.push(Cell::new(id, self.profile(species), position));
        Ok(id)
    }

    /// The profile cells of `species` are created with.
    pub fn profile(&self, species: Species) -> Arc<SpeciesProfile> {
        self.catalog
            .get(&species)
            .cloned()
            .unwrap_or_else(|| Arc::new(presets::profile(species)))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Live cells (plus, mid-tick, cells killed this tick).
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Look a cell up by id.
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    /// Look a cell up by id, mutably.
    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id == id)
    }

    /// Number of cells in the live set.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the arena holds no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Live cells of one species.
    pub fn population(&self, species: Species) -> usize {
        self.cells
            .iter()
            .filter(|c| c.species == species && c.is_alive())
            .count()
    }

    /// Number of ticks completed.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The arena walls.
    pub const fn walls(&self) -> Walls {
        self.walls
    }

    /// Upper bound of food pellets dropped per tick.
    pub const fn feed_rate(&self) -> u32 {
        self.feed_rate
    }

    /// Change the feed rate from the next tick on.
    pub const fn set_feed_rate(&mut self, feed_rate: u32) {
        self.feed_rate = feed_rate;
    }

    /// Record the achieved tick rate; it appears in the next snapshot.
    pub const fn set_tick_rate(&mut self, tick_rate: f64) {
        self.tick_rate = tick_rate;
    }

    /// The most recently built snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Fresh immutable view of the live cells.
    pub(crate) fn build_snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            tick_rate: self.tick_rate,
            cells: self
                .cells
                .iter()
                .filter(|c| c.is_alive())
                .map(Cell::sprite)
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed: Some(seed),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn seeds_configured_populations() {
        let arena = Arena::from_config(&config(1)).unwrap();
        assert_eq!(arena.population(Species::Grazer), 5);
        assert_eq!(arena.population(Species::Predator), 2);
        assert_eq!(arena.population(Species::Agar), 100);
        assert_eq!(arena.population(Species::Plant), 12);
        assert_eq!(arena.snapshot().cells.len(), 119);
    }

    #[test]
    fn ids_start_at_one_and_are_unique() {
        let arena = Arena::from_config(&config(2)).unwrap();
        let ids: Vec<u64> = arena.cells().iter().map(|c| c.id.into_inner()).collect();
        assert_eq!(ids.first(), Some(&1));
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn herds_start_on_their_side() {
        let arena = Arena::from_config(&config(3)).unwrap();
        for cell in arena.cells() {
            match cell.species {
                Species::Grazer => assert!(cell.position.x < 375.0),
                Species::Predator => assert!(cell.position.x > 375.0),
                Species::Agar | Species::Plant => {
                    assert!(cell.position.x >= 15.0 && cell.position.x <= 735.0);
                }
            }
        }
    }

    #[test]
    fn overrides_replace_presets() {
        let yaml = r"
species:
  - species: Plant
    mass: 10
    energy: 1
    color: { r: 1, g: 2, b: 3 }
    rules:
      - action: sleep
";
        let config = SimulationConfig::parse(yaml).unwrap();
        let catalog = catalog(&config.species).unwrap();
        let plant = catalog.get(&Species::Plant).unwrap();
        assert_eq!(plant.rules.len(), 1);
        assert!((plant.mass - 10.0).abs() < f64::EPSILON);
        assert_eq!(catalog.get(&Species::Grazer).unwrap().rules.len(), 8);
    }

    #[test]
    fn same_seed_same_layout() {
        let a = Arena::from_config(&config(9)).unwrap();
        let b = Arena::from_config(&config(9)).unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
    }
}
