//! The fusion/association engine.
//!
//! [`FusionEngine`] owns all mutable state: both per-sensor object tables,
//! the fused output map, and the round-robin allocation cursor. The two
//! update entry points are the complete boundary of the core; everything
//! else (message parsing, forwarding, startup) belongs to the caller.
//!
//! # Update flow
//!
//! Metadata updates write lifecycle fields into a sensor table slot and
//! stop there. Geometry updates run the full chain: polar fields are
//! written, transformed into the map frame, then associated with a fused
//! slot and merged into it. Association prefers the slot the object was
//! already mapped to; failing that it searches all valid slots for the
//! nearest one, and failing that it takes the next slot in rotation,
//! evicting whatever lived there.
//!
//! # Concurrency
//!
//! The engine is a plain synchronous state machine: no locking, no I/O, no
//! blocking. Association reads and writes linked fields on both tables in
//! several steps, so callers with concurrent producers must serialize whole
//! update calls behind a single mutual-exclusion boundary.

use crate::config::FusionConfig;
use crate::errors::ConfigError;
use crate::fusion::scoring::{match_score, nearest_valid_slot};
use crate::geometry::polar_to_cartesian;
use crate::reporter::{Discard, FusionReporter, NoOpReporter};
use crate::stats::FusionStats;
use crate::types::{
    FusedObject, ObjectProperties, PolarReading, Sensor, SensorObject, MAP_OBJECTS, SENSOR_OBJECTS,
};

/// Two-sensor object fusion engine.
///
/// Holds the per-sensor object tables (capacity [`SENSOR_OBJECTS`] each),
/// the fused object map (capacity [`MAP_OBJECTS`]) and the allocation
/// cursor. Generic over a [`FusionReporter`] for observability; the default
/// [`NoOpReporter`] costs nothing.
///
/// # Example
///
/// ```
/// use polarfuse::{FusionConfig, FusionEngine, ObjectProperties, PolarReading};
///
/// let config = FusionConfig::default().with_separation(2.0);
/// let mut engine = FusionEngine::new(config).unwrap();
///
/// engine.update_properties('l', 0, ObjectProperties { valid: 1, alive: 1, ..Default::default() });
/// let slot = engine.update_geometry('l', 0, PolarReading {
///     angle_deg: 90.0,
///     dist: 5.0,
///     width: 0.4,
///     depth: 0.2,
/// });
///
/// let fused = engine.fused(slot.unwrap()).unwrap();
/// assert!(fused.is_valid());
/// ```
#[derive(Debug, Clone)]
pub struct FusionEngine<R: FusionReporter = NoOpReporter> {
    config: FusionConfig,
    left: [SensorObject; SENSOR_OBJECTS],
    right: [SensorObject; SENSOR_OBJECTS],
    fused: [FusedObject; MAP_OBJECTS],
    /// Next slot handed out by the allocator, advancing on every
    /// allocation and wrapping at the end of the map
    cursor: usize,
    stats: FusionStats,
    reporter: R,
}

impl FusionEngine<NoOpReporter> {
    /// Create an engine with no observability.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the configuration fails validation.
    pub fn new(config: FusionConfig) -> Result<Self, ConfigError> {
        Self::with_reporter(config, NoOpReporter)
    }
}

impl<R: FusionReporter> FusionEngine<R> {
    /// Create an engine that reports events to `reporter`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the configuration fails validation.
    pub fn with_reporter(config: FusionConfig, reporter: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            left: std::array::from_fn(|_| SensorObject::default()),
            right: std::array::from_fn(|_| SensorObject::default()),
            fused: std::array::from_fn(|_| FusedObject::default()),
            cursor: 0,
            stats: FusionStats::default(),
            reporter,
        })
    }

    // ========================================================================
    // Update entry points
    // ========================================================================

    /// Apply a lifecycle metadata update for one sensor object.
    ///
    /// Writes the reported fields into the sensor table without triggering
    /// fusion. Updates with an unrecognized tag or an id at or above
    /// [`SENSOR_OBJECTS`] are dropped, counted and reported.
    pub fn update_properties(&mut self, tag: char, id: usize, props: ObjectProperties) {
        let Some(sensor) = self.admit(tag, id) else {
            return;
        };
        let object = &mut self.table_mut(sensor)[id];
        object.source = sensor.mask();
        object.birth = props.birth;
        object.lifetime = props.lifetime;
        object.alive = props.alive;
        object.valid = props.valid;
        object.zombie = props.zombie;
    }

    /// Apply a polar geometry update for one sensor object.
    ///
    /// Converts the reported bearing to radians, transforms the detection
    /// into the map frame using the reporting sensor's calibration, then
    /// associates and merges it into the fused map. This is the only
    /// trigger for fusion.
    ///
    /// Returns the index of the affected fused slot, whose smoothed record
    /// ([`fused`](Self::fused)) is ready for forwarding downstream; `None`
    /// when the update was dropped at the boundary.
    pub fn update_geometry(&mut self, tag: char, id: usize, reading: PolarReading) -> Option<usize> {
        let sensor = self.admit(tag, id)?;

        let calibration = self.config.calibration(sensor);
        let angle = reading.angle_deg.to_radians();
        let position = polar_to_cartesian(angle, reading.dist, &calibration);

        let object = &mut self.table_mut(sensor)[id];
        object.source = sensor.mask();
        object.angle = angle;
        object.dist = reading.dist;
        object.width = reading.width;
        object.depth = reading.depth;
        object.position = position;

        self.reporter.on_transform(sensor, id, position);

        Some(self.associate(sensor, id))
    }

    /// Validate the boundary arguments, counting and reporting drops.
    fn admit(&mut self, tag: char, id: usize) -> Option<Sensor> {
        let Some(sensor) = Sensor::from_tag(tag) else {
            self.stats.unknown_sensor += 1;
            self.reporter.on_discard(Discard::UnknownSensor { tag });
            return None;
        };
        if id >= SENSOR_OBJECTS {
            self.stats.id_out_of_range += 1;
            self.reporter.on_discard(Discard::IdOutOfRange { sensor, id });
            return None;
        }
        Some(sensor)
    }

    // ========================================================================
    // Association
    // ========================================================================

    /// Find or create the fused slot for an updated sensor object, then
    /// merge the object into it. Returns the slot index.
    fn associate(&mut self, sensor: Sensor, id: usize) -> usize {
        let position = self.table(sensor)[id].position;
        let worst = self.config.worst_match;

        // An existing mapping is re-scored against its destination only.
        if let Some(slot) = self.table(sensor)[id].dest {
            let score = match_score(&self.fused[slot].position, &position);
            if score < worst {
                self.stats.reconfirmed += 1;
                self.reporter.on_confirmed(sensor, id, slot, score);
                self.merge(slot, sensor, id, score);
                return slot;
            }
            // Failed reconfirmation severs the mapping and falls back to a
            // full search
            self.stats.rejected += 1;
            self.reporter.on_rejected(sensor, id, slot, score);
            self.sever(slot, sensor);
        }

        let nearest = nearest_valid_slot(&self.fused, &position);
        self.reporter.on_search(sensor, id, nearest);

        let (slot, score) = match nearest {
            Some((slot, score)) if score < worst => {
                self.stats.matched += 1;
                (slot, score)
            }
            // Nothing near enough: take the next slot in rotation. The
            // erased slot takes the incoming attributes verbatim, so the
            // association score against it is zero.
            _ => (self.allocate(), 0.0),
        };

        self.merge(slot, sensor, id, score);
        slot
    }

    /// Hand out the slot under the cursor, advance the rotation and erase
    /// the slot so it is reusable evidence-free. Eviction is blind to the
    /// occupant's liveness.
    fn allocate(&mut self) -> usize {
        let slot = self.cursor;
        self.cursor = (self.cursor + 1) % MAP_OBJECTS;

        if !self.fused[slot].sources.is_empty() {
            self.stats.evicted += 1;
            self.reporter.on_evicted(slot);
        }
        self.erase(slot);

        self.stats.allocated += 1;
        self.reporter.on_allocated(slot);
        slot
    }

    /// Reset a fused slot to its unused state, severing both sensor
    /// back-references so their owners observe the eviction.
    fn erase(&mut self, slot: usize) {
        for sensor in [Sensor::Left, Sensor::Right] {
            if let Some(id) = self.fused[slot].source_link(sensor) {
                self.table_mut(sensor)[id].dest = None;
            }
        }
        self.fused[slot] = FusedObject::default();
    }

    /// Remove one sensor's contribution link from a fused slot, clearing
    /// the object's forward reference and the slot's source bit together.
    fn sever(&mut self, slot: usize, sensor: Sensor) {
        if let Some(id) = self.fused[slot].source_link(sensor) {
            self.table_mut(sensor)[id].dest = None;
            self.fused[slot].set_source_link(sensor, None);
            self.fused[slot].sources.remove(sensor.mask());
        }
    }

    /// Link a sensor object to its fused slot and fold its attributes in.
    ///
    /// The first contribution to an unused slot assigns attributes
    /// directly; later contributions blend with the configured retention
    /// factor. Flags merge by OR, birth and lifetime are last-write-wins.
    fn merge(&mut self, slot: usize, sensor: Sensor, id: usize, score: f64) {
        // A slot can hold one contribution per sensor; taking the link over
        // severs the previous owner's mapping
        if let Some(previous) = self.fused[slot].source_link(sensor) {
            if previous != id {
                self.table_mut(sensor)[previous].dest = None;
            }
        }

        {
            let object = &mut self.table_mut(sensor)[id];
            object.dest = Some(slot);
            object.match_score = score;
        }
        let incoming = self.table(sensor)[id];

        let alpha = self.config.smoothing;
        let fused = &mut self.fused[slot];
        fused.set_source_link(sensor, Some(id));
        if fused.sources.is_empty() {
            fused.position = incoming.position;
            fused.width = incoming.width;
            fused.depth = incoming.depth;
        } else {
            fused.position = fused.position * alpha + incoming.position * (1.0 - alpha);
            fused.width = fused.width * alpha + incoming.width * (1.0 - alpha);
            fused.depth = fused.depth * alpha + incoming.depth * (1.0 - alpha);
        }
        fused.sources |= incoming.source;
        fused.birth = incoming.birth;
        fused.lifetime = incoming.lifetime;
        fused.alive |= incoming.alive;
        fused.valid |= incoming.valid;

        let merged = self.fused[slot];
        self.reporter.on_merged(sensor, id, slot, &merged);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The configuration this engine was built with.
    #[inline]
    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// One fused map entry, or `None` for an out-of-range slot index.
    #[inline]
    pub fn fused(&self, slot: usize) -> Option<&FusedObject> {
        self.fused.get(slot)
    }

    /// The whole fused map, including unused slots.
    #[inline]
    pub fn fused_objects(&self) -> &[FusedObject] {
        &self.fused
    }

    /// Iterator over the populated, valid fused slots with their indices.
    pub fn valid_fused(&self) -> impl Iterator<Item = (usize, &FusedObject)> {
        self.fused
            .iter()
            .enumerate()
            .filter(|(_, object)| object.is_valid())
    }

    /// One sensor table record, or `None` for an out-of-range id.
    #[inline]
    pub fn sensor_object(&self, sensor: Sensor, id: usize) -> Option<&SensorObject> {
        self.table(sensor).get(id)
    }

    /// Counters accumulated since construction or the last reset.
    #[inline]
    pub fn stats(&self) -> &FusionStats {
        &self.stats
    }

    /// The reporter this engine was built with.
    #[inline]
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Clear all tables, the allocation cursor and the counters, keeping
    /// the configuration and reporter.
    pub fn reset(&mut self) {
        self.left = std::array::from_fn(|_| SensorObject::default());
        self.right = std::array::from_fn(|_| SensorObject::default());
        self.fused = std::array::from_fn(|_| FusedObject::default());
        self.cursor = 0;
        self.stats = FusionStats::default();
    }

    #[inline]
    fn table(&self, sensor: Sensor) -> &[SensorObject; SENSOR_OBJECTS] {
        match sensor {
            Sensor::Left => &self.left,
            Sensor::Right => &self.right,
        }
    }

    #[inline]
    fn table_mut(&mut self, sensor: Sensor) -> &mut [SensorObject; SENSOR_OBJECTS] {
        match sensor {
            Sensor::Left => &mut self.left,
            Sensor::Right => &mut self.right,
        }
    }
}
