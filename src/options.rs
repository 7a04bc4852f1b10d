/// Default tolerance for vertex coincidence, point-on-segment and verticality tests.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Default distance between the outermost vertices and the bounding box.
pub const DEFAULT_MARGIN: f64 = 1.0;

/// Order in which the segments are inserted into the trapezoidal map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertionOrder {
    /// Insert the segments in the order they are discovered in the input.
    ///
    /// Deterministic, but the expected *O*(log(*n*)) query depth is lost: a bad input order can
    /// produce a DAG of linear depth.
    #[default]
    AsGiven,
    /// Shuffle the segments with a seeded random number generator before inserting them, which is
    /// what the randomized incremental algorithm assumes.
    Shuffled { seed: u64 },
}

/// Options controlling the construction of a [`TrapMap`](crate::TrapMap).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    pub(crate) epsilon: f64,
    pub(crate) margin: f64,
    pub(crate) order: InsertionOrder,
    pub(crate) check_each_insertion: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            margin: DEFAULT_MARGIN,
            order: InsertionOrder::default(),
            check_each_insertion: false,
        }
    }
}

impl Options {
    /// Sets the tolerance used by queries, for vertex, segment and box boundary tests.
    ///
    /// Non-positive or NaN values are ignored.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        if epsilon > 0. {
            self.epsilon = epsilon;
        }
        self
    }

    /// Sets the margin between the input and the bounding box.
    ///
    /// The margin must be strictly positive so that every input vertex lies strictly inside the
    /// box; other values are ignored.
    pub fn with_margin(mut self, margin: f64) -> Self {
        if margin > 0. {
            self.margin = margin;
        }
        self
    }

    pub fn with_order(mut self, order: InsertionOrder) -> Self {
        self.order = order;
        self
    }

    /// Runs [`TrapMap::check`](crate::TrapMap::check) after every insertion.
    ///
    /// This is slow (quadratic overall) and meant for debugging.
    pub fn check_each_insertion(mut self, check: bool) -> Self {
        self.check_each_insertion = check;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn order(&self) -> InsertionOrder {
        self.order
    }
}
