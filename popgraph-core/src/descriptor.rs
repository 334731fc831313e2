//! Topology descriptor: the requested family, size, connectivity and
//! family-specific parameters of a population structure.
//!
//! Descriptors are parsed from a compact textual grammar
//! `[f]<code><params>[f]`. Parsing never fails: unrecognised input yields a
//! descriptor of the [`Family::Invalid`] family so callers can report and
//! substitute it during the feasibility check.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Graph families understood by the topology generator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Family {
    /// Unstructured population; every individual interacts with every other.
    WellMixed,
    /// Complete graph with explicit links.
    Complete,
    /// Nested demes: complete or square leaf groups coupled across levels.
    Hierarchy,
    /// One-dimensional lattice with configurable left/right reach.
    Linear,
    /// Square lattice with the four von Neumann neighbours.
    VonNeumann,
    /// Square lattice with the eight Moore neighbours.
    Moore,
    /// Square lattice with an arbitrary admissible neighbourhood.
    Square,
    /// Cubic lattice with an arbitrary admissible neighbourhood.
    Cubic,
    /// Square array with hexagonal (six neighbour) coordination.
    Honeycomb,
    /// Square array with triangular (three neighbour) coordination.
    Triangular,
    /// One hub linked to every leaf.
    Star,
    /// Star whose leaves additionally form a cycle.
    Wheel,
    /// Directed superstar amplifier with petals of reservoirs and chains.
    Superstar,
    /// Three-tier strong amplifier of selection.
    StrongAmplifier,
    /// Three-tier strong suppressor of selection.
    StrongSuppressor,
    /// Frucht graph (12 nodes, cubic, no non-trivial symmetry).
    Frucht,
    /// Tietze graph (12 nodes, cubic).
    Tietze,
    /// Franklin graph (12 nodes, cubic).
    Franklin,
    /// Heawood graph (14 nodes, cubic).
    Heawood,
    /// Icosahedron graph (12 nodes, degree five).
    Icosahedron,
    /// Dodecahedron graph (20 nodes, cubic).
    Dodecahedron,
    /// Desargues graph (20 nodes, cubic).
    Desargues,
    /// Connected undirected random graph.
    RandomGraph,
    /// Strongly connected directed random graph.
    RandomDirected,
    /// Connected random regular graph.
    RandomRegular,
    /// Scale-free graph realised from a power-law degree sequence.
    ScaleFree,
    /// Barabási–Albert preferential attachment.
    ScaleFreeBa,
    /// Klemm–Eguíluz growth with a bounded active pool.
    ScaleFreeKlemm,
    /// Sentinel for descriptors that failed to parse.
    Invalid,
}

impl Family {
    /// Returns the single-character code used by the descriptor grammar.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::WellMixed => "M",
            Self::Complete => "c",
            Self::Hierarchy => "H",
            Self::Linear => "l",
            Self::VonNeumann => "n",
            Self::Moore => "m",
            Self::Square => "N",
            Self::Cubic => "C",
            Self::Honeycomb => "h",
            Self::Triangular => "t",
            Self::Star => "s",
            Self::Wheel => "w",
            Self::Superstar => "+",
            Self::StrongAmplifier => "A",
            Self::StrongSuppressor => "S",
            Self::Frucht => "1",
            Self::Tietze => "2",
            Self::Franklin => "3",
            Self::Heawood => "4",
            Self::Icosahedron => "5",
            Self::Dodecahedron => "6",
            Self::Desargues => "7",
            Self::RandomGraph => "r",
            Self::RandomDirected => "R",
            Self::RandomRegular => "g",
            Self::ScaleFree => "p",
            Self::ScaleFreeBa => "B",
            Self::ScaleFreeKlemm => "k",
            Self::Invalid => "?",
        }
    }

    /// Returns `true` for regular lattices whose node positions are implied by
    /// their index.
    #[must_use]
    pub const fn is_lattice(self) -> bool {
        matches!(
            self,
            Self::Linear
                | Self::VonNeumann
                | Self::Moore
                | Self::Square
                | Self::Cubic
                | Self::Honeycomb
                | Self::Triangular
        )
    }

    /// Returns `true` when generation draws from the random source, so the
    /// resulting graph cannot be rebuilt from its descriptor alone.
    #[must_use]
    pub const fn is_random(self) -> bool {
        matches!(
            self,
            Self::RandomGraph
                | Self::RandomDirected
                | Self::RandomRegular
                | Self::ScaleFree
                | Self::ScaleFreeBa
                | Self::ScaleFreeKlemm
        )
    }

    /// Returns `true` when the family admits degree-preserving rewiring and
    /// random link additions.
    #[must_use]
    pub const fn allows_rewiring(self) -> bool {
        !matches!(self, Self::WellMixed | Self::Complete | Self::Invalid)
    }

    /// Returns `true` for the hand-coded symmetric graphs with a fixed size.
    #[must_use]
    pub const fn is_hand_coded(self) -> bool {
        matches!(
            self,
            Self::Frucht
                | Self::Tietze
                | Self::Franklin
                | Self::Heawood
                | Self::Icosahedron
                | Self::Dodecahedron
                | Self::Desargues
        )
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Boundary conditions applied to lattices.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Boundary {
    /// Lattice edges wrap around.
    #[default]
    Periodic,
    /// Lattice edges are reflecting: boundary nodes have fewer neighbours.
    Fixed,
}

/// Structure of the leaf groups of a hierarchical geometry.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum HierarchyLeaf {
    /// Leaf demes are complete graphs.
    #[default]
    Complete,
    /// Leaf demes are von Neumann square lattices.
    Square,
}

/// Family-specific scalars carried alongside the generic descriptor fields.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FamilyParams {
    pub(crate) hierarchy: Vec<usize>,
    pub(crate) hierarchy_leaf: HierarchyLeaf,
    pub(crate) hierarchy_weight: f64,
    pub(crate) exponent: f64,
    pub(crate) petals: usize,
    pub(crate) amplification: usize,
    pub(crate) klemm_mixing: f64,
    pub(crate) linear_left: usize,
    pub(crate) linear_right: usize,
}

impl Default for FamilyParams {
    fn default() -> Self {
        Self {
            hierarchy: Vec::new(),
            hierarchy_leaf: HierarchyLeaf::Complete,
            hierarchy_weight: 0.0,
            exponent: DEFAULT_EXPONENT,
            petals: 1,
            amplification: DEFAULT_AMPLIFICATION,
            klemm_mixing: DEFAULT_KLEMM_MIXING,
            linear_left: 1,
            linear_right: 1,
        }
    }
}

const DEFAULT_EXPONENT: f64 = 2.5;
const DEFAULT_AMPLIFICATION: usize = 3;
const DEFAULT_KLEMM_MIXING: f64 = 0.1;
const DEFAULT_RANDOM_CONNECTIVITY: f64 = 4.0;

/// Requested population structure.
///
/// # Examples
/// ```
/// use popgraph_core::{Boundary, Family, GeometryDescriptor};
///
/// let descriptor = GeometryDescriptor::parse("N8f").with_size(100);
/// assert_eq!(descriptor.family(), Family::Square);
/// assert_eq!(descriptor.boundary(), Boundary::Fixed);
/// assert_eq!(descriptor.connectivity(), 8.0);
/// assert_eq!(descriptor.to_string(), "N8f");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryDescriptor {
    pub(crate) family: Family,
    pub(crate) size: usize,
    pub(crate) connectivity: f64,
    pub(crate) directed: bool,
    pub(crate) regular: bool,
    pub(crate) boundary: Boundary,
    pub(crate) rewire: f64,
    pub(crate) add: f64,
    pub(crate) params: FamilyParams,
}

impl GeometryDescriptor {
    /// Creates a descriptor for `family` with default parameters.
    #[must_use]
    pub fn new(family: Family) -> Self {
        let (connectivity, directed) = match family {
            Family::Square | Family::VonNeumann => (4.0, false),
            Family::Moore => (8.0, false),
            Family::Cubic => (6.0, false),
            Family::Honeycomb => (6.0, false),
            Family::Triangular => (3.0, false),
            Family::Linear => (2.0, false),
            Family::Superstar => (0.0, true),
            Family::RandomDirected => (DEFAULT_RANDOM_CONNECTIVITY, true),
            Family::RandomGraph
            | Family::RandomRegular
            | Family::ScaleFree
            | Family::ScaleFreeBa
            | Family::ScaleFreeKlemm => (DEFAULT_RANDOM_CONNECTIVITY, false),
            _ => (0.0, false),
        };
        Self {
            family,
            size: 0,
            connectivity,
            directed,
            regular: false,
            boundary: Boundary::Periodic,
            rewire: 0.0,
            add: 0.0,
            params: FamilyParams::default(),
        }
    }

    /// Parses a descriptor string. Unrecognised input yields
    /// [`Family::Invalid`].
    ///
    /// # Examples
    /// ```
    /// use popgraph_core::{Family, GeometryDescriptor};
    ///
    /// assert_eq!(GeometryDescriptor::parse("g3").family(), Family::RandomRegular);
    /// assert_eq!(GeometryDescriptor::parse("Fn").family(), Family::VonNeumann);
    /// assert_eq!(GeometryDescriptor::parse("x!").family(), Family::Invalid);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if let Some(descriptor) = parse_exact(trimmed) {
            return descriptor;
        }
        let stripped = trimmed
            .strip_prefix(['f', 'F'])
            .or_else(|| trimmed.strip_suffix(['f', 'F']));
        if let Some(mut descriptor) = stripped.and_then(parse_exact) {
            descriptor.boundary = Boundary::Fixed;
            return descriptor;
        }
        Self::new(Family::Invalid)
    }

    /// Sets the requested population size.
    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Sets the requested (average) connectivity.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: f64) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Sets the lattice boundary mode.
    #[must_use]
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Sets the probability used by degree-preserving rewiring.
    #[must_use]
    pub fn with_rewire(mut self, probability: f64) -> Self {
        self.rewire = probability;
        self
    }

    /// Sets the probability used when adding random links.
    #[must_use]
    pub fn with_add(mut self, probability: f64) -> Self {
        self.add = probability;
        self
    }

    /// Sets the hierarchy level sizes (units per level, top first).
    #[must_use]
    pub fn with_hierarchy(mut self, levels: Vec<usize>, leaf: HierarchyLeaf, weight: f64) -> Self {
        self.params.hierarchy = levels;
        self.params.hierarchy_leaf = leaf;
        self.params.hierarchy_weight = weight;
        self
    }

    /// Sets the number of petals and the amplification of a superstar.
    #[must_use]
    pub fn with_petals(mut self, petals: usize, amplification: usize) -> Self {
        self.params.petals = petals;
        self.params.amplification = amplification;
        self
    }

    /// Sets the power-law exponent of scale-free degree sequences.
    #[must_use]
    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.params.exponent = exponent;
        self
    }

    /// Sets the Klemm–Eguíluz mixing probability.
    #[must_use]
    pub fn with_klemm_mixing(mut self, mixing: f64) -> Self {
        self.params.klemm_mixing = mixing;
        self
    }

    /// Requested graph family.
    #[must_use]
    pub fn family(&self) -> Family {
        self.family
    }

    /// Population size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Target connectivity; fractional for heterogeneous families.
    #[must_use]
    pub fn connectivity(&self) -> f64 {
        self.connectivity
    }

    /// Whether links are one-way.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Whether every node is expected to have the declared connectivity.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.regular
    }

    /// Lattice boundary mode.
    #[must_use]
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Rewiring probability.
    #[must_use]
    pub fn rewire(&self) -> f64 {
        self.rewire
    }

    /// Link-addition probability.
    #[must_use]
    pub fn add(&self) -> f64 {
        self.add
    }

    /// Units per hierarchy level, top first; the leaf group size is implied by
    /// the population size.
    #[must_use]
    pub fn hierarchy_levels(&self) -> &[usize] {
        &self.params.hierarchy
    }

    /// Leaf group structure of a hierarchy.
    #[must_use]
    pub fn hierarchy_leaf(&self) -> HierarchyLeaf {
        self.params.hierarchy_leaf
    }

    /// Coupling weight between hierarchy levels.
    #[must_use]
    pub fn hierarchy_weight(&self) -> f64 {
        self.params.hierarchy_weight
    }

    /// Power-law exponent of scale-free degree sequences.
    #[must_use]
    pub fn exponent(&self) -> f64 {
        self.params.exponent
    }

    /// Number of superstar petals.
    #[must_use]
    pub fn petals(&self) -> usize {
        self.params.petals
    }

    /// Superstar amplification (path length from reservoir to hub).
    #[must_use]
    pub fn amplification(&self) -> usize {
        self.params.amplification
    }

    /// Klemm–Eguíluz mixing probability.
    #[must_use]
    pub fn klemm_mixing(&self) -> f64 {
        self.params.klemm_mixing
    }

    /// Left and right reach of a linear lattice.
    #[must_use]
    pub fn linear_span(&self) -> (usize, usize) {
        (self.params.linear_left, self.params.linear_right)
    }
}

impl Default for GeometryDescriptor {
    fn default() -> Self {
        Self::new(Family::WellMixed)
    }
}

impl FromStr for GeometryDescriptor {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for GeometryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = &self.params;
        f.write_str(self.family.code())?;
        match self.family {
            Family::Hierarchy => {
                let leaf = match params.hierarchy_leaf {
                    HierarchyLeaf::Complete => 'c',
                    HierarchyLeaf::Square => 'n',
                };
                write!(f, "{leaf}")?;
                let levels: Vec<String> = params.hierarchy.iter().map(ToString::to_string).collect();
                write!(f, "{}w{}", levels.join(","), params.hierarchy_weight)?;
            }
            Family::Linear if params.linear_left == params.linear_right => {
                write!(f, "{}", params.linear_left + params.linear_right)?;
            }
            Family::Linear => write!(f, "{},{}", params.linear_left, params.linear_right)?,
            Family::Square
            | Family::Cubic
            | Family::RandomGraph
            | Family::RandomDirected
            | Family::RandomRegular
            | Family::ScaleFreeBa => write!(f, "{}", self.connectivity)?,
            Family::ScaleFree => write!(f, "{},{}", self.connectivity, params.exponent)?,
            Family::ScaleFreeKlemm => write!(f, "{},{}", self.connectivity, params.klemm_mixing)?,
            Family::Superstar => write!(f, "{},{}", params.petals, params.amplification)?,
            _ => {}
        }
        if self.boundary == Boundary::Fixed {
            f.write_str("f")?;
        }
        Ok(())
    }
}

fn parse_exact(text: &str) -> Option<GeometryDescriptor> {
    let mut chars = text.chars();
    let code = chars.next()?;
    let rest = chars.as_str();
    match code {
        'M' => bare(rest, Family::WellMixed),
        'c' => bare(rest, Family::Complete),
        'n' => bare(rest, Family::VonNeumann),
        'm' => bare(rest, Family::Moore),
        'h' => bare(rest, Family::Honeycomb),
        't' => bare(rest, Family::Triangular),
        's' => bare(rest, Family::Star),
        'w' => bare(rest, Family::Wheel),
        'A' => bare(rest, Family::StrongAmplifier),
        'S' => bare(rest, Family::StrongSuppressor),
        '1' => bare(rest, Family::Frucht),
        '2' => bare(rest, Family::Tietze),
        '3' => bare(rest, Family::Franklin),
        '4' => bare(rest, Family::Heawood),
        '5' => bare(rest, Family::Icosahedron),
        '6' => bare(rest, Family::Dodecahedron),
        '7' => bare(rest, Family::Desargues),
        'N' => with_connectivity(rest, Family::Square),
        'C' => with_connectivity(rest, Family::Cubic),
        'r' => with_connectivity(rest, Family::RandomGraph),
        'R' => with_connectivity(rest, Family::RandomDirected),
        'g' => with_connectivity(rest, Family::RandomRegular),
        'B' => with_connectivity(rest, Family::ScaleFreeBa),
        'p' => parse_scale_free(rest),
        'k' => parse_klemm(rest),
        'l' => parse_linear(rest),
        '+' => parse_superstar(rest),
        'H' => parse_hierarchy(rest),
        _ => None,
    }
}

fn bare(rest: &str, family: Family) -> Option<GeometryDescriptor> {
    rest.is_empty().then(|| GeometryDescriptor::new(family))
}

fn parse_numbers(text: &str) -> Option<Vec<f64>> {
    if text.is_empty() {
        return Some(Vec::new());
    }
    text.split(',')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

fn parse_count(value: f64) -> Option<usize> {
    (value >= 0.0 && value.fract() == 0.0).then_some(value as usize)
}

fn with_connectivity(rest: &str, family: Family) -> Option<GeometryDescriptor> {
    let numbers = parse_numbers(rest)?;
    let mut descriptor = GeometryDescriptor::new(family);
    match numbers.as_slice() {
        [] => {}
        [k] if *k > 0.0 => descriptor.connectivity = *k,
        _ => return None,
    }
    Some(descriptor)
}

fn parse_scale_free(rest: &str) -> Option<GeometryDescriptor> {
    let numbers = parse_numbers(rest)?;
    let mut descriptor = GeometryDescriptor::new(Family::ScaleFree);
    match numbers.as_slice() {
        [] => {}
        [k] if *k > 0.0 => descriptor.connectivity = *k,
        [k, exponent] if *k > 0.0 => {
            descriptor.connectivity = *k;
            descriptor.params.exponent = exponent.abs();
        }
        _ => return None,
    }
    Some(descriptor)
}

fn parse_klemm(rest: &str) -> Option<GeometryDescriptor> {
    let numbers = parse_numbers(rest)?;
    let mut descriptor = GeometryDescriptor::new(Family::ScaleFreeKlemm);
    match numbers.as_slice() {
        [] => {}
        [k] if *k > 0.0 => descriptor.connectivity = *k,
        [k, mixing] if *k > 0.0 && (0.0..=1.0).contains(mixing) => {
            descriptor.connectivity = *k;
            descriptor.params.klemm_mixing = *mixing;
        }
        _ => return None,
    }
    Some(descriptor)
}

fn parse_linear(rest: &str) -> Option<GeometryDescriptor> {
    let numbers = parse_numbers(rest)?;
    let mut descriptor = GeometryDescriptor::new(Family::Linear);
    match numbers.as_slice() {
        [] => {}
        [k] => {
            let k = parse_count(*k)?;
            // symmetric reach splits k evenly; odd degrees need `l<left>,<right>`
            if k % 2 != 0 {
                return None;
            }
            let reach = k / 2;
            descriptor.params.linear_left = reach;
            descriptor.params.linear_right = reach;
            descriptor.connectivity = k as f64;
        }
        [left, right] => {
            let left = parse_count(*left)?;
            let right = parse_count(*right)?;
            descriptor.params.linear_left = left;
            descriptor.params.linear_right = right;
            descriptor.connectivity = (left + right) as f64;
            descriptor.directed = left != right;
        }
        _ => return None,
    }
    Some(descriptor)
}

fn parse_superstar(rest: &str) -> Option<GeometryDescriptor> {
    let numbers = parse_numbers(rest)?;
    let mut descriptor = GeometryDescriptor::new(Family::Superstar);
    match numbers.as_slice() {
        [petals] => descriptor.params.petals = parse_count(*petals)?,
        [petals, amplification] => {
            descriptor.params.petals = parse_count(*petals)?;
            descriptor.params.amplification = parse_count(*amplification)?;
        }
        _ => return None,
    }
    Some(descriptor)
}

fn parse_hierarchy(rest: &str) -> Option<GeometryDescriptor> {
    let (leaf, body) = match rest.chars().next() {
        Some('c') => (HierarchyLeaf::Complete, rest.get(1..)?),
        Some('n') => (HierarchyLeaf::Square, rest.get(1..)?),
        _ => (HierarchyLeaf::Complete, rest),
    };
    let (levels, weight) = match body.split_once('w') {
        Some((levels, weight)) => {
            let weight = weight.trim().parse::<f64>().ok()?;
            if !(0.0..=1.0).contains(&weight) {
                return None;
            }
            (levels, weight)
        }
        None => (body, 0.0),
    };
    let levels = parse_numbers(levels)?
        .into_iter()
        .map(parse_count)
        .collect::<Option<Vec<_>>>()?;
    if levels.is_empty() {
        return None;
    }
    Some(GeometryDescriptor::new(Family::Hierarchy).with_hierarchy(levels, leaf, weight))
}
